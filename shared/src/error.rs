use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or validate a settings bundle.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Rejects NaN, infinities and negative values.
pub fn ensure_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::invalid(field, format!("{value} is not finite")));
    }
    if value < 0.0 {
        return Err(ConfigError::invalid(field, format!("{value} is negative")));
    }
    Ok(())
}

/// Rejects anything that is not a finite, strictly positive number.
pub fn ensure_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    ensure_non_negative(field, value)?;
    if value == 0.0 {
        return Err(ConfigError::invalid(field, "must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validators_reject_bad_numbers() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", -1.0).is_err());
        assert!(ensure_non_negative("x", f32::NAN).is_err());
        assert!(ensure_positive("x", 0.0).is_err());
        assert!(ensure_positive("x", 0.5).is_ok());

        let err = ensure_positive("jump_duration", f32::INFINITY).unwrap_err();
        assert!(err.to_string().contains("jump_duration"));
    }
}
