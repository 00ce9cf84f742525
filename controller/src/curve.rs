use serde::{Deserialize, Serialize};

use shared::math::inverse_lerp;

/// One-dimensional response curve, evaluated with clamping outside its keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Curve {
    /// Hermite blend with zero tangents at both ends (smoothstep).
    EaseInOut {
        start_time: f32,
        start_value: f32,
        end_time: f32,
        end_value: f32,
    },
    /// Piecewise-linear `[time, value]` keys, sorted by time.
    Linear { keys: Vec<[f32; 2]> },
}

impl Curve {
    pub const fn ease_in_out(start_time: f32, start_value: f32, end_time: f32, end_value: f32) -> Self {
        Self::EaseInOut {
            start_time,
            start_value,
            end_time,
            end_value,
        }
    }

    /// Falls from 1 at t = 0 to 0 at t = 1.
    pub const fn falloff() -> Self {
        Self::ease_in_out(0.0, 1.0, 1.0, 0.0)
    }

    pub fn evaluate(&self, t: f32) -> f32 {
        match self {
            Self::EaseInOut {
                start_time,
                start_value,
                end_time,
                end_value,
            } => {
                let s = inverse_lerp(*start_time, *end_time, t);
                let h = s * s * (3.0 - 2.0 * s);
                start_value + (end_value - start_value) * h
            }
            Self::Linear { keys } => {
                let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
                    return 0.0;
                };
                if t <= first[0] {
                    return first[1];
                }
                if t >= last[0] {
                    return last[1];
                }
                keys.windows(2)
                    .find(|w| t >= w[0][0] && t <= w[1][0])
                    .map(|w| {
                        let s = inverse_lerp(w[0][0], w[1][0], t);
                        w[0][1] + (w[1][1] - w[0][1]) * s
                    })
                    .unwrap_or(last[1])
            }
        }
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        match self {
            Self::EaseInOut {
                start_time,
                start_value,
                end_time,
                end_value,
            } => [start_time, start_value, end_time, end_value]
                .iter()
                .all(|v| v.is_finite()),
            Self::Linear { keys } => {
                keys.iter().flatten().all(|v| v.is_finite())
                    && keys.windows(2).all(|w| w[0][0] <= w[1][0])
            }
        }
    }
}
