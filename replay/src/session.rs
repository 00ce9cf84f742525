use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{BodyHandle, PhysicsBackend, Quat, Vec3};

/// One recorded pose of a body.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformSample {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Seconds since the recording started.
    pub timestamp: f32,
}

impl TransformSample {
    /// Reads the body's current state. `None` if the body no longer exists.
    pub fn capture(physics: &dyn PhysicsBackend, body: BodyHandle, timestamp: f32) -> Option<Self> {
        Some(Self {
            position: physics.position(body)?,
            rotation: physics.rotation(body)?,
            linear_velocity: physics.linear_velocity(body).unwrap_or_else(Vec3::zeros),
            angular_velocity: physics.angular_velocity(body).unwrap_or_else(Vec3::zeros),
            timestamp,
        })
    }
}

/// A body handed to the recorder, with the name its timeline is saved under.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedBody {
    pub name: String,
    pub body: BodyHandle,
}

impl TrackedBody {
    pub fn new(name: impl Into<String>, body: BodyHandle) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// The timeline of one body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedObject {
    pub name: String,
    pub is_player: bool,
    pub samples: Vec<TransformSample>,
    /// Live body while recording. Not persisted.
    #[serde(skip)]
    pub body: Option<BodyHandle>,
}

impl RecordedObject {
    pub fn new(tracked: &TrackedBody, is_player: bool) -> Self {
        Self {
            name: tracked.name.clone(),
            is_player,
            samples: Vec::new(),
            body: Some(tracked.body),
        }
    }

    /// Appends `sample` unless it would go back in time.
    pub fn push_sample(&mut self, sample: TransformSample) -> bool {
        if let Some(last) = self.samples.last() {
            if sample.timestamp < last.timestamp {
                log::warn!(
                    "Dropping out-of-order sample for {} ({} < {})",
                    self.name,
                    sample.timestamp,
                    last.timestamp
                );
                return false;
            }
        }
        self.samples.push(sample);
        true
    }

    pub fn first_sample(&self) -> Option<&TransformSample> {
        self.samples.first()
    }

    pub fn last_sample(&self) -> Option<&TransformSample> {
        self.samples.last()
    }
}

/// A saved recording. Shared read-only between the store and the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplaySession {
    pub name: String,
    /// Seconds.
    pub duration: f32,
    pub created_at: DateTime<Utc>,
    pub recorded_objects: Vec<RecordedObject>,
}

impl ReplaySession {
    pub fn object_count(&self) -> usize {
        self.recorded_objects.len()
    }

    pub fn sample_count(&self) -> usize {
        self.recorded_objects.iter().map(|o| o.samples.len()).sum()
    }

    pub fn object(&self, name: &str) -> Option<&RecordedObject> {
        self.recorded_objects.iter().find(|o| o.name == name)
    }
}
