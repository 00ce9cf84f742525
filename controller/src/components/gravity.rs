use shared::{BodyHandle, ForceMode, PhysicsBackend, Vec3};

use crate::config::PhysicsSettings;

/// Controller-side gravity. The body is expected to ignore engine gravity.
#[derive(Clone, Debug)]
pub struct Gravity {
    body: BodyHandle,
    strength: f32,
    enabled: bool,
}

impl Gravity {
    pub fn new(body: BodyHandle, settings: &PhysicsSettings) -> Self {
        Self {
            body,
            strength: settings.gravity_strength,
            enabled: true,
        }
    }

    pub fn apply(&self, physics: &mut dyn PhysicsBackend) {
        if !self.enabled {
            return;
        }
        physics.apply_force(self.body, -Vec3::y() * self.strength, ForceMode::Acceleration);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
