/*!
Controller settings bundle.

Each slice maps onto one force component. Every field has a default, so a JSON
file only needs to name the values it overrides:

```json
{ "movement": { "max_speed": 6.0 }, "camera": { "use_smoothing": false } }
```

The bundle is read once when a [`CharacterController`](crate::CharacterController)
is built and is never mutated afterwards.
*/

use std::path::Path;

use serde::{Deserialize, Serialize};

use shared::error::{ensure_non_negative, ensure_positive};
use shared::{ConfigError, GroundCheckSettings, ProjectileDesc, Quat, Vec3};

use crate::curve::Curve;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub physics: PhysicsSettings,
    pub movement: MovementSettings,
    pub ground_checker: GroundCheckSettings,
    pub height_spring: HeightSpringSettings,
    pub camera: CameraSettings,
    pub shooting: ShootingSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Downward acceleration applied by the controller (m/s²). The body itself
    /// should not be affected by engine gravity.
    pub gravity_strength: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity_strength: 9.81,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    pub max_speed: f32,
    /// Cap on the horizontal acceleration locomotion may request (m/s²).
    pub max_accel_force: f32,
    pub friction_coefficient: f32,
    /// Horizontal speed under which friction stops the body outright (m/s).
    pub static_friction_threshold: f32,

    pub jump_up_velocity: f32,
    /// Scales the take-off velocity by `vy / jump_terminal_velocity`.
    pub jump_up_velocity_factor_from_existing_y: Curve,
    /// Upward acceleration over the normalized hold time of the jump button.
    pub analog_jump_up_force: Curve,
    pub jump_terminal_velocity: f32,
    /// How long holding jump keeps pushing upward (seconds).
    pub jump_duration: f32,
    /// Extra fall acceleration, in multiples of standard gravity.
    pub jump_fall_factor: f32,

    /// Slerp rate of the visual model toward its target yaw (per second).
    pub model_turn_rate: f32,
    /// How long a shot keeps the model facing the camera (seconds).
    pub shoot_facing_window: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            max_speed: 10.0,
            max_accel_force: 150.0,
            friction_coefficient: 10.0,
            static_friction_threshold: 0.1,
            jump_up_velocity: 9.0,
            jump_up_velocity_factor_from_existing_y: Curve::falloff(),
            analog_jump_up_force: Curve::falloff(),
            jump_terminal_velocity: 22.5,
            jump_duration: 0.6667,
            jump_fall_factor: 1.25,
            model_turn_rate: 10.0,
            shoot_facing_window: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeightSpringSettings {
    pub ride_height: f32,
    pub spring_strength: f32,
    pub spring_damping: f32,
    /// Orientation the upright torque pulls the body toward.
    pub upright_target: Quat,
    pub upright_spring_strength: f32,
    pub upright_spring_damper: f32,
}

impl Default for HeightSpringSettings {
    fn default() -> Self {
        Self {
            ride_height: 2.0,
            spring_strength: 50.0,
            spring_damping: 5.0,
            upright_target: Quat::identity(),
            upright_spring_strength: 40.0,
            upright_spring_damper: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Look target, in the pivot's yaw frame.
    pub look_target_offset: Vec3,
    /// Camera position target, in the pivot's yaw frame.
    pub position_target_offset: Vec3,
    pub use_smoothing: bool,
    pub smoothing_time: f32,
    pub max_smooth_speed: f32,
    /// Degrees of yaw per unit of horizontal look input.
    pub horizontal_sensitivity: f32,
    pub vertical_sensitivity: f32,
    /// Allowed `[min, max]` local height of the look target.
    pub look_height_range: [f32; 2],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            look_target_offset: Vec3::new(2.22, 0.6, 0.0),
            position_target_offset: Vec3::new(2.0, 1.25, -3.0),
            use_smoothing: true,
            smoothing_time: 0.05,
            max_smooth_speed: 20.0,
            horizontal_sensitivity: 2.0,
            vertical_sensitivity: 1.0,
            look_height_range: [0.0, 2.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootingSettings {
    pub shoot_force: f32,
    pub shoot_cooldown: f32,
    /// Spawn distance in front of the shot origin (meters).
    pub muzzle_offset: f32,
    pub projectile: ProjectileDesc,
}

impl Default for ShootingSettings {
    fn default() -> Self {
        Self {
            shoot_force: 30.0,
            shoot_cooldown: 0.5,
            muzzle_offset: 2.0,
            projectile: ProjectileDesc::default(),
        }
    }
}

impl ControllerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Loads `path`, falling back to defaults (with an error log) if the file
    /// is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::from_json_file(path.as_ref()) {
            Ok(config) => config,
            Err(err) => {
                log::error!(
                    "Using default controller config, {} could not be loaded: {err}",
                    path.as_ref().display()
                );
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("physics.gravity_strength", self.physics.gravity_strength)?;

        let m = &self.movement;
        ensure_non_negative("movement.max_speed", m.max_speed)?;
        ensure_non_negative("movement.max_accel_force", m.max_accel_force)?;
        ensure_non_negative("movement.friction_coefficient", m.friction_coefficient)?;
        ensure_non_negative("movement.static_friction_threshold", m.static_friction_threshold)?;
        ensure_non_negative("movement.jump_up_velocity", m.jump_up_velocity)?;
        ensure_positive("movement.jump_terminal_velocity", m.jump_terminal_velocity)?;
        ensure_positive("movement.jump_duration", m.jump_duration)?;
        ensure_non_negative("movement.jump_fall_factor", m.jump_fall_factor)?;
        ensure_non_negative("movement.model_turn_rate", m.model_turn_rate)?;
        ensure_non_negative("movement.shoot_facing_window", m.shoot_facing_window)?;
        if !m.jump_up_velocity_factor_from_existing_y.is_well_formed() {
            return Err(ConfigError::invalid(
                "movement.jump_up_velocity_factor_from_existing_y",
                "curve keys must be finite and sorted",
            ));
        }
        if !m.analog_jump_up_force.is_well_formed() {
            return Err(ConfigError::invalid(
                "movement.analog_jump_up_force",
                "curve keys must be finite and sorted",
            ));
        }

        let g = &self.ground_checker;
        ensure_non_negative("ground_checker.radius_multiplier", g.radius_multiplier)?;
        ensure_positive("ground_checker.max_check_distance", g.max_check_distance)?;

        let h = &self.height_spring;
        ensure_non_negative("height_spring.ride_height", h.ride_height)?;
        ensure_non_negative("height_spring.spring_strength", h.spring_strength)?;
        ensure_non_negative("height_spring.spring_damping", h.spring_damping)?;
        ensure_non_negative("height_spring.upright_spring_strength", h.upright_spring_strength)?;
        ensure_non_negative("height_spring.upright_spring_damper", h.upright_spring_damper)?;

        let c = &self.camera;
        ensure_non_negative("camera.smoothing_time", c.smoothing_time)?;
        ensure_non_negative("camera.max_smooth_speed", c.max_smooth_speed)?;
        let [low, high] = c.look_height_range;
        if !(low.is_finite() && high.is_finite() && low <= high) {
            return Err(ConfigError::invalid(
                "camera.look_height_range",
                format!("[{low}, {high}] is not an ordered range"),
            ));
        }

        let s = &self.shooting;
        ensure_non_negative("shooting.shoot_force", s.shoot_force)?;
        ensure_non_negative("shooting.shoot_cooldown", s.shoot_cooldown)?;
        ensure_non_negative("shooting.muzzle_offset", s.muzzle_offset)?;
        ensure_positive("shooting.projectile.radius", s.projectile.radius)?;
        ensure_positive("shooting.projectile.mass", s.projectile.mass)?;

        Ok(())
    }
}
