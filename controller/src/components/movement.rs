//! Locomotion, friction and the variable-height jump.
//!
//! Jump lifecycle
//! - A jump starts only when jump is pressed, no jump is in progress, the
//!   button has been released since the previous jump, and the body is grounded.
//! - While the button is held the analog force phase pushes upward for at most
//!   `jump_duration`; releasing ends it early.
//! - `is_jumping` stays set until [`Movement::check_jump_reset`] sees the body
//!   grounded, out of its force phase, and no longer rising.

use shared::math::flatten;
use shared::{
    BodyHandle, FALLING_VELOCITY_THRESHOLD, ForceMode, GRAVITY_MPS2, PhysicsBackend, Quat, Vec2,
    Vec3,
};

use crate::config::MovementSettings;

/// Move input rotated into the camera's yaw frame: `x` strafes, `y` goes forward.
#[inline]
pub fn input_direction(move_input: &Vec2, camera_yaw: &Quat) -> Vec3 {
    camera_yaw * Vec3::new(move_input.x, 0.0, move_input.y)
}

#[derive(Clone, Debug)]
pub struct Movement {
    body: BodyHandle,
    settings: MovementSettings,
    has_button_been_released: bool,
    is_jumping: bool,
    is_jump_force_active: bool,
    jump_hold_time: f32,
}

impl Movement {
    pub fn new(body: BodyHandle, settings: MovementSettings) -> Self {
        Self {
            body,
            settings,
            has_button_been_released: true,
            is_jumping: false,
            is_jump_force_active: false,
            jump_hold_time: 0.0,
        }
    }

    #[inline]
    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    #[inline]
    pub fn is_jump_force_active(&self) -> bool {
        self.is_jump_force_active
    }

    pub fn jump_hold_time(&self) -> f32 {
        self.jump_hold_time
    }

    /// Rising slower than the falling threshold, or falling.
    pub fn is_falling(&self, physics: &dyn PhysicsBackend) -> bool {
        physics
            .linear_velocity(self.body)
            .is_some_and(|v| v.y < FALLING_VELOCITY_THRESHOLD)
    }

    /// Accelerates the horizontal velocity toward `max_speed` along the input
    /// direction, capped at `max_accel_force`. Zero input brakes toward rest.
    pub fn handle_movement(
        &self,
        physics: &mut dyn PhysicsBackend,
        move_input: &Vec2,
        camera_yaw: &Quat,
        dt: f32,
    ) {
        if dt <= 0.0 {
            return;
        }
        let (Some(rotation), Some(vel), Some(mass)) = (
            physics.rotation(self.body),
            physics.linear_velocity(self.body),
            physics.mass(self.body),
        ) else {
            return;
        };

        let direction = flatten(&(rotation * input_direction(move_input, camera_yaw)))
            .unwrap_or_else(Vec3::zeros);
        let goal_vel = direction * self.settings.max_speed;
        let current_xz = Vec3::new(vel.x, 0.0, vel.z);

        let mut needed = (goal_vel - current_xz) / dt;
        if needed.norm() > self.settings.max_accel_force {
            needed = needed.normalize() * self.settings.max_accel_force;
        }

        physics.apply_force(self.body, needed * mass, ForceMode::Force);
    }

    /// Static friction below the threshold, speed-proportional drag above it.
    pub fn apply_friction(&self, physics: &mut dyn PhysicsBackend) {
        let Some(vel) = physics.linear_velocity(self.body) else {
            return;
        };
        let horizontal = Vec3::new(vel.x, 0.0, vel.z);
        let speed = horizontal.norm();

        if speed < self.settings.static_friction_threshold {
            physics.set_linear_velocity(self.body, Vec3::new(0.0, vel.y, 0.0));
            return;
        }

        let drag = -(horizontal / speed) * (self.settings.friction_coefficient * speed);
        physics.apply_force(self.body, drag, ForceMode::Acceleration);
    }

    pub fn handle_jumping(
        &mut self,
        physics: &mut dyn PhysicsBackend,
        jump_pressed: bool,
        jump_released: bool,
        is_grounded: bool,
        dt: f32,
    ) {
        let Some(vel) = physics.linear_velocity(self.body) else {
            return;
        };

        if jump_pressed && !self.is_jumping && self.has_button_been_released && is_grounded {
            self.is_jumping = true;
            self.is_jump_force_active = true;
            self.has_button_been_released = false;
            self.jump_hold_time = 0.0;

            let factor = self
                .settings
                .jump_up_velocity_factor_from_existing_y
                .evaluate(vel.y / self.settings.jump_terminal_velocity);
            let take_off = self.settings.jump_up_velocity * factor;
            physics.set_linear_velocity(self.body, Vec3::new(vel.x, take_off, vel.z));
            log::debug!("Jump started with take-off velocity {take_off:.2}");
        }

        if jump_released {
            self.has_button_been_released = true;
        }

        if self.is_jump_force_active {
            if jump_released {
                self.is_jump_force_active = false;
            } else {
                self.jump_hold_time += dt;
                if self.jump_hold_time <= self.settings.jump_duration {
                    let normalized = self.jump_hold_time / self.settings.jump_duration;
                    let lift = self.settings.analog_jump_up_force.evaluate(normalized);
                    physics.apply_force(self.body, Vec3::y() * lift, ForceMode::Acceleration);
                } else {
                    self.is_jump_force_active = false;
                }
            }
        }

        let vy = physics.linear_velocity(self.body).map_or(vel.y, |v| v.y);
        if self.is_jumping && (vy < FALLING_VELOCITY_THRESHOLD || jump_released) {
            physics.apply_force(
                self.body,
                -Vec3::y() * (self.settings.jump_fall_factor * GRAVITY_MPS2),
                ForceMode::Acceleration,
            );
        }
    }

    /// Clears `is_jumping` once the body has landed after a jump.
    pub fn check_jump_reset(&mut self, physics: &dyn PhysicsBackend, is_grounded: bool) {
        if is_grounded && self.is_jumping && !self.is_jump_force_active && self.is_falling(physics)
        {
            self.is_jumping = false;
            log::debug!("Jump finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::testing::MockPhysics;

    const DT: f32 = 0.02;

    fn setup() -> (MockPhysics, BodyHandle, Movement) {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 2.0, 0.5);
        let movement = Movement::new(body, MovementSettings::default());
        (physics, body, movement)
    }

    #[test]
    fn locomotion_force_is_capped_and_scaled_by_mass() {
        let (mut physics, body, movement) = setup();
        movement.handle_movement(&mut physics, &Vec2::new(0.0, 1.0), &Quat::identity(), DT);

        // Needed accel (10 / 0.02 = 500) is capped at 150, times mass 2.
        let f = physics.total_applied(body, ForceMode::Force);
        assert!((f - Vec3::new(0.0, 0.0, 300.0)).norm() < 1.0e-3);
    }

    #[test]
    fn locomotion_follows_camera_yaw() {
        let (mut physics, body, movement) = setup();
        let yaw = shared::math::yaw_rotation(std::f32::consts::FRAC_PI_2);
        movement.handle_movement(&mut physics, &Vec2::new(0.0, 1.0), &yaw, DT);
        let f = physics.total_applied(body, ForceMode::Force);
        assert!(f.x > 299.0 && f.z.abs() < 1.0e-3);
    }

    #[test]
    fn zero_input_brakes_horizontal_velocity() {
        let (mut physics, body, movement) = setup();
        physics.set_linear_velocity(body, Vec3::new(1.0, 0.0, 0.0));
        movement.handle_movement(&mut physics, &Vec2::zeros(), &Quat::identity(), DT);
        let f = physics.total_applied(body, ForceMode::Force);
        // -1 / 0.02 = -50 m/s² times mass 2.
        assert!((f - Vec3::new(-100.0, 0.0, 0.0)).norm() < 1.0e-3);
    }

    #[test]
    fn friction_stops_slow_bodies_and_drags_fast_ones() {
        let (mut physics, body, movement) = setup();
        physics.set_linear_velocity(body, Vec3::new(0.05, -1.0, 0.0));
        movement.apply_friction(&mut physics);
        assert_eq!(physics.linear_velocity(body), Some(Vec3::new(0.0, -1.0, 0.0)));

        physics.set_linear_velocity(body, Vec3::new(2.0, 0.0, 0.0));
        movement.apply_friction(&mut physics);
        let drag = physics.total_applied(body, ForceMode::Acceleration);
        assert!((drag - Vec3::new(-20.0, 0.0, 0.0)).norm() < 1.0e-4);
    }

    #[test]
    fn jump_sets_take_off_velocity_from_rest() {
        let (mut physics, body, mut movement) = setup();
        movement.handle_jumping(&mut physics, true, false, true, DT);
        assert!(movement.is_jumping());
        assert!(movement.is_jump_force_active());
        assert!((physics.linear_velocity(body).unwrap().y - 9.0).abs() < 1.0e-5);
    }

    #[test]
    fn jump_requires_ground_and_a_release_between_jumps() {
        let (mut physics, _, mut movement) = setup();
        movement.handle_jumping(&mut physics, true, false, false, DT);
        assert!(!movement.is_jumping());

        movement.handle_jumping(&mut physics, true, false, true, DT);
        assert!(movement.is_jumping());

        // Force the jump to end, then keep holding: no re-jump.
        movement.is_jumping = false;
        movement.is_jump_force_active = false;
        movement.handle_jumping(&mut physics, true, false, true, DT);
        assert!(!movement.is_jumping());

        movement.handle_jumping(&mut physics, false, true, true, DT);
        movement.handle_jumping(&mut physics, true, false, true, DT);
        assert!(movement.is_jumping());
    }

    #[test]
    fn force_phase_ends_after_duration_or_release() {
        let (mut physics, _, mut movement) = setup();
        movement.handle_jumping(&mut physics, true, false, true, DT);
        let ticks = (0.6667 / DT) as usize + 2;
        for _ in 0..ticks {
            movement.handle_jumping(&mut physics, true, false, false, DT);
        }
        assert!(!movement.is_jump_force_active());

        let (mut physics, _, mut movement) = setup();
        movement.handle_jumping(&mut physics, true, false, true, DT);
        movement.handle_jumping(&mut physics, false, true, false, DT);
        assert!(!movement.is_jump_force_active());
        assert!(movement.is_jumping());
    }

    #[test]
    fn fall_boost_applies_once_past_apex() {
        let (mut physics, body, mut movement) = setup();
        movement.handle_jumping(&mut physics, true, false, true, DT);
        physics.clear_log();

        physics.set_linear_velocity(body, Vec3::new(0.0, -1.0, 0.0));
        movement.handle_jumping(&mut physics, false, true, false, DT);
        let a = physics.total_applied(body, ForceMode::Acceleration);
        assert!((a.y + 1.25 * GRAVITY_MPS2).abs() < 1.0e-4);
    }

    #[test]
    fn jump_reset_needs_ground_no_force_and_no_rise() {
        let (mut physics, body, mut movement) = setup();
        movement.handle_jumping(&mut physics, true, false, true, DT);

        // Still in force phase.
        physics.set_linear_velocity(body, Vec3::zeros());
        movement.check_jump_reset(&physics, true);
        assert!(movement.is_jumping());

        movement.handle_jumping(&mut physics, false, true, false, DT);
        physics.set_linear_velocity(body, Vec3::new(0.0, 3.0, 0.0));
        // Rising.
        movement.check_jump_reset(&physics, true);
        assert!(movement.is_jumping());

        physics.set_linear_velocity(body, Vec3::new(0.0, -0.5, 0.0));
        // Airborne.
        movement.check_jump_reset(&physics, false);
        assert!(movement.is_jumping());

        movement.check_jump_reset(&physics, true);
        assert!(!movement.is_jumping());
    }
}
