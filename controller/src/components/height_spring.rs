use shared::math::shortest_rotation;
use shared::{BodyHandle, ForceMode, GroundReading, PhysicsBackend, Vec3};

use crate::config::HeightSpringSettings;

/// Keeps the body floating at `ride_height` above the ground and standing
/// upright, both as damped springs.
#[derive(Clone, Debug)]
pub struct HeightSpring {
    body: BodyHandle,
    settings: HeightSpringSettings,
}

impl HeightSpring {
    pub fn new(body: BodyHandle, settings: HeightSpringSettings) -> Self {
        Self { body, settings }
    }

    /// Pushes along the probe direction toward the ride height. No-op when
    /// the reading is airborne.
    pub fn apply_spring(&self, physics: &mut dyn PhysicsBackend, ground: &GroundReading) {
        if !ground.is_grounded {
            return;
        }
        let Some(vel) = physics.linear_velocity(self.body) else {
            return;
        };

        let down = -Vec3::y();
        // Ground is treated as static.
        let rel_vel = down.dot(&vel);
        let x = ground.distance - self.settings.ride_height;
        let spring = x * self.settings.spring_strength - rel_vel * self.settings.spring_damping;

        physics.apply_force(self.body, down * spring, ForceMode::Force);
    }

    pub fn apply_upright_torque(&self, physics: &mut dyn PhysicsBackend) {
        let (Some(current), Some(angvel)) = (
            physics.rotation(self.body),
            physics.angular_velocity(self.body),
        ) else {
            return;
        };

        let offset = shortest_rotation(&self.settings.upright_target, &current);
        let spring = offset
            .axis_angle()
            .map(|(axis, angle)| axis.into_inner() * (angle * -self.settings.upright_spring_strength))
            .unwrap_or_else(Vec3::zeros);

        physics.apply_torque(self.body, spring - angvel * self.settings.upright_spring_damper);
    }

    pub fn ride_height(&self) -> f32 {
        self.settings.ride_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Quat;
    use shared::testing::MockPhysics;

    fn grounded(distance: f32) -> GroundReading {
        GroundReading {
            is_grounded: true,
            distance,
            hit_point: Some(Vec3::zeros()),
        }
    }

    #[test]
    fn spring_pulls_down_when_riding_high() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        let spring = HeightSpring::new(body, HeightSpringSettings::default());

        // 2.5 m above a 2 m ride height, at rest: (0.5 * 50) along down.
        spring.apply_spring(&mut physics, &grounded(2.5));
        let f = physics.total_applied(body, ForceMode::Force);
        assert!((f - Vec3::new(0.0, -25.0, 0.0)).norm() < 1.0e-5);
    }

    #[test]
    fn spring_damps_vertical_velocity() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        physics.set_linear_velocity(body, Vec3::new(0.0, -2.0, 0.0));
        let spring = HeightSpring::new(body, HeightSpringSettings::default());

        // At ride height, falling at 2 m/s: damping pushes up by 2 * 5.
        spring.apply_spring(&mut physics, &grounded(2.0));
        let f = physics.total_applied(body, ForceMode::Force);
        assert!((f - Vec3::new(0.0, 10.0, 0.0)).norm() < 1.0e-5);
    }

    #[test]
    fn spring_skipped_when_airborne() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        let spring = HeightSpring::new(body, HeightSpringSettings::default());
        spring.apply_spring(&mut physics, &GroundReading::airborne(3.0));
        assert!(physics.forces.is_empty());
    }

    #[test]
    fn upright_torque_opposes_tilt() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        physics.set_rotation(body, Quat::from_axis_angle(&Vec3::x_axis(), 0.3));
        let spring = HeightSpring::new(body, HeightSpringSettings::default());

        spring.apply_upright_torque(&mut physics);
        let (_, torque) = physics.torques[0];
        assert!((torque.x + 0.3 * 40.0).abs() < 1.0e-4);
        assert!(torque.y.abs() < 1.0e-5 && torque.z.abs() < 1.0e-5);
    }

    #[test]
    fn upright_torque_damps_spin_when_level() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        physics.set_angular_velocity(body, Vec3::new(0.0, 2.0, 0.0));
        let spring = HeightSpring::new(body, HeightSpringSettings::default());

        spring.apply_upright_torque(&mut physics);
        let (_, torque) = physics.torques[0];
        assert!((torque - Vec3::new(0.0, -10.0, 0.0)).norm() < 1.0e-5);
    }
}
