use shared::math::look_rotation;
use shared::{BodyHandle, ForceMode, PhysicsBackend, Quat, Vec3};

use crate::config::ShootingSettings;

#[derive(Clone, Debug)]
pub struct Shooting {
    body: BodyHandle,
    settings: ShootingSettings,
    last_shot: f64,
}

impl Shooting {
    pub fn new(body: BodyHandle, settings: ShootingSettings) -> Self {
        // Allows the first shot immediately.
        let last_shot = -(settings.shoot_cooldown as f64);
        Self {
            body,
            settings,
            last_shot,
        }
    }

    /// Fires along `forward` if the button is held and the cooldown has
    /// elapsed. Returns the spawned projectile.
    pub fn handle_shooting(
        &mut self,
        physics: &mut dyn PhysicsBackend,
        shoot_pressed: bool,
        forward: &Vec3,
        now: f64,
    ) -> Option<BodyHandle> {
        if !shoot_pressed || now - self.last_shot < self.settings.shoot_cooldown as f64 {
            return None;
        }
        let origin = physics.position(self.body)?;
        self.last_shot = now;

        let position = origin + forward * self.settings.muzzle_offset;
        let rotation = look_rotation(forward).unwrap_or_else(Quat::identity);
        let Some(projectile) = physics.spawn_projectile(&self.settings.projectile, position, rotation)
        else {
            log::warn!("Physics backend refused to spawn a projectile");
            return None;
        };
        physics.apply_force(projectile, forward * self.settings.shoot_force, ForceMode::Impulse);
        Some(projectile)
    }

    pub fn last_shot(&self) -> f64 {
        self.last_shot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::testing::MockPhysics;

    #[test]
    fn fires_immediately_then_respects_cooldown() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::new(0.0, 1.0, 0.0), 1.0, 0.5);
        let mut shooting = Shooting::new(body, ShootingSettings::default());
        let fwd = Vec3::z();

        let first = shooting.handle_shooting(&mut physics, true, &fwd, 0.0).unwrap();
        assert_eq!(physics.position(first), Some(Vec3::new(0.0, 1.0, 2.0)));
        // Impulse of 30 on a 1 kg projectile.
        assert_eq!(physics.linear_velocity(first), Some(Vec3::new(0.0, 0.0, 30.0)));

        assert!(shooting.handle_shooting(&mut physics, true, &fwd, 0.3).is_none());
        assert!(shooting.handle_shooting(&mut physics, true, &fwd, 0.5).is_some());
        assert_eq!(physics.projectiles.len(), 2);
    }

    #[test]
    fn projectile_points_along_pitched_aim() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        let mut shooting = Shooting::new(body, ShootingSettings::default());
        let aim = Vec3::new(0.0, -0.6, 0.8);

        shooting.handle_shooting(&mut physics, true, &aim, 0.0).unwrap();
        let spawned = &physics.projectiles[0];
        assert!(((spawned.rotation * Vec3::z()) - aim).norm() < 1.0e-5);
    }

    #[test]
    fn released_button_never_fires() {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        let mut shooting = Shooting::new(body, ShootingSettings::default());
        assert!(shooting.handle_shooting(&mut physics, false, &Vec3::z(), 10.0).is_none());
        assert!(physics.projectiles.is_empty());
    }
}
