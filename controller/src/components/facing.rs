use shared::math::{flatten, slerp, yaw_look_rotation};
use shared::{MOVE_INTENT_THRESHOLD, Quat, Vec2, Vec3};

use super::camera::CameraRig;
use super::movement::input_direction;

/// Camera-forward direction remembered from the last shot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShootFacing {
    pub direction: Vec3,
    pub at: f64,
}

/// Yaw of the visual model, which turns independently of the physics body.
#[derive(Clone, Debug)]
pub struct Facing {
    model_rotation: Quat,
    shoot_facing: Option<ShootFacing>,
    turn_rate: f32,
    shoot_window: f32,
}

impl Facing {
    pub fn new(turn_rate: f32, shoot_window: f32) -> Self {
        Self {
            model_rotation: Quat::identity(),
            shoot_facing: None,
            turn_rate,
            shoot_window,
        }
    }

    pub fn model_rotation(&self) -> Quat {
        self.model_rotation
    }

    pub fn shoot_facing(&self) -> Option<ShootFacing> {
        self.shoot_facing
    }

    /// Turns the model toward, in priority order: a shot fired within the
    /// window, the move direction, the last shot direction. Leaves it alone
    /// when none apply.
    pub fn update(
        &mut self,
        move_input: &Vec2,
        shoot_pressed: bool,
        camera: &CameraRig,
        now: f64,
        dt: f32,
    ) {
        let input_dir = input_direction(move_input, &camera.yaw_rotation());
        let has_move = input_dir.norm() >= MOVE_INTENT_THRESHOLD;

        if shoot_pressed {
            self.shoot_facing = flatten(&camera.forward()).map(|direction| ShootFacing {
                direction,
                at: now,
            });
        }

        let recent_shot = self
            .shoot_facing
            .filter(|s| now - s.at < self.shoot_window as f64);

        let target = if let Some(shot) = recent_shot {
            shot.direction
        } else if has_move {
            if !shoot_pressed {
                self.shoot_facing = None;
            }
            input_dir
        } else if let Some(shot) = self.shoot_facing {
            shot.direction
        } else {
            return;
        };

        let Some(target_rotation) = yaw_look_rotation(&target) else {
            return;
        };
        self.model_rotation = slerp(&self.model_rotation, &target_rotation, self.turn_rate * dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraSettings;
    use shared::math::yaw_rotation;
    use std::f32::consts::FRAC_PI_2;

    fn yaw_of(q: &Quat) -> f32 {
        let fwd = q * Vec3::z();
        fwd.x.atan2(fwd.z)
    }

    #[test]
    fn turns_toward_move_direction() {
        let camera = CameraRig::new(CameraSettings::default());
        let mut facing = Facing::new(10.0, 0.5);
        // A full-rate step (10 * 0.1 = 1) snaps to the target.
        facing.update(&Vec2::new(1.0, 0.0), false, &camera, 0.0, 0.1);
        assert!((yaw_of(&facing.model_rotation()) - FRAC_PI_2).abs() < 1.0e-4);
    }

    #[test]
    fn no_input_leaves_rotation_untouched() {
        let camera = CameraRig::new(CameraSettings::default());
        let mut facing = Facing::new(10.0, 0.5);
        facing.update(&Vec2::zeros(), false, &camera, 0.0, 0.1);
        assert_eq!(facing.model_rotation(), Quat::identity());
    }

    #[test]
    fn recent_shot_beats_movement_then_movement_clears_it() {
        let mut camera = CameraRig::new(CameraSettings::default());
        camera.position_pivot(Vec3::zeros(), 0.02);
        let mut facing = Facing::new(10.0, 0.5);

        facing.update(&Vec2::zeros(), true, &camera, 1.0, 0.1);
        let shot = facing.shoot_facing().unwrap();
        assert_eq!(shot.at, 1.0);
        let after_shot = facing.model_rotation();

        // Inside the window, moving sideways still faces the shot.
        facing.update(&Vec2::new(1.0, 0.0), false, &camera, 1.2, 0.1);
        assert!(after_shot.angle_to(&facing.model_rotation()) < 1.0e-4);

        // Past the window, movement wins and the shot is forgotten.
        facing.update(&Vec2::new(1.0, 0.0), false, &camera, 2.0, 0.1);
        assert!(facing.shoot_facing().is_none());
        assert!((yaw_of(&facing.model_rotation()) - FRAC_PI_2).abs() < 1.0e-4);
    }

    #[test]
    fn stale_shot_is_kept_while_idle() {
        let mut camera = CameraRig::new(CameraSettings::default());
        camera.position_pivot(Vec3::zeros(), 0.02);
        let mut facing = Facing::new(10.0, 0.5);
        facing.update(&Vec2::zeros(), true, &camera, 0.0, 0.1);
        facing.update(&Vec2::zeros(), false, &camera, 5.0, 0.1);
        assert!(facing.shoot_facing().is_some());
    }

    #[test]
    fn partial_step_moves_part_way() {
        let camera = CameraRig::new(CameraSettings::default());
        let mut facing = Facing::new(10.0, 0.5);
        facing.update(&Vec2::new(1.0, 0.0), false, &camera, 0.0, 0.02);
        let yaw = yaw_of(&facing.model_rotation());
        assert!(yaw > 0.0 && yaw < FRAC_PI_2);
        assert!(facing.model_rotation().angle_to(&yaw_rotation(FRAC_PI_2)) > 0.5);
    }
}
