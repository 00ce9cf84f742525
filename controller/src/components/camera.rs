use shared::math::{smooth_damp_vec3, yaw_rotation};
use shared::{DIST_EPS, Quat, Vec2, Vec3};

use crate::config::CameraSettings;

/// Third-person camera pivot that trails the body.
///
/// The pivot carries the camera yaw. Two targets hang off it in the yaw frame:
/// the camera position target and the look target, whose local height is
/// driven by vertical look input.
#[derive(Clone, Debug)]
pub struct CameraRig {
    settings: CameraSettings,
    pivot_position: Vec3,
    /// Radians about +Y.
    yaw: f32,
    look_height: f32,
    smooth_velocity: Vec3,
    initialized: bool,
}

impl CameraRig {
    pub fn new(settings: CameraSettings) -> Self {
        let look_height = settings.look_target_offset.y;
        Self {
            settings,
            pivot_position: Vec3::zeros(),
            yaw: 0.0,
            look_height,
            smooth_velocity: Vec3::zeros(),
            initialized: false,
        }
    }

    /// Moves the pivot toward `target`. The first call after construction or
    /// [`reset_position_initialization`](Self::reset_position_initialization)
    /// snaps.
    pub fn position_pivot(&mut self, target: Vec3, dt: f32) {
        if !self.initialized {
            self.pivot_position = target;
            self.smooth_velocity = Vec3::zeros();
            self.initialized = true;
            return;
        }

        if !self.settings.use_smoothing {
            self.pivot_position = target;
            return;
        }

        self.pivot_position = smooth_damp_vec3(
            &self.pivot_position,
            &target,
            &mut self.smooth_velocity,
            self.settings.smoothing_time,
            self.settings.max_smooth_speed,
            dt,
        );
    }

    pub fn handle_look_input(&mut self, look: &Vec2) {
        self.yaw += (look.x * self.settings.horizontal_sensitivity).to_radians();
        let [low, high] = self.settings.look_height_range;
        self.look_height = (self.look_height + look.y * self.settings.vertical_sensitivity * 0.01)
            .clamp(low, high);
    }

    pub fn reset_position_initialization(&mut self) {
        self.initialized = false;
    }

    #[inline]
    pub fn pivot_position(&self) -> Vec3 {
        self.pivot_position
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn yaw_rotation(&self) -> Quat {
        yaw_rotation(self.yaw)
    }

    pub fn look_height(&self) -> f32 {
        self.look_height
    }

    pub fn position_target(&self) -> Vec3 {
        self.pivot_position + self.yaw_rotation() * self.settings.position_target_offset
    }

    pub fn look_target(&self) -> Vec3 {
        let offset = self.settings.look_target_offset;
        self.pivot_position + self.yaw_rotation() * Vec3::new(offset.x, self.look_height, offset.z)
    }

    /// Unit direction from the camera position target to the look target.
    pub fn forward(&self) -> Vec3 {
        (self.look_target() - self.position_target())
            .try_normalize(DIST_EPS)
            .unwrap_or_else(|| self.yaw_rotation() * Vec3::z())
    }
}
