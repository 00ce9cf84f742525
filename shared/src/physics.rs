//! Narrow contract between the character controller / recorder and whatever
//! rigid-body engine owns the bodies.
//!
//! Bodies are addressed by Rapier's `RigidBodyHandle`. The backend owns the
//! bodies; callers hold `Copy` handles and borrow the backend per call. Queries
//! against a handle that no longer exists return `None` and commands against
//! one are ignored.

use rapier3d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

use crate::math::{Quat, Vec3};

pub type BodyHandle = RigidBodyHandle;

/// How a vector passed to [`PhysicsBackend::apply_force`] is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForceMode {
    /// Continuous force (N), integrated over the next step.
    Force,
    /// Continuous acceleration (m/s²), independent of mass.
    Acceleration,
    /// Instant change of momentum (N·s).
    Impulse,
    /// Instant change of velocity (m/s), independent of mass.
    VelocityChange,
}

/// Bitmask of collision layers. A collider on layer `n` matches a mask with
/// bit `n` set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    #[inline]
    pub const fn layer(index: u8) -> Self {
        Self(1u32 << (index as u32 & 31))
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::layer(0)
    }
}

/// Parameters of a single sphere sweep.
#[derive(Clone, Copy, Debug)]
pub struct SphereCast {
    pub origin: Vec3,
    pub radius: f32,
    /// Unit direction of travel.
    pub direction: Vec3,
    pub max_distance: f32,
    pub layer_mask: LayerMask,
    /// Body whose colliders are ignored, usually the caster itself.
    pub exclude: Option<BodyHandle>,
}

/// First contact of a sphere sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereCastHit {
    /// Distance travelled by the sphere center before contact.
    pub distance: f32,
    /// World-space contact point on the hit surface.
    pub point: Vec3,
    /// World-space surface normal at the contact.
    pub normal: Vec3,
}

/// What to spawn when a character shoots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileDesc {
    pub radius: f32,
    pub mass: f32,
    /// Collision layer index of the spawned body.
    pub layer: u8,
}

impl Default for ProjectileDesc {
    fn default() -> Self {
        Self {
            radius: 0.2,
            mass: 1.0,
            layer: 1,
        }
    }
}

pub trait PhysicsBackend {
    fn position(&self, body: BodyHandle) -> Option<Vec3>;
    fn rotation(&self, body: BodyHandle) -> Option<Quat>;
    fn linear_velocity(&self, body: BodyHandle) -> Option<Vec3>;
    fn angular_velocity(&self, body: BodyHandle) -> Option<Vec3>;
    fn mass(&self, body: BodyHandle) -> Option<f32>;
    /// Radius of the body's primary collider (capsule, ball or cylinder).
    fn collider_radius(&self, body: BodyHandle) -> Option<f32>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Vec3);
    fn apply_force(&mut self, body: BodyHandle, force: Vec3, mode: ForceMode);
    fn apply_torque(&mut self, body: BodyHandle, torque: Vec3);

    fn sphere_cast(&self, cast: &SphereCast) -> Option<SphereCastHit>;

    /// Creates a dynamic projectile body. `None` if the backend cannot spawn.
    fn spawn_projectile(
        &mut self,
        desc: &ProjectileDesc,
        position: Vec3,
        rotation: Quat,
    ) -> Option<BodyHandle>;
}
