pub mod clock;
pub mod constants;
pub mod error;
pub mod ground;
pub mod math;
pub mod physics;
pub mod rapier_world;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::{Clock, ManualClock, SystemClock, TimerId, TimerQueue};
pub use constants::{
    DEFAULT_NORMAL_RECORD_INTERVAL, DEFAULT_PLAYER_RECORD_INTERVAL, DIST_EPS,
    FALLING_VELOCITY_THRESHOLD, GRAVITY_MPS2, MAX_PLAYBACK_SPEED, MIN_PLAYBACK_SPEED,
    MOVE_INPUT_DEADZONE, MOVE_INTENT_THRESHOLD, TIME_EPS,
};
pub use error::ConfigError;
pub use ground::{GroundCheckSettings, GroundReading, GroundSensor};
pub use math::{Iso, Quat, Vec2, Vec3};
pub use physics::{
    BodyHandle, ForceMode, LayerMask, PhysicsBackend, ProjectileDesc, SphereCast, SphereCastHit,
};
pub use rapier_world::{ColliderShapeDef, DynamicBodyDef, RapierPhysicsWorld, WorldStaticDef};
