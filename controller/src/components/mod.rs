//! Force components. Each one owns its slice of the settings and acts on the
//! body through the [`PhysicsBackend`](shared::PhysicsBackend) it is handed.

pub mod camera;
pub mod facing;
pub mod gravity;
pub mod height_spring;
pub mod movement;
pub mod shooting;

pub use camera::CameraRig;
pub use facing::{Facing, ShootFacing};
pub use gravity::Gravity;
pub use height_spring::HeightSpring;
pub use movement::{Movement, input_direction};
pub use shooting::Shooting;
