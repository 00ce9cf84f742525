//! Rigid-body character controller.
//!
//! The character is an ordinary dynamic body. Every fixed step the active
//! state applies custom forces to it: controller gravity, a damped spring that
//! floats it at a ride height above the ground, an upright torque, camera
//! relative locomotion and a variable-height jump. The physics engine is
//! reached only through [`shared::PhysicsBackend`].

pub mod components;
pub mod config;
pub mod controller;
pub mod curve;
pub mod error;
pub mod input;
pub mod machine;
pub mod rig;
pub mod states;

pub use config::{
    CameraSettings, ControllerConfig, HeightSpringSettings, MovementSettings, PhysicsSettings,
    ShootingSettings,
};
pub use controller::CharacterController;
pub use curve::Curve;
pub use error::StateError;
pub use input::InputSnapshot;
pub use machine::StateMachine;
pub use rig::{AnimationCue, Frame, Rig};
pub use states::{CharacterState, StateHandlers};
