use shared::{BodyHandle, GroundSensor};

use crate::components::{CameraRig, Facing, Gravity, HeightSpring, Movement, Shooting};
use crate::config::ControllerConfig;
use crate::input::InputSnapshot;

/// Animation the presentation layer should trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationCue {
    Idle,
    Walk,
    Struggle,
}

/// Every component of one character, as seen by the state handlers.
#[derive(Clone, Debug)]
pub struct Rig {
    pub body: BodyHandle,
    pub gravity: Gravity,
    pub ground: GroundSensor,
    pub height_spring: HeightSpring,
    pub movement: Movement,
    pub facing: Facing,
    pub shooting: Shooting,
    pub camera: CameraRig,
    pub(crate) cue: Option<AnimationCue>,
}

impl Rig {
    pub fn new(body: BodyHandle, config: &ControllerConfig) -> Self {
        Self {
            body,
            gravity: Gravity::new(body, &config.physics),
            ground: GroundSensor::new(body, config.ground_checker.clone()),
            height_spring: HeightSpring::new(body, config.height_spring.clone()),
            movement: Movement::new(body, config.movement.clone()),
            facing: Facing::new(
                config.movement.model_turn_rate,
                config.movement.shoot_facing_window,
            ),
            shooting: Shooting::new(body, config.shooting.clone()),
            camera: CameraRig::new(config.camera.clone()),
            cue: None,
        }
    }

    pub(crate) fn cue(&mut self, cue: AnimationCue) {
        self.cue = Some(cue);
    }
}

/// Per-call context handed to state handlers.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub input: &'a InputSnapshot,
    /// Logical time in seconds.
    pub now: f64,
    /// Step length of the loop that issued the call (fixed or frame).
    pub dt: f32,
}

impl<'a> Frame<'a> {
    pub fn new(input: &'a InputSnapshot, now: f64, dt: f32) -> Self {
        Self { input, now, dt }
    }
}
