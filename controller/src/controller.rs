use shared::{BodyHandle, GroundReading, PhysicsBackend, Quat, TimerQueue, Vec3};

use crate::config::ControllerConfig;
use crate::error::StateError;
use crate::input::InputSnapshot;
use crate::machine::StateMachine;
use crate::rig::{AnimationCue, Frame, Rig};
use crate::states::CharacterState;

/// Pending end of a stun.
#[derive(Clone, Copy, Debug)]
struct StunExpiry;

/// A rigid-body character: components, state machine and stun timers.
///
/// Drive it from three loops, all with the same logical clock:
/// - [`fixed_update`](Self::fixed_update) once per physics step, before the
///   backend integrates;
/// - [`update`](Self::update) once per frame;
/// - [`late_update`](Self::late_update) once per frame, after `update`.
#[derive(Debug)]
pub struct CharacterController {
    rig: Rig,
    machine: StateMachine,
    input: InputSnapshot,
    stun_timers: TimerQueue<StunExpiry>,
}

impl CharacterController {
    /// Builds a controller for `body` and enters the lobby.
    pub fn new(body: BodyHandle, config: &ControllerConfig) -> Self {
        Self::with_machine(body, config, StateMachine::with_default_states(), CharacterState::Lobby)
    }

    /// Builds a controller around a custom state registry and enters `initial`.
    pub fn with_machine(
        body: BodyHandle,
        config: &ControllerConfig,
        machine: StateMachine,
        initial: CharacterState,
    ) -> Self {
        let mut controller = Self {
            rig: Rig::new(body, config),
            machine,
            input: InputSnapshot::default(),
            stun_timers: TimerQueue::new(),
        };
        if controller.change_state(initial, 0.0).is_err() {
            log::warn!("Controller starts without an active state");
        }
        controller
    }

    pub fn set_input(&mut self, input: InputSnapshot) {
        self.input = input;
    }

    pub fn input(&self) -> &InputSnapshot {
        &self.input
    }

    pub fn fixed_update(&mut self, physics: &mut dyn PhysicsBackend, now: f64, dt: f32) {
        let frame = Frame::new(&self.input, now, dt);
        self.machine.fixed_update(&mut self.rig, physics, &frame);
    }

    /// Fires due stun timers, then runs the frame tick and transition check.
    pub fn update(&mut self, physics: &mut dyn PhysicsBackend, now: f64, dt: f32) {
        self.advance_timers(now);
        let frame = Frame::new(&self.input, now, dt);
        self.machine.update(&mut self.rig, physics, &frame);
    }

    pub fn late_update(&mut self, physics: &mut dyn PhysicsBackend, now: f64, dt: f32) {
        let frame = Frame::new(&self.input, now, dt);
        self.machine.late_update(&mut self.rig, physics, &frame);
    }

    pub fn change_state(&mut self, target: CharacterState, now: f64) -> Result<(), StateError> {
        let frame = Frame::new(&self.input, now, 0.0);
        self.machine.change_state(&mut self.rig, &frame, target)
    }

    /// Forces the character into `Stunned` for `duration` seconds. When the
    /// timer fires the character returns to `Idle`, unless something else has
    /// already moved it out of `Stunned`.
    pub fn stun(&mut self, duration: f32, now: f64) {
        if self.change_state(CharacterState::Stunned, now).is_err() {
            return;
        }
        self.stun_timers.schedule(now + duration.max(0.0) as f64, StunExpiry);
    }

    /// Fires every stun timer due at `now`. Called by [`update`](Self::update).
    pub fn advance_timers(&mut self, now: f64) {
        for StunExpiry in self.stun_timers.drain_due(now) {
            if self.machine.current_state() == Some(CharacterState::Stunned) {
                let _ = self.change_state(CharacterState::Idle, now);
            }
        }
    }

    /// Active state; `None` if no state could be entered yet.
    #[inline]
    pub fn state(&self) -> Option<CharacterState> {
        self.machine.current_state()
    }

    pub fn body(&self) -> BodyHandle {
        self.rig.body
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn ground_reading(&self) -> GroundReading {
        self.rig.ground.reading()
    }

    pub fn last_ground_hit(&self) -> Option<Vec3> {
        self.rig.ground.last_hit_point()
    }

    pub fn is_jumping(&self) -> bool {
        self.rig.movement.is_jumping()
    }

    pub fn is_jump_force_active(&self) -> bool {
        self.rig.movement.is_jump_force_active()
    }

    pub fn model_rotation(&self) -> Quat {
        self.rig.facing.model_rotation()
    }

    /// Camera position target and look target.
    pub fn camera_pose(&self) -> (Vec3, Vec3) {
        (self.rig.camera.position_target(), self.rig.camera.look_target())
    }

    pub fn camera_forward(&self) -> Vec3 {
        self.rig.camera.forward()
    }

    pub fn is_gravity_enabled(&self) -> bool {
        self.rig.gravity.is_enabled()
    }

    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.rig.gravity.set_enabled(enabled);
    }

    pub fn pending_stun_timers(&self) -> usize {
        self.stun_timers.len()
    }

    /// Animation requested by the most recent state entry, if not yet taken.
    pub fn take_animation_cue(&mut self) -> Option<AnimationCue> {
        self.rig.cue.take()
    }
}
