use std::collections::HashMap;

use shared::PhysicsBackend;

use crate::error::StateError;
use crate::rig::{Frame, Rig};
use crate::states::{CharacterState, StateHandlers};

/// Dispatches the three update loops to the active state's handlers.
///
/// Until the first successful [`change_state`](Self::change_state) no state is
/// active, every loop is a no-op and `current_state` is `None`.
#[derive(Debug)]
pub struct StateMachine {
    handlers: HashMap<CharacterState, StateHandlers>,
    current: CharacterState,
    active: bool,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            current: CharacterState::Idle,
            active: false,
        }
    }
}

impl StateMachine {
    /// Machine with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Machine with every built-in state registered.
    pub fn with_default_states() -> Self {
        let mut machine = Self::new();
        for state in CharacterState::ALL {
            machine.register(state, state.handlers());
        }
        machine
    }

    pub fn register(&mut self, state: CharacterState, handlers: StateHandlers) {
        if self.handlers.insert(state, handlers).is_some() {
            log::warn!("State {state} already registered, overwriting");
        }
    }

    pub fn is_registered(&self, state: CharacterState) -> bool {
        self.handlers.contains_key(&state)
    }

    #[inline]
    pub fn current_state(&self) -> Option<CharacterState> {
        self.active.then_some(self.current)
    }

    /// Whether any state has been entered yet.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Exits the current state and enters `target`. Requesting the active
    /// state again does nothing.
    pub fn change_state(
        &mut self,
        rig: &mut Rig,
        frame: &Frame<'_>,
        target: CharacterState,
    ) -> Result<(), StateError> {
        if self.active && self.current == target {
            return Ok(());
        }
        let Some(next) = self.handlers.get(&target).copied() else {
            log::error!("State {target} not registered in the state machine, cannot transition");
            return Err(StateError::Unregistered(target));
        };

        if let Some(prev) = self.active_handlers() {
            (prev.exit)(rig, frame);
        }
        self.current = target;
        self.active = true;
        (next.enter)(rig, frame);
        Ok(())
    }

    pub fn fixed_update(&self, rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
        if let Some(h) = self.active_handlers() {
            (h.fixed_tick)(rig, physics, frame);
        }
    }

    /// Frame tick, then the transition check.
    pub fn update(&mut self, rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
        let Some(h) = self.active_handlers() else {
            return;
        };
        (h.tick)(rig, physics, frame);
        if let Some(next) = (h.check_transition)(rig, physics, frame) {
            // Failures are logged by change_state.
            let _ = self.change_state(rig, frame, next);
        }
    }

    pub fn late_update(&self, rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
        if let Some(h) = self.active_handlers() {
            (h.late_tick)(rig, physics, frame);
        }
    }

    fn active_handlers(&self) -> Option<StateHandlers> {
        if !self.active {
            return None;
        }
        self.handlers.get(&self.current).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerConfig;
    use crate::input::InputSnapshot;
    use shared::Vec3;
    use shared::testing::MockPhysics;

    fn rig() -> Rig {
        let mut physics = MockPhysics::new();
        let body = physics.add_body(Vec3::zeros(), 1.0, 0.5);
        Rig::new(body, &ControllerConfig::default())
    }

    #[test]
    fn reports_no_state_before_first_transition() {
        let machine = StateMachine::with_default_states();
        assert_eq!(machine.current_state(), None);
        assert!(!machine.is_active());
    }

    #[test]
    fn first_change_to_default_state_still_enters() {
        let mut machine = StateMachine::with_default_states();
        let mut rig = rig();
        let input = InputSnapshot::default();
        let frame = Frame::new(&input, 0.0, 0.02);

        machine.change_state(&mut rig, &frame, CharacterState::Idle).unwrap();
        assert!(machine.is_active());
        assert_eq!(rig.cue, Some(crate::rig::AnimationCue::Idle));
    }

    #[test]
    fn unregistered_target_is_rejected_and_state_kept() {
        let mut machine = StateMachine::new();
        machine.register(CharacterState::Idle, CharacterState::Idle.handlers());
        let mut rig = rig();
        let input = InputSnapshot::default();
        let frame = Frame::new(&input, 0.0, 0.02);

        machine.change_state(&mut rig, &frame, CharacterState::Idle).unwrap();
        let err = machine
            .change_state(&mut rig, &frame, CharacterState::Stunned)
            .unwrap_err();
        assert_eq!(err, StateError::Unregistered(CharacterState::Stunned));
        assert_eq!(machine.current_state(), Some(CharacterState::Idle));
    }

    #[test]
    fn same_state_request_does_not_re_enter() {
        let mut machine = StateMachine::with_default_states();
        let mut rig = rig();
        let input = InputSnapshot::default();
        let frame = Frame::new(&input, 0.0, 0.02);

        machine.change_state(&mut rig, &frame, CharacterState::Moving).unwrap();
        rig.cue = None;
        machine.change_state(&mut rig, &frame, CharacterState::Moving).unwrap();
        assert_eq!(rig.cue, None);
    }

    #[test]
    fn leaving_lobby_resets_camera_snap() {
        let mut machine = StateMachine::with_default_states();
        let mut rig = rig();
        let input = InputSnapshot::default();
        let frame = Frame::new(&input, 0.0, 0.02);

        machine.change_state(&mut rig, &frame, CharacterState::Lobby).unwrap();
        rig.camera.position_pivot(Vec3::new(1.0, 0.0, 0.0), 0.02);
        machine.change_state(&mut rig, &frame, CharacterState::Idle).unwrap();

        // The next pivot update snaps instead of smoothing.
        rig.camera.position_pivot(Vec3::new(9.0, 0.0, 0.0), 0.02);
        assert_eq!(rig.camera.pivot_position(), Vec3::new(9.0, 0.0, 0.0));
    }
}
