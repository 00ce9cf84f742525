/*!
Character states and their handler tables.

Each state is a row of plain function pointers. States that extend the shared
behavior call the `base_*` handlers explicitly before their own work, so the
per-tick force order is visible in one place:

| state    | fixed tick                                                        |
|----------|-------------------------------------------------------------------|
| Lobby    | gravity, ground check, height spring, facing (no shooting)        |
| Idle     | base, friction, height spring                                     |
| Moving   | base, height spring, jump, locomotion                             |
| Jumping  | base, jump reset, height spring (only before the jump), jump, locomotion |
| Stunned  | gravity                                                           |

Base fixed tick: gravity, ground check, upright torque, facing. Base frame tick:
shooting. Base late tick: camera pivot and look input.
*/

use std::fmt;

use shared::{MOVE_INPUT_DEADZONE, MOVE_INTENT_THRESHOLD, PhysicsBackend};

use crate::rig::{AnimationCue, Frame, Rig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacterState {
    Lobby,
    Idle,
    Moving,
    Jumping,
    Stunned,
}

impl CharacterState {
    pub const ALL: [Self; 5] = [
        Self::Lobby,
        Self::Idle,
        Self::Moving,
        Self::Jumping,
        Self::Stunned,
    ];

    /// Built-in handler table for this state.
    pub fn handlers(self) -> StateHandlers {
        match self {
            Self::Lobby => LOBBY,
            Self::Idle => IDLE,
            Self::Moving => MOVING,
            Self::Jumping => JUMPING,
            Self::Stunned => STUNNED,
        }
    }
}

impl fmt::Display for CharacterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub type LifecycleFn = fn(&mut Rig, &Frame<'_>);
pub type TickFn = fn(&mut Rig, &mut dyn PhysicsBackend, &Frame<'_>);
pub type TransitionFn = fn(&Rig, &dyn PhysicsBackend, &Frame<'_>) -> Option<CharacterState>;

#[derive(Clone, Copy)]
pub struct StateHandlers {
    pub enter: LifecycleFn,
    pub exit: LifecycleFn,
    pub fixed_tick: TickFn,
    pub tick: TickFn,
    pub late_tick: TickFn,
    pub check_transition: TransitionFn,
}

impl fmt::Debug for StateHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandlers").finish_non_exhaustive()
    }
}

const LOBBY: StateHandlers = StateHandlers {
    enter: lobby_enter,
    exit: lobby_exit,
    fixed_tick: lobby_fixed,
    tick: noop_tick,
    late_tick: noop_tick,
    check_transition: lobby_transition,
};

const IDLE: StateHandlers = StateHandlers {
    enter: idle_enter,
    exit: noop_lifecycle,
    fixed_tick: idle_fixed,
    tick: base_tick,
    late_tick: base_late,
    check_transition: idle_transition,
};

const MOVING: StateHandlers = StateHandlers {
    enter: moving_enter,
    exit: noop_lifecycle,
    fixed_tick: moving_fixed,
    tick: base_tick,
    late_tick: base_late,
    check_transition: moving_transition,
};

const JUMPING: StateHandlers = StateHandlers {
    enter: jumping_enter,
    exit: noop_lifecycle,
    fixed_tick: jumping_fixed,
    tick: base_tick,
    late_tick: base_late,
    check_transition: jumping_transition,
};

const STUNNED: StateHandlers = StateHandlers {
    enter: stunned_enter,
    exit: stunned_exit,
    fixed_tick: stunned_fixed,
    tick: noop_tick,
    late_tick: base_late,
    check_transition: no_transition,
};

fn noop_lifecycle(_: &mut Rig, _: &Frame<'_>) {}

fn noop_tick(_: &mut Rig, _: &mut dyn PhysicsBackend, _: &Frame<'_>) {}

fn no_transition(_: &Rig, _: &dyn PhysicsBackend, _: &Frame<'_>) -> Option<CharacterState> {
    None
}

fn face(rig: &mut Rig, frame: &Frame<'_>, shoot_pressed: bool) {
    rig.facing.update(
        &frame.input.move_input,
        shoot_pressed,
        &rig.camera,
        frame.now,
        frame.dt,
    );
}

pub fn base_fixed(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    rig.gravity.apply(physics);
    rig.ground.check(physics);
    rig.height_spring.apply_upright_torque(physics);
    face(rig, frame, frame.input.shoot_pressed);
}

pub fn base_tick(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    let forward = rig.camera.forward();
    rig.shooting
        .handle_shooting(physics, frame.input.shoot_pressed, &forward, frame.now);
}

pub fn base_late(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    if let Some(position) = physics.position(rig.body) {
        rig.camera.position_pivot(position, frame.dt);
    }
    rig.camera.handle_look_input(&frame.input.look);
}

fn height_spring(rig: &Rig, physics: &mut dyn PhysicsBackend) {
    rig.height_spring.apply_spring(physics, &rig.ground.reading());
}

fn jump(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    let grounded = rig.ground.is_grounded();
    rig.movement.handle_jumping(
        physics,
        frame.input.jump_pressed,
        frame.input.jump_released,
        grounded,
        frame.dt,
    );
}

fn locomotion(rig: &Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    rig.movement.handle_movement(
        physics,
        &frame.input.move_input,
        &rig.camera.yaw_rotation(),
        frame.dt,
    );
}

// Lobby

fn lobby_enter(rig: &mut Rig, _: &Frame<'_>) {
    log::info!("Entered lobby state");
    rig.cue(AnimationCue::Idle);
}

fn lobby_exit(rig: &mut Rig, _: &Frame<'_>) {
    rig.camera.reset_position_initialization();
}

fn lobby_fixed(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    rig.gravity.apply(physics);
    rig.ground.check(physics);
    height_spring(rig, physics);
    face(rig, frame, false);
}

fn lobby_transition(_: &Rig, _: &dyn PhysicsBackend, frame: &Frame<'_>) -> Option<CharacterState> {
    frame.input.start_pressed.then_some(CharacterState::Idle)
}

// Idle

fn idle_enter(rig: &mut Rig, _: &Frame<'_>) {
    log::info!("Entered idle state");
    rig.cue(AnimationCue::Idle);
}

fn idle_fixed(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    base_fixed(rig, physics, frame);
    rig.movement.apply_friction(physics);
    height_spring(rig, physics);
}

fn idle_transition(_: &Rig, _: &dyn PhysicsBackend, frame: &Frame<'_>) -> Option<CharacterState> {
    if frame.input.move_magnitude() > MOVE_INPUT_DEADZONE {
        Some(CharacterState::Moving)
    } else if frame.input.jump_pressed {
        Some(CharacterState::Jumping)
    } else {
        None
    }
}

// Moving

fn moving_enter(rig: &mut Rig, _: &Frame<'_>) {
    log::info!("Entered moving state");
    rig.cue(AnimationCue::Walk);
}

fn moving_fixed(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    base_fixed(rig, physics, frame);
    height_spring(rig, physics);
    jump(rig, physics, frame);
    locomotion(rig, physics, frame);
}

fn moving_transition(_: &Rig, _: &dyn PhysicsBackend, frame: &Frame<'_>) -> Option<CharacterState> {
    if frame.input.move_magnitude() < MOVE_INPUT_DEADZONE {
        Some(CharacterState::Idle)
    } else if frame.input.jump_pressed {
        Some(CharacterState::Jumping)
    } else {
        None
    }
}

// Jumping

fn jumping_enter(_: &mut Rig, _: &Frame<'_>) {
    log::info!("Entered jumping state");
}

fn jumping_fixed(rig: &mut Rig, physics: &mut dyn PhysicsBackend, frame: &Frame<'_>) {
    base_fixed(rig, physics, frame);
    let grounded = rig.ground.is_grounded();
    rig.movement.check_jump_reset(physics, grounded);
    if !rig.movement.is_jumping() && !frame.input.jump_released {
        height_spring(rig, physics);
    }
    jump(rig, physics, frame);
    locomotion(rig, physics, frame);
}

/// Leaves only once the jump has fully resolved and the button is up. Holding
/// jump after landing keeps the character in Jumping.
fn jumping_transition(
    rig: &Rig,
    physics: &dyn PhysicsBackend,
    frame: &Frame<'_>,
) -> Option<CharacterState> {
    let landed = rig.ground.is_grounded()
        && !rig.movement.is_jumping()
        && !rig.movement.is_jump_force_active()
        && rig.movement.is_falling(physics)
        && frame.input.jump_released;
    if !landed {
        return None;
    }
    if frame.input.move_magnitude() > MOVE_INTENT_THRESHOLD {
        Some(CharacterState::Moving)
    } else {
        Some(CharacterState::Idle)
    }
}

// Stunned

fn stunned_enter(rig: &mut Rig, _: &Frame<'_>) {
    log::info!("Entered stunned state");
    rig.cue(AnimationCue::Struggle);
}

fn stunned_exit(rig: &mut Rig, frame: &Frame<'_>) {
    face(rig, frame, frame.input.shoot_pressed);
}

fn stunned_fixed(rig: &mut Rig, physics: &mut dyn PhysicsBackend, _: &Frame<'_>) {
    rig.gravity.apply(physics);
}
