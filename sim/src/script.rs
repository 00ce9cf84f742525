//! Scripted input for the headless run.

use controller::InputSnapshot;
use shared::Vec2;

/// Seconds at which the player gets stunned, and for how long.
pub const STUN_AT: f64 = 5.0;
pub const STUN_FOR: f32 = 1.0;

/// Input held at time `t`.
pub fn input_at(t: f64) -> InputSnapshot {
    let mut input = InputSnapshot::default();
    match t {
        t if t < 0.5 => input.start_pressed = true,
        t if t < 2.5 => input.move_input = Vec2::new(0.0, 1.0),
        t if t < 2.8 => {
            input.move_input = Vec2::new(0.0, 1.0);
            input.press_jump();
        }
        t if t < 4.0 => {
            input.move_input = Vec2::new(0.6, 0.6);
            input.release_jump();
            input.look = Vec2::new(0.5, 0.0);
        }
        t if t < 4.5 => {
            input.release_jump();
            input.shoot_pressed = true;
        }
        _ => input.release_jump(),
    }
    input
}
