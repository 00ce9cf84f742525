use shared::Vec2;

/// Latest input state, pushed by whatever reads the devices.
///
/// Button fields are levels, not edges: `jump_pressed` stays set while jump is
/// held and `jump_released` stays set from the release until the next press.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    pub move_input: Vec2,
    pub look: Vec2,
    pub jump_pressed: bool,
    pub jump_released: bool,
    pub shoot_pressed: bool,
    /// Leaves the lobby.
    pub start_pressed: bool,
}

impl InputSnapshot {
    pub fn press_jump(&mut self) {
        self.jump_pressed = true;
        self.jump_released = false;
    }

    pub fn release_jump(&mut self) {
        self.jump_pressed = false;
        self.jump_released = true;
    }

    #[inline]
    pub fn move_magnitude(&self) -> f32 {
        self.move_input.norm()
    }
}
