use thiserror::Error;

use crate::states::CharacterState;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("state {0} is not registered in the state machine")]
    Unregistered(CharacterState),
}
