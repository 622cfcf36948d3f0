use thiserror::Error;

use crate::auth::AuthError;
use crate::clipboard::ClipboardError;
use crate::gate::RevealState;

#[derive(Debug, Error)]
pub enum RevealError {
    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("A password check is already in progress")]
    VerificationInProgress,

    #[error("Operation not valid in state {0:?}")]
    InvalidState(RevealState),

    #[error("Reveal session is closed")]
    SessionClosed,

    #[error("Recovery phrase has not been revealed")]
    NotRevealed,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

pub type RevealResult<T> = Result<T, RevealError>;
