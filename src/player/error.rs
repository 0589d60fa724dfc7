use flume::RecvError;
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Errors associated with control of a player.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum PlayerError {
    /// The operation failed because the player has been closed, or
    /// the engine driving it has shut down.
    Finished,
    /// The engine dropped a request without answering it.
    Dropped,
    /// The engine could not start playback.
    Engine(String),
}

impl Display for PlayerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "failed to operate on player: ")?;
        match self {
            PlayerError::Finished => write!(f, "player closed"),
            PlayerError::Dropped => write!(f, "request was dropped by the engine"),
            PlayerError::Engine(why) => write!(f, "engine error [{why}]"),
        }
    }
}

impl Error for PlayerError {}

impl From<RecvError> for PlayerError {
    fn from(_: RecvError) -> Self {
        PlayerError::Dropped
    }
}

/// Alias for most calls to a [`Player`].
///
/// [`Player`]: super::Player
pub type PlayerResult<T> = Result<T, PlayerError>;
