use super::*;
use flume::Sender;
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::PathBuf,
};

/// A request from a [`PlayerHandle`] to modify or act upon its player.
///
/// [`PlayerHandle`]: PlayerHandle
#[non_exhaustive]
pub enum PlayerCommand {
    /// Start playing a file from the beginning, replacing any current sound.
    Play(PlayRequest),
    /// Pause playback.
    Pause,
    /// Resume paused playback.
    Resume,
    /// Stop playback.
    Stop,
    /// Set the player's volume.
    Volume(f32),
    /// Change the loop count/strategy of this player.
    Loop(LoopState),
}

impl Debug for PlayerCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "PlayerCommand::{}",
            match self {
                Self::Play(req) => format!("Play({:?}, {})", req.path, req.volume),
                Self::Pause => "Pause".to_string(),
                Self::Resume => "Resume".to_string(),
                Self::Stop => "Stop".to_string(),
                Self::Volume(vol) => format!("Volume({vol})"),
                Self::Loop(loops) => format!("Loop({loops:?})"),
            }
        )
    }
}

/// Details of a [`PlayerCommand::Play`] request.
#[derive(Clone, Debug)]
pub struct PlayRequest {
    /// File to be played.
    pub path: PathBuf,
    /// Playback volume.
    pub volume: f32,
    /// Whether `path` refers to local storage.
    pub is_local: bool,
    /// The engine must answer here once playback has been started, or has failed to start.
    pub callback: Sender<PlayerResult<()>>,
}

impl PlayRequest {
    /// Reports the outcome of this request to the waiting handle.
    pub fn respond(&self, result: PlayerResult<()>) {
        // The requester may have stopped waiting.
        drop(self.callback.send(result));
    }
}
