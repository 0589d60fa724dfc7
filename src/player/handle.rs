use super::*;
use flume::Sender;
use std::path::Path;

#[derive(Clone, Debug)]
/// Handle for safe control of a player from other threads, outside
/// of the audio engine's context.
///
/// Almost all method calls here are fallible; in most cases, this will be because
/// the engine has discarded the underlying player.
pub struct PlayerHandle {
    inner: Arc<InnerHandle>,
}

#[derive(Debug)]
struct InnerHandle {
    command_channel: Sender<PlayerCommand>,
    uuid: Uuid,
}

impl PlayerHandle {
    /// Creates a new handle, using the given command sink.
    #[must_use]
    pub fn new(command_channel: Sender<PlayerCommand>, uuid: Uuid) -> Self {
        let inner = Arc::new(InnerHandle {
            command_channel,
            uuid,
        });

        Self { inner }
    }

    /// Pauses playback.
    pub fn pause(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::Pause)
    }

    /// Resumes paused playback.
    pub fn resume(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::Resume)
    }

    /// Stops playback.
    pub fn stop(&self) -> PlayerResult<()> {
        self.send(PlayerCommand::Stop)
    }

    /// Sets the volume of the current and any later sound.
    pub fn set_volume(&self, volume: f32) -> PlayerResult<()> {
        self.send(PlayerCommand::Volume(volume))
    }

    /// Set the player to loop a set number of times.
    pub fn loop_for(&self, count: usize) -> PlayerResult<()> {
        self.send(PlayerCommand::Loop(LoopState::Finite(count)))
    }

    /// Returns this handle's (and player's) unique identifier.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.inner.uuid
    }

    #[inline]
    /// Send a raw command to the player.
    pub fn send(&self, cmd: PlayerCommand) -> PlayerResult<()> {
        // As the send channels are unbounded, we can be reasonably certain
        // that send failure == cancellation.
        self.inner
            .command_channel
            .send(cmd)
            .map_err(|_e| PlayerError::Finished)
    }
}

#[async_trait]
impl Player for PlayerHandle {
    async fn play(&self, path: &Path, volume: f32, is_local: bool) -> PlayerResult<()> {
        let (callback, rx) = flume::bounded(1);

        self.send(PlayerCommand::Play(PlayRequest {
            path: path.to_path_buf(),
            volume,
            is_local,
            callback,
        }))?;

        rx.recv_async().await?
    }

    fn set_loop_mode(&self, looping: bool) -> PlayerResult<()> {
        self.send(PlayerCommand::Loop(looping.into()))
    }
}
