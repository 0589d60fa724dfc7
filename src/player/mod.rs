//! Hand-off of cached files to a playback engine.
//!
//! The cache never decodes or mixes audio itself. Instead, once an asset is
//! resident, its local path is passed to a [`Player`], obtained either from a
//! shared [fixed player] or freshly from a [`PlayerFactory`] on each call.
//!
//! Engines which are driven from another task or thread can use
//! [`ChannelPlayers`]: every created [`PlayerHandle`] remotely sends
//! [`PlayerCommand`]s to the engine, which receives a [`PlayerContext`] for
//! each new player. This prevents cache users from being able to lock or stall
//! the audio engine.
//!
//! [fixed player]: crate::Config::fixed_player

mod command;
mod error;
mod handle;
mod looping;

pub use self::{command::*, error::*, handle::*, looping::*};

use async_trait::async_trait;
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use uuid::Uuid;

/// A playback engine instance able to play local files.
#[async_trait]
pub trait Player: Send + Sync {
    /// Starts playing the file at `path` with the given `volume`.
    ///
    /// This resolves once playback has been *requested*, not once it is audible.
    /// `is_local` is always `true` for paths handed out by the cache.
    async fn play(&self, path: &Path, volume: f32, is_local: bool) -> PlayerResult<()>;

    /// Sets whether playback restarts from the beginning on completion.
    fn set_loop_mode(&self, looping: bool) -> PlayerResult<()>;
}

/// Creates [`Player`]s on demand.
pub trait PlayerFactory: Send + Sync {
    /// Creates a new, independent player.
    ///
    /// The caller does not track or close the returned player.
    fn create(&self) -> Arc<dyn Player>;

    /// Enables or disables the engine's own logging.
    ///
    /// Defaults to a no-op.
    fn set_logging_enabled(&self, _enabled: bool) {}
}

/// Live state of one player, to be driven by the audio engine.
#[derive(Debug)]
pub struct PlayerContext {
    /// Handle given out to the player's users.
    pub handle: PlayerHandle,
    /// Commands sent through [`handle`] and its clones.
    ///
    /// [`handle`]: PlayerContext::handle
    pub receiver: flume::Receiver<PlayerCommand>,
    logging: Arc<AtomicBool>,
}

impl PlayerContext {
    /// Returns whether the engine should currently emit logs.
    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.logging.load(Ordering::Relaxed)
    }
}

/// A [`PlayerFactory`] whose players are driven over channels.
///
/// Each call to [`create`] sends a [`PlayerContext`] to the receiver returned
/// by [`ChannelPlayers::new`].
///
/// [`create`]: PlayerFactory::create
#[derive(Clone, Debug)]
pub struct ChannelPlayers {
    contexts: flume::Sender<PlayerContext>,
    logging: Arc<AtomicBool>,
}

impl ChannelPlayers {
    /// Creates a factory, and the receiver the engine should listen on for new players.
    #[must_use]
    pub fn new() -> (Self, flume::Receiver<PlayerContext>) {
        let (contexts, rx) = flume::unbounded();
        let factory = Self {
            contexts,
            logging: Arc::new(AtomicBool::new(true)),
        };

        (factory, rx)
    }

    /// Creates a new handle, and announces its context to the engine.
    #[must_use]
    pub fn create_handle(&self) -> PlayerHandle {
        let (tx, receiver) = flume::unbounded();
        let handle = PlayerHandle::new(tx, Uuid::new_v4());

        // If the engine has gone away, every command on this handle
        // will report `PlayerError::Finished`.
        drop(self.contexts.send(PlayerContext {
            handle: handle.clone(),
            receiver,
            logging: Arc::clone(&self.logging),
        }));

        handle
    }
}

impl PlayerFactory for ChannelPlayers {
    fn create(&self) -> Arc<dyn Player> {
        Arc::new(self.create_handle())
    }

    fn set_logging_enabled(&self, enabled: bool) {
        self.logging.store(enabled, Ordering::Relaxed);
    }
}
