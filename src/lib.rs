#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
//! An async cache which materialises audio assets onto local storage, so that a
//! playback engine can always be handed a local file path.
//!
//! Assets are named by a *logical identifier*: either a name relative to the
//! application's bundled resources (`"sfx/hit.wav"`), or an `http`/`https` URL.
//! The library offers:
//!  * Deterministic local paths for every identifier, beneath a configurable
//!  cache directory. Network assets live at `<cache_dir>/<host><path>`, and
//!  bundled assets at `<cache_dir>/<identifier>`.
//!  * At most one fetch per identifier: repeated loads are served from the index,
//!  and concurrent loads of the same miss share a single in-flight fetch.
//!  * Pluggable [sources of bytes] and [playback engines], with a reqwest-backed
//!  HTTP fetcher via the `"http"` feature.
//!
//! ## Example
//!
//! ```rust,no_run
//! use audiocache::{fetch::DirBundle, player::ChannelPlayers, AudioCache, Config};
//!
//! # async fn run() -> audiocache::error::CacheResult<()> {
//! let (players, _engine_rx) = ChannelPlayers::new();
//! let cache = AudioCache::from_config(
//!     Config::default().prefix("assets/audio/"),
//!     DirBundle::new("/opt/my-app"),
//!     players,
//! );
//!
//! // Reads `/opt/my-app/assets/audio/click.wav` once, then reuses the local copy.
//! let click = cache.load("click.wav").await?;
//! println!("click lives at {:?}", click.path());
//! let _player = cache.play("click.wav", 0.5).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [sources of bytes]: fetch::Fetch
//! [playback engines]: player::Player

#![warn(clippy::pedantic)]
#![allow(
    // Allowed as they are too pedantic
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::missing_errors_doc,
)]

mod cache;
mod config;
pub mod constants;
pub mod error;
pub mod fetch;
mod index;
pub mod materialize;
pub mod player;
pub mod source;
#[cfg(test)]
mod test_utils;

pub use crate::{cache::AudioCache, index::EntryState, materialize::LocalFile};
pub use config::Config;
