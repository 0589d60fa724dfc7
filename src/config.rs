use crate::{constants::DEFAULT_PREFIX, player::Player};

use derivative::Derivative;
use std::{path::PathBuf, sync::Arc};

/// Configuration for an [`AudioCache`].
///
/// [`AudioCache`]: crate::AudioCache
#[derive(Clone, Derivative)]
#[derivative(Debug)]
#[non_exhaustive]
pub struct Config {
    /// Prefix prepended to bundle-relative identifiers when they are read
    /// from bundled resources.
    ///
    /// The prefix is *not* part of an asset's local cache path.
    ///
    /// Defaults to `"assets/"`.
    ///
    /// Changes to this field on a live cache apply to subsequent misses only;
    /// resident entries are left untouched.
    pub prefix: String,

    /// Directory under which all assets are materialised.
    ///
    /// Network assets are written to `<cache_dir>/<host><path>`, and bundled
    /// assets to `<cache_dir>/<identifier>`.
    ///
    /// Defaults to [`std::env::temp_dir`].
    pub cache_dir: PathBuf,

    #[derivative(Debug = "ignore")]
    /// A single player shared by every `play`/`loop` call on the cache.
    ///
    /// If set, only one sound can be heard at a time: each new request
    /// restarts this player. If `None`, every call receives a fresh player
    /// from the cache's [`PlayerFactory`], and sounds may overlap.
    ///
    /// Defaults to `None`.
    ///
    /// [`PlayerFactory`]: crate::player::PlayerFactory
    pub fixed_player: Option<Arc<dyn Player>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            cache_dir: std::env::temp_dir(),
            fixed_player: None,
        }
    }
}

impl Config {
    /// Sets this `Config`'s bundled resource prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets this `Config`'s root directory for materialised assets.
    #[must_use]
    pub fn cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Sets this `Config`'s shared player.
    #[must_use]
    pub fn fixed_player(mut self, fixed_player: Arc<dyn Player>) -> Self {
        self.fixed_player = Some(fixed_player);
        self
    }
}
