#[cfg(feature = "http")]
use crate::fetch::HttpFetcher;
use crate::{
    error::{CacheError, CacheResult},
    fetch::{Bundle, BundleFetcher, Fetch},
    index::{CacheIndex, EntryState, LoadFuture},
    materialize::{materialize, LocalFile},
    player::{Player, PlayerFactory},
    source::{resolve, Resolved},
    Config,
};
use derivative::Derivative;
use futures::{future::join_all, FutureExt};
use parking_lot::RwLock as PRwLock;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tracing::{debug, instrument, warn};
use tracing_futures::Instrument;

/// A cache which materialises bundled and remote audio assets onto local storage.
///
/// Each identifier is fetched at most once per cache (until it is [cleared]),
/// and concurrent requests for the same identifier share a single fetch.
/// Local files are never deleted by the cache.
///
/// Independent caches may coexist: each owns its own index.
///
/// [cleared]: AudioCache::clear
#[derive(Derivative)]
#[derivative(Debug)]
pub struct AudioCache {
    config: PRwLock<Config>,
    #[derivative(Debug = "ignore")]
    index: CacheIndex,
    #[derivative(Debug = "ignore")]
    bundle: Arc<dyn Fetch>,
    #[derivative(Debug = "ignore")]
    network: Option<Arc<dyn Fetch>>,
    #[derivative(Debug = "ignore")]
    players: Arc<dyn PlayerFactory>,
}

impl AudioCache {
    /// Create a new cache reading bundled assets from `bundle`, with
    /// default configuration.
    #[must_use]
    pub fn new<B, P>(bundle: B, players: P) -> Self
    where
        B: Bundle + 'static,
        P: PlayerFactory + 'static,
    {
        Self::from_config(Config::default(), bundle, players)
    }

    /// Create a new cache reading bundled assets from `bundle`, using the
    /// given configuration.
    ///
    /// With the `"http"` feature, network identifiers are fetched with a
    /// default [`HttpFetcher`]. Otherwise, they fail with [`CacheError::Unsupported`].
    ///
    /// [`HttpFetcher`]: crate::fetch::HttpFetcher
    #[must_use]
    pub fn from_config<B, P>(config: Config, bundle: B, players: P) -> Self
    where
        B: Bundle + 'static,
        P: PlayerFactory + 'static,
    {
        Self::from_parts(
            config,
            Arc::new(BundleFetcher::new(bundle)),
            default_network(),
            Arc::new(players),
        )
    }

    /// Create a new cache from explicit fetchers for each kind of source.
    #[must_use]
    pub fn from_parts(
        config: Config,
        bundle: Arc<dyn Fetch>,
        network: Option<Arc<dyn Fetch>>,
        players: Arc<dyn PlayerFactory>,
    ) -> Self {
        Self {
            config: PRwLock::new(config),
            index: CacheIndex::new(),
            bundle,
            network,
            players,
        }
    }

    /// Ensures the asset named by `id` is present on local storage, returning its file.
    ///
    /// Resident identifiers are served without fetching. Otherwise, the asset is
    /// fetched from its source and written beneath the cache directory; if another
    /// call is already doing so for `id`, this call waits on that result instead.
    ///
    /// On failure, `id` is left absent so that a later call retries in full.
    #[instrument(skip(self))]
    pub async fn load(&self, id: &str) -> CacheResult<LocalFile> {
        self.index.get_or_load(id, || self.make_load(id)).await
    }

    fn make_load(&self, id: &str) -> LoadFuture {
        let resolved = {
            let config = self.config.read();
            resolve(id, &config.prefix, &config.cache_dir)
        };

        let fetcher = match &resolved {
            Ok(r) if r.source.is_network() => self.network.clone(),
            _ => Some(Arc::clone(&self.bundle)),
        };

        async move {
            let Resolved { source, local_path } = resolved?;
            let fetcher = fetcher.ok_or(CacheError::Unsupported)?;

            debug!("Cache miss: fetching {} into {:?}.", source, local_path);

            let bytes = fetcher.fetch(&source).await?;
            materialize(&local_path, &bytes).await
        }
        .boxed()
    }

    /// Loads every identifier in `ids` concurrently, returning files in the same order.
    ///
    /// If any load fails, the first error (in input order) is returned once all
    /// loads have finished, and no partial results are reported. Entries which this
    /// call created are then forgotten again, unless another request for the same
    /// identifier arrived in the meantime.
    #[instrument(skip_all)]
    pub async fn load_all<I, S>(&self, ids: I) -> CacheResult<Vec<LocalFile>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<S> = ids.into_iter().collect();

        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(ids.len());
        let mut unique: Vec<&str> = Vec::with_capacity(ids.len());
        let positions: Vec<usize> = ids
            .iter()
            .map(|id| {
                let id = id.as_ref();
                *seen.entry(id).or_insert_with(|| {
                    unique.push(id);
                    unique.len() - 1
                })
            })
            .collect();

        let attempts = join_all(unique.iter().map(|&id| {
            self.index
                .get_or_load_provisional(id, || self.make_load(id))
        }))
        .await;

        let (started, results): (Vec<_>, Vec<_>) = attempts.into_iter().unzip();

        let files = positions
            .iter()
            .map(|&pos| results[pos].clone())
            .collect::<CacheResult<Vec<_>>>();

        if files.is_err() {
            for (id, generation) in unique.iter().zip(started) {
                if let Some(generation) = generation {
                    if self.index.discard(id, generation) {
                        debug!("Forgot {:?} after failed batch load.", id);
                    }
                }
            }
        }

        files
    }

    /// Forgets the local file for `id`, returning whether an entry was present.
    ///
    /// The file itself is left on disk. A load in flight for `id` still completes
    /// for its callers, but is not recorded.
    pub fn clear(&self, id: &str) -> bool {
        self.index.remove(id)
    }

    /// Forgets all local files. No files are deleted.
    pub fn clear_cache(&self) {
        self.index.clear();
    }

    /// Returns the lifecycle state of `id`.
    #[must_use]
    pub fn state(&self, id: &str) -> EntryState {
        self.index.state(id)
    }

    /// Returns whether a local file is recorded for `id`.
    #[must_use]
    pub fn is_cached(&self, id: &str) -> bool {
        self.state(id) == EntryState::Resident
    }

    /// Returns every resident identifier alongside its local file, in no particular order.
    #[must_use]
    pub fn loaded_files(&self) -> Vec<(String, LocalFile)> {
        self.index.resident()
    }

    /// Loads `id`, returning the absolute local path of its file.
    pub async fn absolute_path(&self, id: &str) -> CacheResult<PathBuf> {
        self.load(id).await.map(LocalFile::into_path)
    }

    /// Loads `id`, and plays it at `volume` on the fixed player (or a fresh one).
    ///
    /// This returns once playback has been requested, handing back the player
    /// used.
    pub async fn play(&self, id: &str, volume: f32) -> CacheResult<Arc<dyn Player>> {
        let file = self.load(id).await?;
        let player = self.player();

        player.play(file.path(), volume, true).await?;

        Ok(player)
    }

    /// Loads `id`, and plays it on repeat at `volume` on the fixed player (or a fresh one).
    ///
    /// Loop mode is set before playback is started. Playback is started in the
    /// background: this returns as soon as the asset is loaded and the request
    /// has been issued, and any failure to start is only logged.
    pub async fn play_looped(&self, id: &str, volume: f32) -> CacheResult<Arc<dyn Player>> {
        let file = self.load(id).await?;
        let player = self.player();

        player.set_loop_mode(true)?;

        let starter = Arc::clone(&player);
        let span = tracing::debug_span!("loop_start", path = ?file.path());
        tokio::spawn(
            async move {
                if let Err(e) = starter.play(file.path(), volume, true).await {
                    warn!("Looped playback did not start: {}.", e);
                }
            }
            .instrument(span),
        );

        Ok(player)
    }

    fn player(&self) -> Arc<dyn Player> {
        let fixed = self.config.read().fixed_player.clone();

        fixed.unwrap_or_else(|| self.players.create())
    }

    /// Enables or disables logging within the playback engine.
    pub fn set_player_logging(&self, enabled: bool) {
        self.players.set_logging_enabled(enabled);
    }

    /// Returns the prefix used to locate bundled resources.
    #[must_use]
    pub fn prefix(&self) -> String {
        self.config.read().prefix.clone()
    }

    /// Changes the prefix used to locate bundled resources.
    ///
    /// Resident entries are kept; only later misses read from the new location.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.config.write().prefix = prefix.into();
    }

    /// Returns a copy of this cache's configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }
}

#[cfg(feature = "http")]
fn default_network() -> Option<Arc<dyn Fetch>> {
    Some(Arc::new(HttpFetcher::default()))
}

#[cfg(not(feature = "http"))]
fn default_network() -> Option<Arc<dyn Fetch>> {
    None
}
