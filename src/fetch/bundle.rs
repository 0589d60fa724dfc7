use super::Fetch;
use crate::{
    error::{is_not_found, CacheError, CacheResult},
    source::Source,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    io::{Error as IoError, ErrorKind as IoErrorKind, Result as IoResult},
    path::PathBuf,
    sync::Arc,
};
use tracing::debug;

/// A set of resources packaged alongside the application.
#[async_trait]
pub trait Bundle: Send + Sync {
    /// Reads the resource at `path` in full.
    ///
    /// Missing resources must be reported with [`ErrorKind::NotFound`].
    ///
    /// [`ErrorKind::NotFound`]: std::io::ErrorKind::NotFound
    async fn read(&self, path: &str) -> IoResult<Vec<u8>>;
}

/// Resources stored as plain files beneath a root directory.
#[derive(Clone, Debug)]
pub struct DirBundle {
    root: PathBuf,
}

impl DirBundle {
    /// Creates a bundle reading from `root`.
    ///
    /// This is infallible as the directory is only checked on each read.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Bundle for DirBundle {
    async fn read(&self, path: &str) -> IoResult<Vec<u8>> {
        tokio::fs::read(self.root.join(path)).await
    }
}

/// Resources held in memory, such as those embedded with [`include_bytes`].
#[derive(Clone, Debug, Default)]
pub struct MemoryBundle {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemoryBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource at `path`, replacing any previous contents.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Adds a resource at `path`, replacing any previous contents.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

#[async_trait]
impl Bundle for MemoryBundle {
    async fn read(&self, path: &str) -> IoResult<Vec<u8>> {
        self.files
            .get(path)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| IoError::new(IoErrorKind::NotFound, path.to_string()))
    }
}

/// Fetches bundle-relative identifiers from a [`Bundle`].
#[derive(Clone)]
pub struct BundleFetcher {
    bundle: Arc<dyn Bundle>,
}

impl BundleFetcher {
    /// Creates a fetcher reading from `bundle`.
    pub fn new<B: Bundle + 'static>(bundle: B) -> Self {
        Self {
            bundle: Arc::new(bundle),
        }
    }
}

#[async_trait]
impl Fetch for BundleFetcher {
    async fn fetch(&self, source: &Source) -> CacheResult<Vec<u8>> {
        let resource = match source {
            Source::Bundle { resource, .. } => resource,
            Source::Network(_) => return Err(CacheError::Unsupported),
        };

        debug!("Reading bundled resource {:?}.", resource);

        self.bundle.read(resource).await.map_err(|e| {
            if is_not_found(&e) {
                CacheError::AssetNotFound(resource.clone())
            } else {
                e.into()
            }
        })
    }
}
