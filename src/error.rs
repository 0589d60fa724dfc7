//! Cache and fetch error handling.

pub use crate::player::{PlayerError, PlayerResult};
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Error as IoError, ErrorKind as IoErrorKind},
    sync::Arc,
};

/// Errors encountered while resolving, fetching, materialising, or playing
/// a cached asset.
///
/// Every variant is cheap to clone, as the outcome of a single in-flight
/// load is handed to each caller waiting on that identifier.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum CacheError {
    /// The bundled resource at this path could not be found.
    AssetNotFound(String),
    /// A remote asset could not be retrieved.
    Network(NetworkError),
    /// A local filesystem operation failed.
    Io(Arc<IoError>),
    /// The identifier would resolve to a path outside of the cache directory,
    /// or names no file at all.
    InvalidIdentifier(String),
    /// The fetcher cannot serve this kind of source.
    ///
    /// This is also returned for network identifiers when no network
    /// fetcher has been configured.
    Unsupported,
    /// The playback collaborator refused a `play` or `loop` request.
    Player(PlayerError),
    /// The background task loading this asset panicked or was aborted
    /// before it could report a result.
    Interrupted,
}

impl CacheError {
    /// Indicates whether a bundled resource was missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AssetNotFound(_))
    }

    /// Indicates whether a network request failed.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Indicates whether a local filesystem operation failed.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "failed to cache asset: ")?;
        match self {
            Self::AssetNotFound(path) => write!(f, "bundled resource {path:?} not found"),
            Self::Network(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "i/o error [{e}]"),
            Self::InvalidIdentifier(id) => write!(f, "identifier {id:?} is not a safe cache path"),
            Self::Unsupported => write!(f, "source type is not supported by this fetcher"),
            Self::Player(e) => write!(f, "{e}"),
            Self::Interrupted => write!(f, "load task ended before reporting a result"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            Self::Io(e) => Some(e.as_ref()),
            Self::Player(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for CacheError {
    fn from(e: IoError) -> Self {
        Self::Io(Arc::new(e))
    }
}

impl From<NetworkError> for CacheError {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

impl From<PlayerError> for CacheError {
    fn from(e: PlayerError) -> Self {
        Self::Player(e)
    }
}

/// Convenience type for cache error handling.
pub type CacheResult<T> = Result<T, CacheError>;

/// Failure modes of a single network GET.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum NetworkError {
    /// The server answered with a non-success status code.
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code received.
        status: u16,
    },
    /// The request could not be sent, or its body could not be read.
    Transport {
        /// The requested URL.
        url: String,
        /// The underlying transport error.
        source: Arc<dyn Error + Send + Sync + 'static>,
    },
}

impl NetworkError {
    /// Returns the URL of the failed request.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Transport { url, .. } => url,
        }
    }

    /// Returns the status code, if the server responded at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Status { url, status } => write!(f, "GET {url} returned HTTP {status}"),
            Self::Transport { url, source } => write!(f, "GET {url} failed [{source}]"),
        }
    }
}

impl Error for NetworkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Status { .. } => None,
            Self::Transport { source, .. } => Some(source.as_ref()),
        }
    }
}

pub(crate) fn is_not_found(e: &IoError) -> bool {
    e.kind() == IoErrorKind::NotFound
}
