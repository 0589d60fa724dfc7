//! Retrieval of raw asset bytes from their original source.
//!
//! Any [`Fetch`] implementor can back an [`AudioCache`]: one is consulted for
//! bundled resources, and another for network identifiers. This crate ships a
//! [`BundleFetcher`] over any [`Bundle`] of packaged resources, as well as an
//! [`HttpFetcher`] (with the `"http"` feature) which performs a plain GET.
//!
//! Fetchers are not expected to retry or resume; the first failure is
//! reported to every caller waiting on that asset.
//!
//! [`AudioCache`]: crate::AudioCache

mod bundle;
#[cfg(feature = "http")]
mod http;

pub use self::bundle::*;
#[cfg(feature = "http")]
pub use self::http::*;

use crate::{error::CacheResult, source::Source};
use async_trait::async_trait;

/// Retrieves the full contents of an asset from its source.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches all bytes for `source`, buffered in memory.
    ///
    /// Implementors which cannot serve the given kind of [`Source`] should
    /// return [`CacheError::Unsupported`].
    ///
    /// [`CacheError::Unsupported`]: crate::error::CacheError::Unsupported
    async fn fetch(&self, source: &Source) -> CacheResult<Vec<u8>>;
}
