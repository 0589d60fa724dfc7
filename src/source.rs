//! Classification of logical identifiers and their local cache paths.
//!
//! Every identifier is either the URL of a remote asset (`http` or `https`), or
//! a name relative to the application's bundled resources. Both map onto a
//! deterministic path beneath the cache directory:
//!
//! | Identifier                 | Read from                 | Cached at                      |
//! |----------------------------|---------------------------|--------------------------------|
//! | `http://host/a/b.mp3`      | `GET http://host/a/b.mp3` | `<cache_dir>/host/a/b.mp3`     |
//! | `sfx/hit.wav`              | `<prefix>sfx/hit.wav`     | `<cache_dir>/sfx/hit.wav`      |
//!
//! Identifiers are otherwise not normalised: two strings differing only in
//! case or a trailing slash are distinct assets.

use crate::{
    constants::NETWORK_SCHEMES,
    error::{CacheError, CacheResult},
};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Component, Path, PathBuf},
};
use url::Url;

/// Where the bytes for an asset come from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// A file packaged with the application.
    Bundle {
        /// The identifier, as given by the caller.
        name: String,
        /// The resource path handed to the bundle: the prefix followed by `name`.
        resource: String,
    },
    /// A remote file, fetched with a single GET request.
    Network(Url),
}

impl Source {
    /// Returns whether this asset must be fetched over the network.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Bundle { resource, .. } => write!(f, "bundle:{resource}"),
            Self::Network(url) => write!(f, "{url}"),
        }
    }
}

/// An identifier's source, paired with the path it is materialised to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resolved {
    /// Location of the original bytes.
    pub source: Source,
    /// Destination of the local copy.
    pub local_path: PathBuf,
}

/// Classifies `identifier` and computes its local cache path.
///
/// `prefix` is only used to locate bundled resources, and never appears in
/// the local path.
///
/// Identifiers which would escape `cache_dir` (via `..` segments, absolute
/// paths, or drive prefixes), or which do not name a file, are rejected with
/// [`CacheError::InvalidIdentifier`].
pub fn resolve(identifier: &str, prefix: &str, cache_dir: &Path) -> CacheResult<Resolved> {
    let invalid = || CacheError::InvalidIdentifier(identifier.to_string());

    if let Some(url) = network_url(identifier) {
        let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
        let relative = format!("{}{}", host, url.path());

        let local_path = contained_path(cache_dir, &relative).ok_or_else(invalid)?;

        return Ok(Resolved {
            source: Source::Network(url),
            local_path,
        });
    }

    let local_path = contained_path(cache_dir, identifier).ok_or_else(invalid)?;

    Ok(Resolved {
        source: Source::Bundle {
            name: identifier.to_string(),
            resource: format!("{prefix}{identifier}"),
        },
        local_path,
    })
}

/// Returns whether `identifier` names a network asset.
#[must_use]
pub fn is_network(identifier: &str) -> bool {
    network_url(identifier).is_some()
}

fn network_url(identifier: &str) -> Option<Url> {
    Url::parse(identifier)
        .ok()
        .filter(|url| NETWORK_SCHEMES.contains(&url.scheme()))
}

/// Joins `relative` onto `root`, provided every component stays beneath `root`
/// and the final component names a file.
fn contained_path(root: &Path, relative: &str) -> Option<PathBuf> {
    if relative.is_empty() || relative.ends_with('/') || relative.ends_with('\\') {
        return None;
    }

    // Backslashes are separators on Windows only; treat them as such everywhere
    // so that an identifier cannot escape on one platform but not another.
    let relative = relative.replace('\\', "/");
    let mut out = root.to_path_buf();
    let mut pushed = false;

    for component in Path::new(&relative).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                pushed = true;
            },
            Component::CurDir => {},
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    pushed.then_some(out)
}
