//! Persisting fetched bytes onto local storage.

use crate::{constants::PARTIAL_EXTENSION, error::CacheResult};
use std::{
    ffi::OsString,
    io::{Error as IoError, ErrorKind, Result as IoResult},
    path::{Path, PathBuf},
};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Handle to an asset materialised on local storage.
///
/// The file existed when this handle was created; it is not re-validated
/// afterwards.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the location of this file on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consumes the handle, returning its path.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for LocalFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Writes `bytes` to `local_path`, unless a file is already present there.
///
/// Existing files are trusted unconditionally: their contents are neither
/// compared against `bytes` nor rewritten. Otherwise, all parent directories
/// are created and the data is written to a uniquely named sibling before
/// being renamed into place, so that a reader never sees a partial file.
///
/// A directory occupying `local_path` is an error, rather than an existing file.
pub async fn materialize(local_path: &Path, bytes: &[u8]) -> CacheResult<LocalFile> {
    match tokio::fs::metadata(local_path).await {
        Ok(meta) if meta.is_file() => {
            trace!("Reusing existing file at {:?}.", local_path);
            return Ok(LocalFile::new(local_path.to_path_buf()));
        },
        Ok(_) => {
            return Err(IoError::new(
                ErrorKind::AlreadyExists,
                format!("{} is occupied by a directory", local_path.display()),
            )
            .into());
        },
        Err(_) => {},
    }

    if let Some(parent) = local_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    persist(local_path, bytes).await?;

    debug!("Wrote {} bytes to {:?}.", bytes.len(), local_path);

    Ok(LocalFile::new(local_path.to_path_buf()))
}

/// Writes to a partial sibling of `local_path` and renames it into place,
/// removing the partial file if either step fails.
async fn persist(local_path: &Path, bytes: &[u8]) -> IoResult<()> {
    let partial = partial_path(local_path);

    let written = async {
        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, local_path).await
    }
    .await;

    if written.is_err() {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            warn!("Could not remove partial file {:?}: {}.", partial, cleanup);
        }
    }

    written
}

/// Concurrent writers of the same path each receive their own partial file.
fn partial_path(local_path: &Path) -> PathBuf {
    let mut name = local_path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(format!(".{}.{}", Uuid::new_v4().simple(), PARTIAL_EXTENSION));

    local_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn creates_parents_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("host").join("a").join("b.mp3");

        let file = materialize(&target, b"payload").await.unwrap();

        assert_eq!(file.path(), target);
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"payload");
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn existing_file_is_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.wav");
        tokio::fs::write(&target, b"original").await.unwrap();

        let file = materialize(&target, b"replacement").await.unwrap();

        assert_eq!(file.path(), target);
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"original");
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn existing_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sfx");
        tokio::fs::create_dir_all(target.join("hit")).await.unwrap();

        let err = materialize(&target, b"data").await.unwrap_err();

        assert!(err.is_io());
        assert!(tokio::fs::metadata(&target).await.unwrap().is_dir());
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn no_partial_files_are_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("c.ogg");

        materialize(&target, b"data").await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = vec![];
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name());
        }

        assert_eq!(names, vec![OsString::from("c.ogg")]);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn blocked_parent_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        tokio::fs::write(&blocker, b"not a directory").await.unwrap();

        let err = materialize(&blocker.join("x.mp3"), b"data")
            .await
            .unwrap_err();

        assert!(err.is_io());
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn failed_rename_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("busy");
        tokio::fs::create_dir(&target).await.unwrap();
        tokio::fs::write(target.join("inner.wav"), b"x").await.unwrap();

        assert!(persist(&target, b"data").await.is_err());

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = vec![];
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name());
        }

        assert_eq!(names, vec![OsString::from("busy")]);
    }
}
