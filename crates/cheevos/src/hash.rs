//! Game content identification.
//!
//! Hashing itself is host supplied: the algorithm depends on the console and
//! on file formats the runtime does not parse. The runtime only validates the
//! source and hands it to a [`ContentHasher`] off the calling thread.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::console::ConsoleId;
use crate::error::{Error, Result};
use crate::text::GameHash;

/// Content to identify: raw bytes or a local file.
#[derive(Clone, PartialEq, Eq)]
pub enum MediaSource {
    Bytes(Arc<[u8]>),
    Path(PathBuf),
}

impl MediaSource {
    pub fn bytes(data: impl Into<Arc<[u8]>>) -> Self {
        MediaSource::Bytes(data.into())
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        MediaSource::Path(path.into())
    }

    /// Parse a location given as text. `file://` URLs and plain paths are
    /// accepted; any other URL scheme is rejected.
    pub fn from_location(location: &str) -> Result<Self> {
        if let Some(path) = location.strip_prefix("file://") {
            return Self::path(path).validated();
        }
        if let Some((scheme, _)) = location.split_once("://") {
            return Err(Error::InvalidSource(format!(
                "{scheme} URLs are not supported, expected a local file"
            )));
        }
        Self::path(location).validated()
    }

    /// Check local preconditions before any work is scheduled.
    pub fn validate(&self) -> Result<()> {
        match self {
            MediaSource::Bytes(data) if data.is_empty() => {
                Err(Error::InvalidSource("empty content".to_string()))
            }
            MediaSource::Path(path) if path.as_os_str().is_empty() => {
                Err(Error::InvalidSource("empty path".to_string()))
            }
            MediaSource::Path(path) if path.to_string_lossy().contains("://") => Err(
                Error::InvalidSource(format!("{} is not a local file", path.display())),
            ),
            _ => Ok(()),
        }
    }

    fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            MediaSource::Path(path) => Some(path),
            MediaSource::Bytes(_) => None,
        }
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::Bytes(data) => write!(f, "Bytes({} bytes)", data.len()),
            MediaSource::Path(path) => write!(f, "Path({})", path.display()),
        }
    }
}

/// Host supplied content identification.
pub trait ContentHasher: Send + Sync {
    /// Compute the service hash of `source` for `console`.
    ///
    /// `ConsoleId::Unknown` asks the hasher to detect the console. Failures
    /// surface as [`Error::UnsupportedConsole`] or [`Error::Io`].
    fn hash(&self, console: ConsoleId, source: &MediaSource) -> Result<GameHash>;
}

impl<F> ContentHasher for F
where
    F: Fn(ConsoleId, &MediaSource) -> Result<GameHash> + Send + Sync,
{
    fn hash(&self, console: ConsoleId, source: &MediaSource) -> Result<GameHash> {
        self(console, source)
    }
}
