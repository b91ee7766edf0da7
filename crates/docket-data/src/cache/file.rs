//! Flat-file JSON cache of response envelopes.
//!
//! Each resource is stored as one pretty-printed JSON document at a path
//! mirroring its URL path under the cache root:
//!
//! ```text
//! https://data.sec.gov/submissions/CIK0000320193.json
//!   -> <root>/submissions/CIK0000320193.json
//! ```
//!
//! Entries are never expired or evicted; staleness is resolved by
//! conditional requests in [`CachingFetcher`](crate::fetch::CachingFetcher).

use crate::error::{DataError, Result};
use crate::fetch::Envelope;
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

/// File name used for URLs whose path is empty or ends with `/`.
const INDEX_FILE: &str = "index";

/// On-disk envelope cache rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Create a cache rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL to its cache file.
    ///
    /// Scheme, host, query and fragment are dropped; the remaining path
    /// segments become directories and the file name. Empty, `.` and `..`
    /// segments are skipped so a key can never leave the root.
    ///
    /// # Example
    /// ```
    /// use docket_data::cache::FileCache;
    /// use std::path::Path;
    ///
    /// let cache = FileCache::new("/tmp/docket");
    /// let path = cache.path_for("https://data.sec.gov/submissions/CIK0000320193.json").unwrap();
    /// assert_eq!(path, Path::new("/tmp/docket/submissions/CIK0000320193.json"));
    /// ```
    pub fn path_for(&self, url: &str) -> Result<PathBuf> {
        let parsed = Url::parse(url)?;
        let mut path = self.root.clone();
        let mut has_file_name = false;

        if let Some(segments) = parsed.path_segments() {
            let segments: Vec<&str> = segments.collect();
            let trailing_slash = segments.last().is_some_and(|s| s.is_empty());

            for segment in segments {
                if segment.is_empty() || segment == "." || segment == ".." {
                    continue;
                }
                path.push(segment);
                has_file_name = true;
            }

            if trailing_slash {
                has_file_name = false;
            }
        }

        if !has_file_name {
            path.push(INDEX_FILE);
        }

        Ok(path)
    }

    /// Read the envelope cached for `url`.
    ///
    /// Missing, unreadable and malformed entries all read as `None`; a
    /// corrupt entry is simply re-fetched.
    pub async fn read(&self, url: &str) -> Option<Envelope> {
        let path = match self.path_for(url) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(url, error = %e, "cannot map url to cache path");
                return None;
            }
        };

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "unreadable cache entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry, treating as miss");
                None
            }
        }
    }

    /// Store `envelope` as the entry for `url`, replacing any previous one.
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it, so readers see either the old or the new entry and
    /// never a partial one.
    ///
    /// # Errors
    /// Returns [`DataError::Uncacheable`] for envelopes without a
    /// `last_modified` token, and IO errors from the filesystem.
    pub async fn write(&self, url: &str, envelope: &Envelope) -> Result<PathBuf> {
        if !envelope.is_cacheable() {
            return Err(DataError::Uncacheable(url.to_string()));
        }

        let path = self.path_for(url)?;
        let json = serde_json::to_string_pretty(envelope)?;

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&target, json.as_bytes()))
            .await
            .map_err(|e| DataError::Io(std::io::Error::other(e)))??;

        tracing::debug!(url, path = %path.display(), "cache entry written");
        Ok(path)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| DataError::InvalidUrl(format!("no parent for {}", path.display())))?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| DataError::Io(e.error))?;
    Ok(())
}
