//! Caching layer for fetched resources.

pub mod file;

pub use file::FileCache;

use std::path::PathBuf;

/// Platform cache directory for docket.
///
/// - Linux: `~/.cache/docket/`
/// - macOS: `~/Library/Caches/docket/`
/// - Windows: `%LOCALAPPDATA%\docket\`
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docket")
}
