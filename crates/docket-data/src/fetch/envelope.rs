//! Normalized response record shared by every downloader.

use serde::{Deserialize, Serialize};

/// HTTP status the origin sends when a conditional request finds nothing new.
pub const STATUS_NOT_MODIFIED: u16 = 304;

/// Response envelope returned for every fetch, whether it was served from the
/// network or from the cache.
///
/// The serialized form is also the on-disk cache format, so the field names
/// are part of the cache file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Fully resolved resource URL
    pub url: String,
    /// Origin status code, or the stored status on a cache hit
    pub status_code: u16,
    /// Raw response body
    pub content: String,
    /// `Last-Modified` token; empty when the origin sent none
    pub last_modified: String,
    /// `Content-Type`, if the origin sent one
    pub content_type: Option<String>,
}

impl Envelope {
    /// Whether this envelope may be written to the cache.
    ///
    /// Only envelopes carrying a freshness token can be revalidated later.
    pub const fn is_cacheable(&self) -> bool {
        !self.last_modified.is_empty()
    }

    /// Whether the status is in the 2xx range.
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }

    /// Whether the origin answered "not modified".
    pub const fn is_not_modified(&self) -> bool {
        self.status_code == STATUS_NOT_MODIFIED
    }

    /// Deserialize the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.content)
    }
}
