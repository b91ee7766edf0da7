//! Rate-limited, cache-aware resource fetching.

use super::envelope::{Envelope, STATUS_NOT_MODIFIED};
use super::rate_limit::RateLimiter;
use super::retry::RetryPolicy;
use super::transport::{HttpRequest, Transport};
use crate::cache::FileCache;
use crate::error::{DataError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Anything that can turn a URL into an [`Envelope`].
///
/// The EDGAR collaborators only depend on this trait, so the caching and
/// pass-through variants are interchangeable at construction time.
#[async_trait]
pub trait Downloader: Send + Sync + std::fmt::Debug {
    /// Fetch `url` and return its envelope.
    async fn fetch(&self, url: &str) -> Result<Envelope>;
}

/// Pass-through downloader: rate limited and retried, never cached.
///
/// Also provides the network half of [`CachingFetcher`] through
/// [`get`](Self::get).
#[derive(Debug, Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Create a fetcher sending through `transport`, admitted by `limiter`.
    ///
    /// Pass the same limiter to every fetcher of the process to keep one
    /// ceiling for all of them.
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            transport,
            limiter,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the transport retry policy.
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Shared rate limiter.
    pub const fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Send one GET, optionally conditional on `if_modified_since`.
    ///
    /// Each attempt, retries included, first claims a rate limiter slot.
    /// 2xx and 304 responses come back as envelopes; the 304 envelope has an
    /// empty body and it is up to the caller to supply cached content.
    ///
    /// # Errors
    /// - [`DataError::RateLimitExceeded`] if a slot cannot be had in time
    /// - [`DataError::Transport`] once all retries failed to reach the origin
    /// - [`DataError::OriginRejected`] for any other status
    pub async fn get(&self, url: &str, if_modified_since: Option<&str>) -> Result<Envelope> {
        let request = HttpRequest::get(url).with_if_modified_since(if_modified_since);
        let mut attempt: u32 = 0;

        let response = loop {
            self.limiter.acquire().await?;

            match self.transport.execute(request.clone()).await {
                Ok(response) => break response,
                Err(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    attempt += 1;
                    tracing::warn!(url, attempt, ?delay, error = %e, "transport failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(DataError::Transport {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        message: e.to_string(),
                    });
                }
            }
        };

        let envelope = Envelope {
            url: url.to_string(),
            status_code: response.status,
            content: response.body,
            last_modified: response.last_modified.unwrap_or_default(),
            content_type: response.content_type,
        };

        if envelope.is_success() || envelope.is_not_modified() {
            tracing::debug!(
                url,
                status = envelope.status_code,
                conditional = request.if_modified_since.is_some(),
                "fetched"
            );
            Ok(envelope)
        } else {
            Err(DataError::OriginRejected {
                url: url.to_string(),
                status_code: envelope.status_code,
            })
        }
    }
}

#[async_trait]
impl Downloader for Fetcher {
    async fn fetch(&self, url: &str) -> Result<Envelope> {
        let envelope = self.get(url, None).await?;

        // Nothing was cached, so there is no body to stand in for a 304.
        if envelope.is_not_modified() {
            return Err(DataError::OriginRejected {
                url: url.to_string(),
                status_code: STATUS_NOT_MODIFIED,
            });
        }

        Ok(envelope)
    }
}

/// Downloader that revalidates against an on-disk cache.
///
/// A cached entry's `last_modified` is sent as `If-Modified-Since`; a 304
/// returns the cached envelope untouched, and a fresh response replaces the
/// entry only if it carries its own `Last-Modified`.
#[derive(Debug, Clone)]
pub struct CachingFetcher {
    fetcher: Fetcher,
    cache: FileCache,
}

impl CachingFetcher {
    /// Wrap `fetcher` with `cache`.
    pub const fn new(fetcher: Fetcher, cache: FileCache) -> Self {
        Self { fetcher, cache }
    }

    /// Underlying cache.
    pub const fn cache(&self) -> &FileCache {
        &self.cache
    }
}

#[async_trait]
impl Downloader for CachingFetcher {
    async fn fetch(&self, url: &str) -> Result<Envelope> {
        let cached = self.cache.read(url).await;
        let token = cached.as_ref().map(|c| c.last_modified.as_str());

        let fresh = self.fetcher.get(url, token).await?;

        if fresh.is_not_modified() {
            return match cached {
                Some(cached) => {
                    tracing::debug!(url, "not modified, serving cached entry");
                    Ok(cached)
                }
                None => Err(DataError::OriginRejected {
                    url: url.to_string(),
                    status_code: STATUS_NOT_MODIFIED,
                }),
            };
        }

        if !fresh.is_cacheable() {
            tracing::debug!(url, "no Last-Modified on response, not caching");
            return Ok(fresh);
        }

        self.cache.write(url, &fresh).await?;
        Ok(fresh)
    }
}
