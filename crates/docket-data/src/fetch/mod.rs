//! HTTP fetch layer shared by every EDGAR call.
//!
//! - [`RateLimiter`]: one request ceiling for the whole process
//! - [`FileCache`](crate::cache::FileCache): on-disk envelopes revalidated
//!   with `If-Modified-Since`
//! - [`Fetcher`] / [`CachingFetcher`]: the two [`Downloader`] variants
//!
//! # Example
//!
//! ```no_run
//! use docket_data::cache::FileCache;
//! use docket_data::fetch::{CachingFetcher, Downloader, Fetcher, RateLimiter, ReqwestTransport};
//! use std::num::NonZeroU32;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> docket_data::Result<()> {
//! let limiter = Arc::new(RateLimiter::per_second(NonZeroU32::new(5).unwrap()));
//! let transport = Arc::new(ReqwestTransport::new(
//!     "Example Corp admin@example.com",
//!     Duration::from_secs(30),
//!     None,
//! )?);
//! let downloader = CachingFetcher::new(Fetcher::new(transport, limiter), FileCache::new(".data"));
//!
//! let envelope = downloader
//!     .fetch("https://data.sec.gov/submissions/CIK0000320193.json")
//!     .await?;
//! println!("{} bytes, last modified {}", envelope.content.len(), envelope.last_modified);
//! # Ok(())
//! # }
//! ```

pub mod envelope;
pub mod fetcher;
pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use envelope::{Envelope, STATUS_NOT_MODIFIED};
pub use fetcher::{CachingFetcher, Downloader, Fetcher};
pub use rate_limit::{DEFAULT_MAX_DELAY, DEFAULT_RATE_PER_SECOND, RateLimiter};
pub use retry::{Backoff, DEFAULT_MAX_RETRIES, RetryPolicy};
pub use transport::{
    DEFAULT_TIMEOUT, HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError,
};
