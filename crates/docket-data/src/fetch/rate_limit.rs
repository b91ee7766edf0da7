//! Process-wide request rate limiting.
//!
//! SEC EDGAR enforces an undisclosed per-client ceiling and blocks addresses
//! that exceed it, so every outbound request goes through one shared
//! [`RateLimiter`]. The limiter keeps a sliding log of admission instants:
//! a request is admitted only if fewer than `limit` admissions happened in
//! the trailing window, which holds the ceiling for *any* window of that
//! length rather than only for aligned ones.

use crate::error::{DataError, Result};
use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Default ceiling: 5 requests per second.
pub const DEFAULT_RATE_PER_SECOND: u32 = 5;

/// Default bound on how long a single call may wait for a slot.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Sliding-window rate limiter shared by all fetchers of a process.
///
/// Construct one and hand out `Arc<RateLimiter>` clones; the limiter itself
/// holds no global state.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    max_delay: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter admitting `limit` operations per `window`.
    pub fn new(limit: NonZeroU32, window: Duration) -> Self {
        Self {
            limit: limit.get() as usize,
            window,
            max_delay: DEFAULT_MAX_DELAY,
            admitted: Mutex::new(VecDeque::with_capacity(limit.get() as usize)),
        }
    }

    /// Create a limiter admitting `limit` operations per second.
    ///
    /// # Example
    /// ```
    /// use docket_data::fetch::RateLimiter;
    /// use std::num::NonZeroU32;
    ///
    /// let limiter = RateLimiter::per_second(NonZeroU32::new(5).unwrap());
    /// assert_eq!(limiter.limit(), 5);
    /// ```
    pub fn per_second(limit: NonZeroU32) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    /// Set the bound on how long one `acquire` call may wait.
    pub const fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Maximum admissions per window.
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Length of the sliding window.
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Bound on the wait of a single `acquire` call.
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Wait for a slot and claim it.
    ///
    /// Suspends while the window is full. Contention alone never fails the
    /// call; it fails with [`DataError::RateLimitExceeded`] only when getting a
    /// slot would take the total wait past [`max_delay`](Self::max_delay).
    pub async fn acquire(&self) -> Result<()> {
        let started = Instant::now();

        loop {
            let wait = {
                let mut admitted = self.admitted.lock().await;
                let now = Instant::now();

                while admitted
                    .front()
                    .is_some_and(|front| now.duration_since(*front) >= self.window)
                {
                    admitted.pop_front();
                }

                if admitted.len() < self.limit {
                    admitted.push_back(now);
                    tracing::trace!(in_window = admitted.len(), "rate limiter slot acquired");
                    return Ok(());
                }

                // Full window: the oldest admission is the next to expire.
                admitted.front().map_or(Duration::ZERO, |front| {
                    (*front + self.window).saturating_duration_since(now)
                })
            };

            let waited = started.elapsed();
            if waited + wait > self.max_delay {
                tracing::warn!(?waited, max_delay = ?self.max_delay, "rate limiter wait bound exceeded");
                return Err(DataError::RateLimitExceeded {
                    waited,
                    max_delay: self.max_delay,
                });
            }

            tracing::debug!(?wait, "rate limiter window full, waiting");
            sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_second(NonZeroU32::new(DEFAULT_RATE_PER_SECOND).unwrap_or(NonZeroU32::MIN))
    }
}
