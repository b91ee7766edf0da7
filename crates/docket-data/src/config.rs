//! Client configuration with layered loading.
//!
//! Precedence (highest wins):
//!
//! 1. Environment variables prefixed with `DOCKET_`
//! 2. TOML file (explicit path, or `DOCKET_CONFIG_FILE`)
//! 3. Built-in defaults
//!
//! Command-line flags are applied on top by the binary.

use crate::cache::{FileCache, default_cache_dir};
use crate::error::{DataError, Result};
use crate::fetch::{
    CachingFetcher, DEFAULT_MAX_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_RATE_PER_SECOND,
    DEFAULT_TIMEOUT, Downloader, Fetcher, RateLimiter, ReqwestTransport, RetryPolicy,
};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable naming a TOML config file.
pub const CONFIG_FILE_ENV: &str = "DOCKET_CONFIG_FILE";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DOCKET_";

/// Settings for the fetch layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the response cache
    pub cache_dir: PathBuf,
    /// Whether to revalidate against the on-disk cache
    pub use_cache: bool,
    /// Operator name sent in the User-Agent
    pub company_name: String,
    /// Contact email sent in the User-Agent
    pub admin_email: String,
    /// Request ceiling per second
    pub rate_per_second: u32,
    /// Longest a request may wait for a rate limiter slot, in milliseconds
    pub max_delay_ms: u64,
    /// Transport retries after the first attempt
    pub max_retries: u32,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Outbound proxy URL
    pub proxy: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            use_cache: true,
            company_name: String::new(),
            admin_email: String::new(),
            rate_per_second: DEFAULT_RATE_PER_SECOND,
            max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            proxy: None,
        }
    }
}

impl Config {
    /// Load from defaults, an optional TOML file and `DOCKET_*` variables.
    ///
    /// `path` takes precedence over `DOCKET_CONFIG_FILE`. The result is not
    /// validated; call [`validate`](Self::validate) once all overrides are in.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config_file"]));

        Ok(figment.extract()?)
    }

    /// Check that the configuration can drive a client.
    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(DataError::Config(format!(
                "company_name is required by the SEC access policy (set {ENV_PREFIX}COMPANY_NAME)"
            )));
        }
        if self.admin_email.trim().is_empty() {
            return Err(DataError::Config(format!(
                "admin_email is required by the SEC access policy (set {ENV_PREFIX}ADMIN_EMAIL)"
            )));
        }
        if self.rate_per_second == 0 {
            return Err(DataError::Config("rate_per_second must be greater than 0".into()));
        }
        if self.timeout_ms == 0 {
            return Err(DataError::Config("timeout_ms must be greater than 0".into()));
        }
        if let Some(proxy) = &self.proxy {
            url::Url::parse(proxy)
                .map_err(|e| DataError::Config(format!("invalid proxy '{proxy}': {e}")))?;
        }
        Ok(())
    }

    /// `User-Agent` value: operator name followed by contact email.
    pub fn user_agent(&self) -> String {
        format!("{} {}", self.company_name.trim(), self.admin_email.trim())
    }

    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Bound on rate limiter waits.
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Build the process-wide rate limiter described by this configuration.
    pub fn rate_limiter(&self) -> Result<RateLimiter> {
        let limit = NonZeroU32::new(self.rate_per_second)
            .ok_or_else(|| DataError::Config("rate_per_second must be greater than 0".into()))?;
        Ok(RateLimiter::per_second(limit).with_max_delay(self.max_delay()))
    }

    /// Build the downloader variant selected by [`use_cache`](Self::use_cache).
    ///
    /// All downloaders built from the same `limiter` share one ceiling.
    pub fn downloader(&self, limiter: Arc<RateLimiter>) -> Result<Arc<dyn Downloader>> {
        self.validate()?;

        let transport =
            ReqwestTransport::new(&self.user_agent(), self.timeout(), self.proxy.as_deref())?;
        let fetcher = Fetcher::new(Arc::new(transport), limiter)
            .with_retry(RetryPolicy::exponential(self.max_retries));

        if self.use_cache {
            tracing::debug!(cache_dir = %self.cache_dir.display(), "using cached downloader");
            let cache = FileCache::new(&self.cache_dir);
            Ok(Arc::new(CachingFetcher::new(fetcher, cache)))
        } else {
            Ok(Arc::new(fetcher))
        }
    }
}
