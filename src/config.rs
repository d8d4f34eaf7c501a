use crate::error::ScoutError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const THIRTY_DAYS: Duration = Duration::from_secs(30 * 24 * 3600);

/// Pipeline configuration
///
/// # Default Values
/// - `response_ttl` / `zone_ttl`: 30 days
/// - `search_radius_m`: 1000 meters around each zone centroid
/// - `page_delay`: 2 seconds between result pages
/// - `category_delay`: 100 milliseconds between traffic categories
/// - `worker_pool_size`: 4 concurrent zone evaluations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Directory holding both persistent cache tables
    pub cache_dir: PathBuf,

    /// Time-to-live for raw upstream responses
    pub response_ttl: Duration,

    /// Time-to-live for derived per-zone metric records
    pub zone_ttl: Duration,

    /// Radius used for place searches around a zone centroid
    pub search_radius_m: u32,

    /// Pause before following a next-page cursor
    pub page_delay: Duration,

    /// Pause between the transit categories of the traffic score
    pub category_delay: Duration,

    /// Maximum number of zones evaluated concurrently
    pub worker_pool_size: usize,

    /// Capacity of the (neighborhood, city) rent classification memo
    pub rent_memo_capacity: usize,

    /// ACS 5-year dataset vintage
    pub census_year: u16,

    /// Per-call network timeout
    pub http_timeout: Duration,

    pub retry: RetryPolicy,

    /// Upstream `status` values whose responses may be persisted
    pub acceptable_statuses: Vec<String>,

    /// Query parameters excluded from request fingerprints
    pub secret_params: Vec<String>,
}

/// Retry schedule for transient HTTP failures.
///
/// Attempt `n` (1-based) that fails is followed by a sleep of
/// `backoff_factor * 2^(n-1)` before the next attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_factor: Duration::from_secs(1),
            retryable_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exponent)
    }
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("zone_scout_cache"),
            response_ttl: THIRTY_DAYS,
            zone_ttl: THIRTY_DAYS,
            search_radius_m: 1000,
            page_delay: Duration::from_secs(2),
            category_delay: Duration::from_millis(100),
            worker_pool_size: 4,
            rent_memo_capacity: 512,
            census_year: 2022,
            http_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            acceptable_statuses: vec!["OK".to_string(), "ZERO_RESULTS".to_string()],
            secret_params: vec!["key".to_string()],
        }
    }
}

impl ScoutConfig {
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.worker_pool_size == 0 {
            return Err(ScoutError::Configuration(
                "worker_pool_size must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ScoutError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.rent_memo_capacity == 0 {
            return Err(ScoutError::Configuration(
                "rent_memo_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn response_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("responses")
    }

    pub fn zone_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("zones")
    }
}

/// Secrets for the paid upstream services.
#[derive(Clone)]
pub struct ApiCredentials {
    pub google_api_key: String,
    pub census_api_key: String,
    pub openai_api_key: String,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("google_api_key", &"<redacted>")
            .field("census_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .finish()
    }
}

impl ApiCredentials {
    /// Read credentials from the environment, loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self, ScoutError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScoutError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |name: &str| -> Result<String, ScoutError> {
            match lookup(name) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => Err(ScoutError::Configuration(format!("{name} is not set"))),
            }
        };

        Ok(Self {
            google_api_key: require("GOOGLE_API_KEY")?,
            census_api_key: require("CENSUS_API_KEY")?,
            openai_api_key: require("OPENAI_API_KEY")?,
        })
    }
}
