//! # zone-scout
//!
//! **Cached site-suitability ranking for ZIP code zones**
//!
//! Given a center point, a search radius and a set of metric weights,
//! zone-scout enumerates the ZIP codes around the point, resolves six metrics
//! per zone (population, median income, rent affordability, transit traffic,
//! parking and competitor count), min-max normalizes them across the
//! candidates and returns the best zones by weighted composite score.
//!
//! ## Two cache tiers
//!
//! Upstream APIs are paid and rate limited, so every call goes through two
//! persistent caches:
//!
//! | Tier | Key | Contents |
//! |------|-----|----------|
//! | [`ResponseCache`] | SHA-256 of endpoint + sorted non-secret params | raw JSON response |
//! | [`ZoneMetricsCache`] | ZIP code | derived [`ZoneRecord`], competitor counts per business type |
//!
//! Rent classifications are additionally memoized in memory per
//! `(neighborhood, city)`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use zone_scout::{ApiCredentials, CentroidIndex, RankRequest, ScoutConfig, WeightConfig, ZoneScout};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let zones = CentroidIndex::from_json_file("zcta_centroids.json")?;
//! let scout = ZoneScout::open(ScoutConfig::default(), ApiCredentials::from_env()?, Arc::new(zones))?;
//!
//! let weights = WeightConfig::new()
//!     .with("population", 0.3)
//!     .with("competition", 0.3)
//!     .with("traffic", 0.4);
//! let request = RankRequest::new(25.7617, -80.1918, weights);
//!
//! for zone in scout.rank_top(&request).await? {
//!     println!("{} scored {:.4}", zone.record.zip_id, zone.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod commentary;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod evaluator;
pub mod fetchers;
pub mod http;
pub mod llm;
pub mod presets;
pub mod ranking;
pub mod scoring;
pub mod scout;
pub mod zone;

// Re-export commonly used types
pub use cache::disk::DiskStore;
pub use cache::memory::MemoryStore;
pub use cache::response::{fingerprint, ResponseCache};
pub use cache::zone::ZoneMetricsCache;
pub use cache::{CacheStats, EntryStore, StoredEntry};
pub use commentary::Commentator;
pub use config::{ApiCredentials, RetryPolicy, ScoutConfig};
pub use enumerator::{CentroidIndex, ZoneEnumerator};
pub use error::{CacheError, FetchError, ScoutError};
pub use evaluator::ZoneEvaluator;
pub use fetchers::MetricFetchers;
pub use http::{HttpResponse, HttpTransport, ReqwestTransport, RetryingTransport};
pub use llm::{OpenAiChat, TextModel};
pub use presets::{preset, BusinessPreset, PRESETS};
pub use ranking::{listing_url, RankRequest, ZoneRanker};
pub use scoring::score;
pub use scout::{ScoutParts, ZoneScout};
pub use zone::{
    CandidateZone, Direction, EvaluatedZone, Label, Metric, MetricScore, ScoredZone, WeightConfig,
    ZoneRecord,
};
