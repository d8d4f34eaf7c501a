use crate::cache::disk::DiskStore;
use crate::cache::response::ResponseCache;
use crate::cache::zone::ZoneMetricsCache;
use crate::cache::{CacheStats, EntryStore};
use crate::commentary::Commentator;
use crate::config::{ApiCredentials, ScoutConfig};
use crate::enumerator::ZoneEnumerator;
use crate::error::{CacheError, ScoutError};
use crate::evaluator::ZoneEvaluator;
use crate::fetchers::MetricFetchers;
use crate::http::{HttpTransport, ReqwestTransport, RetryingTransport};
use crate::llm::{OpenAiChat, TextModel};
use crate::ranking::{RankRequest, ZoneRanker};
use crate::zone::ScoredZone;
use std::sync::Arc;

/// Collaborators a [`ZoneScout`] is assembled from.
pub struct ScoutParts {
    pub response_store: Arc<dyn EntryStore>,
    pub zone_store: Arc<dyn EntryStore>,
    /// Raw transport; retries are layered on according to `ScoutConfig::retry`
    pub transport: Arc<dyn HttpTransport>,
    pub model: Arc<dyn TextModel>,
    pub enumerator: Arc<dyn ZoneEnumerator>,
}

/// The ranking pipeline with its two caches, constructed once per process.
pub struct ZoneScout {
    config: ScoutConfig,
    response_cache: Arc<ResponseCache>,
    zone_cache: Arc<ZoneMetricsCache>,
    fetchers: Arc<MetricFetchers>,
    ranker: ZoneRanker,
    commentator: Commentator,
}

impl ZoneScout {
    /// Disk-backed caches under `config.cache_dir`, reqwest transport, OpenAI model.
    pub fn open(
        config: ScoutConfig,
        credentials: ApiCredentials,
        enumerator: Arc<dyn ZoneEnumerator>,
    ) -> Result<Self, ScoutError> {
        config.validate()?;

        let response_store = DiskStore::open(config.response_cache_dir())?;
        let zone_store = DiskStore::open(config.zone_cache_dir())?;
        let transport = ReqwestTransport::new(config.http_timeout)
            .map_err(|e| ScoutError::Configuration(e.to_string()))?;
        let model = OpenAiChat::new(credentials.openai_api_key.clone(), config.http_timeout)
            .map_err(|e| ScoutError::Configuration(e.to_string()))?;

        let parts = ScoutParts {
            response_store: Arc::new(response_store),
            zone_store: Arc::new(zone_store),
            transport: Arc::new(transport),
            model: Arc::new(model),
            enumerator,
        };
        Self::from_parts(config, credentials, parts)
    }

    pub fn from_parts(
        config: ScoutConfig,
        credentials: ApiCredentials,
        parts: ScoutParts,
    ) -> Result<Self, ScoutError> {
        config.validate()?;

        let transport = RetryingTransport::new(parts.transport, config.retry.clone());
        let response_cache = Arc::new(
            ResponseCache::new(parts.response_store, Arc::new(transport))
                .with_secret_params(config.secret_params.clone())
                .with_acceptable_statuses(config.acceptable_statuses.clone()),
        );
        let zone_cache = Arc::new(ZoneMetricsCache::new(parts.zone_store));

        let fetchers = Arc::new(MetricFetchers::new(
            response_cache.clone(),
            parts.model.clone(),
            &credentials,
            &config,
        )?);
        let evaluator = Arc::new(ZoneEvaluator::new(
            fetchers.clone(),
            zone_cache.clone(),
            config.zone_ttl,
        ));
        let ranker = ZoneRanker::new(
            parts.enumerator,
            evaluator,
            config.search_radius_m,
            config.worker_pool_size,
        );

        Ok(Self {
            config,
            response_cache,
            zone_cache,
            fetchers,
            ranker,
            commentator: Commentator::new(parts.model),
        })
    }

    pub async fn rank_top(&self, request: &RankRequest) -> Result<Vec<ScoredZone>, ScoutError> {
        self.ranker.rank_top(request).await
    }

    /// [`Self::rank_top`] followed by per-zone commentary.
    pub async fn rank_with_commentary(&self, request: &RankRequest) -> Result<Vec<ScoredZone>, ScoutError> {
        let mut ranked = self.ranker.rank_top(request).await?;
        self.commentator
            .annotate(&mut ranked, self.fetchers.geocoder(), &request.business_type)
            .await;
        Ok(ranked)
    }

    /// Remove expired entries from both caches; returns `(responses, zones)` removed.
    pub async fn purge_expired(&self) -> Result<(usize, usize), CacheError> {
        let responses = self
            .response_cache
            .purge_expired(self.config.response_ttl)
            .await?;
        let zones = self.zone_cache.purge_expired(self.config.zone_ttl).await?;
        Ok((responses, zones))
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    pub fn fetchers(&self) -> &Arc<MetricFetchers> {
        &self.fetchers
    }

    pub fn response_cache(&self) -> &Arc<ResponseCache> {
        &self.response_cache
    }

    pub fn zone_cache(&self) -> &Arc<ZoneMetricsCache> {
        &self.zone_cache
    }

    pub fn response_cache_stats(&self) -> CacheStats {
        self.response_cache.stats()
    }

    pub fn zone_cache_stats(&self) -> CacheStats {
        self.zone_cache.stats()
    }
}
