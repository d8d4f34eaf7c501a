use crate::enumerator::ZoneEnumerator;
use crate::error::ScoutError;
use crate::evaluator::ZoneEvaluator;
use crate::scoring;
use crate::zone::{ScoredZone, WeightConfig};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;

const LISTING_BASE_URL: &str = "https://www.loopnet.com/search/commercial-real-estate";

/// Parameters of a single ranking call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRequest {
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_km: f64,
    pub weights: WeightConfig,
    pub business_type: String,
    pub top_n: usize,
}

impl RankRequest {
    pub fn new(center_lat: f64, center_lng: f64, weights: WeightConfig) -> Self {
        Self {
            center_lat,
            center_lng,
            radius_km: 5.0,
            weights,
            business_type: "restaurant".to_string(),
            top_n: 5,
        }
    }

    pub fn validate(&self) -> Result<(), ScoutError> {
        if !(-90.0..=90.0).contains(&self.center_lat) || !(-180.0..=180.0).contains(&self.center_lng) {
            return Err(ScoutError::InvalidRequest(format!(
                "center ({}, {}) is not a valid coordinate",
                self.center_lat, self.center_lng
            )));
        }
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(ScoutError::InvalidRequest(format!(
                "radius_km must be positive, got {}",
                self.radius_km
            )));
        }
        if self.business_type.trim().is_empty() {
            return Err(ScoutError::InvalidRequest("business_type is empty".to_string()));
        }
        self.weights.validate()
    }
}

/// Listing search URL for commercial space in a ZIP code.
pub fn listing_url(zip: &str, city: &str, state: &str) -> String {
    let slug = format!(
        "{}-{}-{}",
        city.trim().to_lowercase().replace(' ', "-"),
        state.trim().to_lowercase(),
        zip
    );
    format!("{LISTING_BASE_URL}/{slug}/for-lease/")
}

/// Enumerates, evaluates, scores and labels candidate zones.
pub struct ZoneRanker {
    enumerator: Arc<dyn ZoneEnumerator>,
    evaluator: Arc<ZoneEvaluator>,
    search_radius_m: u32,
    pool_size: usize,
}

impl ZoneRanker {
    pub fn new(
        enumerator: Arc<dyn ZoneEnumerator>,
        evaluator: Arc<ZoneEvaluator>,
        search_radius_m: u32,
        pool_size: usize,
    ) -> Self {
        Self {
            enumerator,
            evaluator,
            search_radius_m,
            pool_size: pool_size.max(1),
        }
    }

    pub async fn rank_top(&self, request: &RankRequest) -> Result<Vec<ScoredZone>, ScoutError> {
        request.validate()?;

        let candidates = self
            .enumerator
            .zones_within(request.center_lat, request.center_lng, request.radius_km)
            .await?;
        tracing::info!(
            candidates = candidates.len(),
            business_type = %request.business_type,
            radius_km = request.radius_km,
            "Evaluating candidate zones"
        );

        let business_type = request.business_type.as_str();
        let outcomes: Vec<_> = stream::iter(candidates.iter())
            .map(|zone| async move {
                let outcome = self
                    .evaluator
                    .evaluate(zone, business_type, self.search_radius_m)
                    .await;
                (zone, outcome)
            })
            .buffered(self.pool_size)
            .collect()
            .await;

        let mut evaluated = Vec::with_capacity(outcomes.len());
        for (zone, outcome) in outcomes {
            match outcome {
                Ok(result) => evaluated.push(result),
                Err(e) => tracing::warn!(zone = %zone.zone_id, "Skipping zone after evaluation error: {}", e),
            }
        }

        let mut ranked = scoring::score(&evaluated, &request.weights);
        ranked.truncate(request.top_n);

        let geocoder = self.evaluator.fetchers().geocoder();
        for zone in &mut ranked {
            let record = &zone.record;
            let span = tracing::info_span!("zone", zone = %record.zip_id);
            zone.listing_url = match geocoder.city_state(record.lat, record.lng).instrument(span).await {
                Some((city, state)) => Some(listing_url(&record.zip_id, &city, &state)),
                None => {
                    tracing::warn!(zone = %record.zip_id, "Could not resolve city/state for listing link");
                    None
                }
            };
        }

        tracing::info!(
            evaluated = evaluated.len(),
            returned = ranked.len(),
            "Ranking complete"
        );
        Ok(ranked)
    }
}
