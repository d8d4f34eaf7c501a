use crate::cache::zone::ZoneMetricsCache;
use crate::error::ScoutError;
use crate::fetchers::rent::DEFAULT_RENT_SCORE;
use crate::fetchers::MetricFetchers;
use crate::zone::{CandidateZone, EvaluatedZone, ZoneRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Resolves a zone's metrics, fetching only what the zone metrics cache lacks.
pub struct ZoneEvaluator {
    fetchers: Arc<MetricFetchers>,
    zone_cache: Arc<ZoneMetricsCache>,
    zone_ttl: Duration,
}

impl ZoneEvaluator {
    pub fn new(fetchers: Arc<MetricFetchers>, zone_cache: Arc<ZoneMetricsCache>, zone_ttl: Duration) -> Self {
        Self {
            fetchers,
            zone_cache,
            zone_ttl,
        }
    }

    pub fn fetchers(&self) -> &Arc<MetricFetchers> {
        &self.fetchers
    }

    /// Every event logged while resolving the zone carries its id through the `zone` span.
    pub async fn evaluate(
        &self,
        zone: &CandidateZone,
        business_type: &str,
        radius_m: u32,
    ) -> Result<EvaluatedZone, ScoutError> {
        let span = tracing::info_span!("zone", zone = %zone.zone_id);
        self.evaluate_in_span(zone, business_type, radius_m)
            .instrument(span)
            .await
    }

    async fn evaluate_in_span(
        &self,
        zone: &CandidateZone,
        business_type: &str,
        radius_m: u32,
    ) -> Result<EvaluatedZone, ScoutError> {
        let zone_id = zone.zone_id.as_str();
        let (lat, lng) = (zone.lat, zone.lng);

        let (mut record, mut dirty) = match self.zone_cache.load(zone_id, self.zone_ttl).await? {
            Some(record) => {
                tracing::debug!(zone = zone_id, "Zone metrics cache HIT");
                (record, false)
            }
            None => {
                tracing::debug!(zone = zone_id, "Zone metrics cache MISS, computing record");
                (self.compute_record(zone_id, lat, lng, radius_m).await, true)
            }
        };

        let competitor_count = match record.competitors.get(business_type) {
            Some(count) => Some(*count),
            None => {
                let count = self
                    .fetchers
                    .competitor_count(record.lat, record.lng, radius_m, business_type)
                    .await;
                match count {
                    Some(count) => {
                        record.competitors.insert(business_type.to_string(), count);
                        dirty = true;
                    }
                    None => tracing::warn!(
                        zone = zone_id,
                        metric = "competitor_count",
                        business_type,
                        "Competitor count unavailable"
                    ),
                }
                count
            }
        };

        if dirty {
            self.zone_cache.save(zone_id, &record).await?;
        }

        let city = self.fetchers.geocoder().city(record.lat, record.lng).await;

        Ok(EvaluatedZone {
            record,
            competitor_count,
            city,
        })
    }

    async fn compute_record(&self, zone_id: &str, lat: f64, lng: f64, radius_m: u32) -> ZoneRecord {
        let fetchers = &self.fetchers;

        let population = fetchers.population(zone_id).await;
        let median_income = fetchers.median_income(zone_id).await;
        let rent_cost = fetchers.rent_score(lat, lng).await;
        let traffic_score = fetchers.traffic_score(lat, lng, radius_m).await;
        let parking_score = fetchers.parking_score(lat, lng, radius_m).await;

        let record = ZoneRecord {
            population,
            median_income,
            rent_cost: Some(rent_cost.unwrap_or(DEFAULT_RENT_SCORE)),
            traffic_score,
            parking_score,
            ..ZoneRecord::empty(zone_id, lat, lng)
        };

        let missing: Vec<&str> = [
            ("population", record.population.is_none()),
            ("median_income", record.median_income.is_none()),
            ("rent_cost", rent_cost.is_none()),
            ("traffic_score", record.traffic_score.is_none()),
            ("parking_score", record.parking_score.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            tracing::warn!(zone = zone_id, ?missing, "Zone record computed with missing metrics");
        }

        record
    }
}
