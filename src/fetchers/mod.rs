//! One function per zone metric, each backed by the response cache.
//!
//! Fetchers never fail: upstream and data errors are logged and surface as
//! `None` (or a documented default) so a single bad call only degrades the
//! zone it belongs to.

use crate::cache::response::ResponseCache;
use crate::config::{ApiCredentials, ScoutConfig};
use crate::error::ScoutError;
use crate::llm::TextModel;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

pub mod census;
pub mod geocode;
pub mod places;
pub mod rent;

use census::{CensusClient, MEDIAN_INCOME_CODE, POPULATION_CODE};
use geocode::Geocoder;
use places::PlacesClient;
use rent::{RentClassifier, DEFAULT_RENT_SCORE};

/// Place categories summed into the traffic score.
pub const TRAFFIC_CATEGORIES: [&str; 3] = ["transit_station", "bus_station", "train_station"];
pub const PARKING_CATEGORY: &str = "parking";

pub struct MetricFetchers {
    geocoder: Geocoder,
    census: CensusClient,
    places: PlacesClient,
    rent: RentClassifier,
    page_delay: Duration,
    category_delay: Duration,
}

impl MetricFetchers {
    pub fn new(
        cache: Arc<ResponseCache>,
        model: Arc<dyn TextModel>,
        credentials: &ApiCredentials,
        config: &ScoutConfig,
    ) -> Result<Self, ScoutError> {
        let memo_capacity = NonZeroUsize::new(config.rent_memo_capacity).ok_or_else(|| {
            ScoutError::Configuration("rent_memo_capacity must be at least 1".to_string())
        })?;
        let ttl = config.response_ttl;

        Ok(Self {
            geocoder: Geocoder::new(cache.clone(), credentials.google_api_key.clone(), ttl),
            census: CensusClient::new(
                cache.clone(),
                credentials.census_api_key.clone(),
                config.census_year,
                ttl,
            ),
            places: PlacesClient::new(cache, credentials.google_api_key.clone(), ttl),
            rent: RentClassifier::new(model, memo_capacity),
            page_delay: config.page_delay,
            category_delay: config.category_delay,
        })
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    pub fn rent_classifier(&self) -> &RentClassifier {
        &self.rent
    }

    pub async fn population(&self, zip: &str) -> Option<i64> {
        match self.census.query(zip, POPULATION_CODE).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(zone = zip, metric = "population", "Fetch failed: {}", e);
                None
            }
        }
    }

    /// Negative incomes are the census "not available" sentinel and map to `None`.
    pub async fn median_income(&self, zip: &str) -> Option<i64> {
        match self.census.query(zip, MEDIAN_INCOME_CODE).await {
            Ok(value) if value < 0 => {
                tracing::debug!(zone = zip, value, "Census income sentinel treated as unknown");
                None
            }
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(zone = zip, metric = "median_income", "Fetch failed: {}", e);
                None
            }
        }
    }

    /// Affordability in `{0.8, 0.5, 0.2}`; anything unresolvable scores as moderate.
    pub async fn rent_affordability(&self, lat: f64, lng: f64) -> f64 {
        self.rent_score(lat, lng).await.unwrap_or(DEFAULT_RENT_SCORE)
    }

    /// Affordability, or `None` when no tier could be resolved for the point.
    pub async fn rent_score(&self, lat: f64, lng: f64) -> Option<f64> {
        match self.geocoder.neighborhood_and_city(lat, lng).await {
            Ok((neighborhood, city)) => self.rent.classify(&neighborhood, &city).await,
            Err(e) => {
                tracing::warn!(lat, lng, metric = "rent_cost", "Neighborhood lookup failed: {}", e);
                None
            }
        }
    }

    /// Count places of `place_type` across every result page.
    pub async fn competitor_count(&self, lat: f64, lng: f64, radius_m: u32, place_type: &str) -> Option<i64> {
        let mut total = 0i64;
        let mut page_token: Option<String> = None;

        loop {
            let page = match self
                .places
                .search(lat, lng, radius_m, place_type, page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(lat, lng, place_type, metric = "competitor_count", "Fetch failed: {}", e);
                    return None;
                }
            };

            if !page.is_ok() {
                if page.status != "ZERO_RESULTS" {
                    tracing::warn!(
                        lat,
                        lng,
                        place_type,
                        metric = "competitor_count",
                        status = %page.status,
                        "Places search stopped"
                    );
                }
                break;
            }

            total += page.results.len() as i64;

            match page.next_page_token {
                Some(token) => {
                    // Page tokens only become valid upstream after a short delay.
                    let cached = self
                        .places
                        .is_cached(lat, lng, radius_m, place_type, Some(token.as_str()))
                        .await;
                    if !cached {
                        tokio::time::sleep(self.page_delay).await;
                    }
                    page_token = Some(token);
                }
                None => break,
            }
        }

        Some(total)
    }

    pub async fn traffic_score(&self, lat: f64, lng: f64, radius_m: u32) -> Option<i64> {
        let mut total = 0i64;

        for (i, category) in TRAFFIC_CATEGORIES.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.category_delay).await;
            }
            total += self.category_count(lat, lng, radius_m, category, "traffic_score").await?;
        }

        Some(total)
    }

    pub async fn parking_score(&self, lat: f64, lng: f64, radius_m: u32) -> Option<i64> {
        self.category_count(lat, lng, radius_m, PARKING_CATEGORY, "parking_score")
            .await
    }

    /// First-page result count for one category.
    async fn category_count(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        category: &str,
        metric: &'static str,
    ) -> Option<i64> {
        match self.places.search(lat, lng, radius_m, category, None).await {
            Ok(page) => {
                if !page.is_ok() && page.status != "ZERO_RESULTS" {
                    tracing::warn!(lat, lng, category, metric, status = %page.status, "Unexpected places status");
                }
                Some(page.results.len() as i64)
            }
            Err(e) => {
                tracing::warn!(lat, lng, category, metric, "Fetch failed: {}", e);
                None
            }
        }
    }
}
