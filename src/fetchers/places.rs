use crate::cache::response::ResponseCache;
use crate::error::FetchError;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const NEARBY_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

/// One page of a nearby search.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesPage {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl PlacesPage {
    pub fn is_ok(&self) -> bool {
        self.status == "OK"
    }
}

/// Points-of-interest search through the response cache.
pub struct PlacesClient {
    cache: Arc<ResponseCache>,
    api_key: String,
    ttl: Duration,
}

impl PlacesClient {
    pub fn new(cache: Arc<ResponseCache>, api_key: String, ttl: Duration) -> Self {
        Self { cache, api_key, ttl }
    }

    pub async fn search(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        category: &str,
        page_token: Option<&str>,
    ) -> Result<PlacesPage, FetchError> {
        let params = self.params(lat, lng, radius_m, category, page_token);
        let payload = self
            .cache
            .get_or_fetch(NEARBY_SEARCH_URL, &params, self.ttl)
            .await?;

        serde_json::from_value(payload)
            .map_err(|e| FetchError::Data(format!("places payload for {category}: {e}")))
    }

    /// Whether `search` with these arguments would be served without an upstream call.
    pub async fn is_cached(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        category: &str,
        page_token: Option<&str>,
    ) -> bool {
        let params = self.params(lat, lng, radius_m, category, page_token);
        match self.cache.is_fresh(NEARBY_SEARCH_URL, &params, self.ttl).await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::debug!(category, "Cache check failed: {}", e);
                false
            }
        }
    }

    fn params(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        category: &str,
        page_token: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut params = vec![
            ("location".to_string(), format!("{lat},{lng}")),
            ("radius".to_string(), radius_m.to_string()),
            ("type".to_string(), category.to_string()),
            ("key".to_string(), self.api_key.clone()),
        ];
        if let Some(token) = page_token {
            params.push(("pagetoken".to_string(), token.to_string()));
        }
        params
    }
}
