use crate::cache::response::ResponseCache;
use crate::error::FetchError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

/// Address components of a reverse-geocoded point, most specific result first.
#[derive(Debug, Clone, Default)]
pub struct ReverseGeocode {
    components: Vec<AddressComponent>,
}

impl ReverseGeocode {
    pub fn from_components(components: Vec<AddressComponent>) -> Self {
        Self { components }
    }

    fn first_of(&self, kind: &str) -> Option<&AddressComponent> {
        self.components.iter().find(|c| c.has_type(kind))
    }

    pub fn postal_code(&self) -> Option<String> {
        self.first_of("postal_code").map(|c| c.short_name.clone())
    }

    pub fn city(&self) -> Option<String> {
        self.first_of("locality").map(|c| c.long_name.clone())
    }

    /// Neighborhood, else sublocality, else the city itself.
    pub fn neighborhood(&self) -> Option<String> {
        ["neighborhood", "sublocality", "locality"]
            .iter()
            .find_map(|kind| self.first_of(kind))
            .map(|c| c.long_name.clone())
    }

    /// Short city and state names, as used in listing URLs.
    pub fn city_state(&self) -> Option<(String, String)> {
        let city = self.first_of("locality")?.short_name.clone();
        let state = self.first_of("administrative_area_level_1")?.short_name.clone();
        Some((city, state))
    }
}

/// Reverse geocoding through the response cache.
pub struct Geocoder {
    cache: Arc<ResponseCache>,
    api_key: String,
    ttl: Duration,
}

impl Geocoder {
    pub fn new(cache: Arc<ResponseCache>, api_key: String, ttl: Duration) -> Self {
        Self { cache, api_key, ttl }
    }

    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<ReverseGeocode, FetchError> {
        let params = vec![
            ("latlng".to_string(), format!("{lat},{lng}")),
            ("key".to_string(), self.api_key.clone()),
        ];
        let payload = self.cache.get_or_fetch(GEOCODE_URL, &params, self.ttl).await?;

        let response: GeocodeResponse = serde_json::from_value(payload)
            .map_err(|e| FetchError::Data(format!("geocode payload for ({lat}, {lng}): {e}")))?;

        let components = response
            .results
            .into_iter()
            .flat_map(|r| r.address_components)
            .collect();
        Ok(ReverseGeocode::from_components(components))
    }

    pub async fn postal_code(&self, lat: f64, lng: f64) -> Option<String> {
        match self.reverse_geocode(lat, lng).await {
            Ok(address) => address.postal_code(),
            Err(e) => {
                tracing::warn!(lat, lng, metric = "postal_code", "Postal code lookup failed: {}", e);
                None
            }
        }
    }

    pub async fn city(&self, lat: f64, lng: f64) -> Option<String> {
        match self.reverse_geocode(lat, lng).await {
            Ok(address) => address.city(),
            Err(e) => {
                tracing::warn!(lat, lng, metric = "city", "City lookup failed: {}", e);
                None
            }
        }
    }

    pub async fn neighborhood(&self, lat: f64, lng: f64) -> Option<String> {
        match self.reverse_geocode(lat, lng).await {
            Ok(address) => address.neighborhood(),
            Err(e) => {
                tracing::warn!(lat, lng, metric = "neighborhood", "Neighborhood lookup failed: {}", e);
                None
            }
        }
    }

    pub async fn city_state(&self, lat: f64, lng: f64) -> Option<(String, String)> {
        match self.reverse_geocode(lat, lng).await {
            Ok(address) => address.city_state(),
            Err(e) => {
                tracing::warn!(lat, lng, metric = "listing_url", "City/state lookup failed: {}", e);
                None
            }
        }
    }

    /// `(neighborhood, city)` for rent classification; the city is required.
    pub async fn neighborhood_and_city(&self, lat: f64, lng: f64) -> Result<(String, String), FetchError> {
        let address = self.reverse_geocode(lat, lng).await?;
        let city = address
            .city()
            .ok_or_else(|| FetchError::Data(format!("no city found for ({lat}, {lng})")))?;
        let neighborhood = address.neighborhood().unwrap_or_else(|| city.clone());
        Ok((neighborhood, city))
    }
}
