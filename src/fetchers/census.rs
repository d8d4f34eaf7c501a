use crate::cache::response::ResponseCache;
use crate::error::FetchError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// ACS variable for total population.
pub const POPULATION_CODE: &str = "B01003_001E";
/// ACS variable for median household income.
pub const MEDIAN_INCOME_CODE: &str = "B19013_001E";

pub fn acs5_url(year: u16) -> String {
    format!("https://api.census.gov/data/{year}/acs/acs5")
}

/// ACS 5-year lookups by ZIP code tabulation area.
pub struct CensusClient {
    cache: Arc<ResponseCache>,
    api_key: String,
    year: u16,
    ttl: Duration,
}

impl CensusClient {
    pub fn new(cache: Arc<ResponseCache>, api_key: String, year: u16, ttl: Duration) -> Self {
        Self {
            cache,
            api_key,
            year,
            ttl,
        }
    }

    /// Fetch a single integer variable for `zip`.
    pub async fn query(&self, zip: &str, metric_code: &str) -> Result<i64, FetchError> {
        let params = vec![
            ("get".to_string(), metric_code.to_string()),
            ("for".to_string(), format!("zip code tabulation area:{zip}")),
            ("key".to_string(), self.api_key.clone()),
        ];
        let payload = self
            .cache
            .get_or_fetch(&acs5_url(self.year), &params, self.ttl)
            .await?;

        parse_first_value(&payload).ok_or_else(|| {
            FetchError::Data(format!("unexpected census payload for {metric_code} in {zip}"))
        })
    }
}

/// Rows come back as `[[header...], [value, zcta]]`; values are usually strings.
fn parse_first_value(payload: &Value) -> Option<i64> {
    let cell = payload.get(1)?.get(0)?;
    match cell {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}
