#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zone_scout::cache::EntryStore;
use zone_scout::fetchers::census::{MEDIAN_INCOME_CODE, POPULATION_CODE};
use zone_scout::fetchers::geocode::GEOCODE_URL;
use zone_scout::fetchers::places::NEARBY_SEARCH_URL;
use zone_scout::{
    ApiCredentials, CacheError, CandidateZone, CentroidIndex, FetchError, HttpResponse,
    HttpTransport, MemoryStore, ScoutConfig, ScoutParts, StoredEntry, TextModel, ZoneScout,
};

pub type Handler = dyn Fn(&str, &HashMap<String, String>) -> HttpResponse + Send + Sync;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub params: HashMap<String, String>,
    pub at: tokio::time::Instant,
}

/// Transport answering from a closure and recording every call.
pub struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &HashMap<String, String>) -> HttpResponse + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url_fragment: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.url.contains(url_fragment))
            .count()
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse, FetchError> {
        let params: HashMap<String, String> = query.iter().cloned().collect();
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            params: params.clone(),
            at: tokio::time::Instant::now(),
        });
        Ok((self.handler)(url, &params))
    }
}

/// Transport that holds every call open for `latency` and tracks how many overlap.
pub struct InFlightTransport {
    pub inner: MockTransport,
    latency: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightTransport {
    pub fn new(inner: MockTransport, latency: Duration) -> Self {
        Self {
            inner,
            latency,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HttpTransport for InFlightTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<HttpResponse, FetchError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        let response = self.inner.get(url, query).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// Model that always answers with the same label and prose.
pub struct ScriptedModel {
    pub label: String,
    pub prose: String,
    pub fail: bool,
    pub classify_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn answering(label: &str) -> Self {
        Self {
            label: label.to_string(),
            prose: "A lively area with steady foot traffic.".to_string(),
            fail: false,
            classify_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::answering("")
        }
    }

    pub fn classify_count(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TextModel for ScriptedModel {
    async fn classify(&self, _prompt: &str) -> Result<String, FetchError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Unavailable("model offline".to_string()));
        }
        Ok(self.label.clone())
    }

    async fn generate(&self, _prompt: &str) -> Result<String, FetchError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(FetchError::Unavailable("model offline".to_string()));
        }
        Ok(self.prose.clone())
    }
}

/// Store that fails every operation on one key.
pub struct FailingKeyStore {
    inner: MemoryStore,
    poisoned_key: String,
}

impl FailingKeyStore {
    pub fn new(poisoned_key: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            poisoned_key: poisoned_key.to_string(),
        }
    }

    fn check(&self, key: &str) -> Result<(), CacheError> {
        if key == self.poisoned_key {
            Err(CacheError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk unavailable",
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl EntryStore for FailingKeyStore {
    async fn get(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn upsert(&self, entry: StoredEntry) -> Result<(), CacheError> {
        self.check(&entry.key)?;
        self.inner.upsert(entry).await
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.inner.remove(key).await
    }

    async fn purge_older_than(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<usize, CacheError> {
        self.inner.purge_older_than(cutoff).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.inner.clear().await
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

pub fn test_credentials() -> ApiCredentials {
    ApiCredentials {
        google_api_key: "google-secret".to_string(),
        census_api_key: "census-secret".to_string(),
        openai_api_key: "openai-secret".to_string(),
    }
}

pub fn test_config() -> ScoutConfig {
    ScoutConfig {
        cache_dir: std::env::temp_dir().join("zone_scout_unused"),
        ..ScoutConfig::default()
    }
}

pub fn geocode_json(zip: &str, city: &str, state: &str, neighborhood: Option<&str>) -> String {
    let mut components = Vec::new();
    if let Some(name) = neighborhood {
        components.push(serde_json::json!({
            "long_name": name, "short_name": name, "types": ["neighborhood", "political"]
        }));
    }
    components.push(serde_json::json!({
        "long_name": city, "short_name": city, "types": ["locality", "political"]
    }));
    components.push(serde_json::json!({
        "long_name": format!("{state} State"), "short_name": state,
        "types": ["administrative_area_level_1", "political"]
    }));
    components.push(serde_json::json!({
        "long_name": zip, "short_name": zip, "types": ["postal_code"]
    }));

    serde_json::json!({
        "status": "OK",
        "results": [{ "address_components": components }]
    })
    .to_string()
}

pub fn census_json(code: &str, value: &str, zip: &str) -> String {
    serde_json::json!([[code, "zip code tabulation area"], [value, zip]]).to_string()
}

pub fn places_json(count: usize, next_page_token: Option<&str>) -> String {
    let results: Vec<_> = (0..count)
        .map(|i| serde_json::json!({ "place_id": format!("place-{i}") }))
        .collect();
    let status = if count == 0 && next_page_token.is_none() {
        "ZERO_RESULTS"
    } else {
        "OK"
    };
    let mut body = serde_json::json!({ "status": status, "results": results });
    if let Some(token) = next_page_token {
        body["next_page_token"] = serde_json::json!(token);
    }
    body.to_string()
}

/// Upstream view of one ZIP code.
#[derive(Debug, Clone)]
pub struct FakeZone {
    pub zip: String,
    pub lat: f64,
    pub lng: f64,
    pub city: String,
    pub state: String,
    pub neighborhood: Option<String>,
    pub population: i64,
    pub income: i64,
    /// transit_station, bus_station, train_station
    pub transit: [usize; 3],
    pub parking: usize,
    pub competitors: HashMap<String, usize>,
    /// When false, reverse geocoding finds nothing at this point.
    pub geocodable: bool,
}

impl FakeZone {
    pub fn new(zip: &str, lat: f64, lng: f64) -> Self {
        Self {
            zip: zip.to_string(),
            lat,
            lng,
            city: "Miami".to_string(),
            state: "FL".to_string(),
            neighborhood: Some("Brickell".to_string()),
            population: 20_000,
            income: 55_000,
            transit: [2, 1, 0],
            parking: 4,
            competitors: HashMap::from([("restaurant".to_string(), 12), ("cafe".to_string(), 3)]),
            geocodable: true,
        }
    }

    pub fn candidate(&self) -> CandidateZone {
        CandidateZone {
            zone_id: self.zip.clone(),
            lat: self.lat,
            lng: self.lng,
        }
    }

    fn location(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

/// Routes geocoding, census and places requests to the matching fake zone.
pub fn fake_upstream(zones: Vec<FakeZone>) -> MockTransport {
    MockTransport::new(move |url, params| {
        if url == GEOCODE_URL {
            let latlng = params.get("latlng").cloned().unwrap_or_default();
            return match zones.iter().find(|z| z.location() == latlng && z.geocodable) {
                Some(z) => HttpResponse::ok(geocode_json(&z.zip, &z.city, &z.state, z.neighborhood.as_deref())),
                None => HttpResponse::ok(r#"{"status":"ZERO_RESULTS","results":[]}"#),
            };
        }

        if url.contains("api.census.gov") {
            let target = params.get("for").cloned().unwrap_or_default();
            let code = params.get("get").cloned().unwrap_or_default();
            let Some(z) = zones
                .iter()
                .find(|z| target == format!("zip code tabulation area:{}", z.zip))
            else {
                return HttpResponse {
                    status: 204,
                    body: String::new(),
                };
            };
            let value = if code == POPULATION_CODE {
                z.population
            } else if code == MEDIAN_INCOME_CODE {
                z.income
            } else {
                0
            };
            return HttpResponse::ok(census_json(&code, &value.to_string(), &z.zip));
        }

        if url == NEARBY_SEARCH_URL {
            let location = params.get("location").cloned().unwrap_or_default();
            let kind = params.get("type").cloned().unwrap_or_default();
            let Some(z) = zones.iter().find(|z| z.location() == location) else {
                return HttpResponse::ok(places_json(0, None));
            };
            let count = match kind.as_str() {
                "transit_station" => z.transit[0],
                "bus_station" => z.transit[1],
                "train_station" => z.transit[2],
                "parking" => z.parking,
                other => z.competitors.get(other).copied().unwrap_or(0),
            };
            return HttpResponse::ok(places_json(count, None));
        }

        HttpResponse {
            status: 404,
            body: "not found".to_string(),
        }
    })
}

pub struct Harness {
    pub scout: ZoneScout,
    pub transport: Arc<MockTransport>,
    pub model: Arc<ScriptedModel>,
}

pub fn scout_over(
    zones: &[FakeZone],
    transport: Arc<dyn HttpTransport>,
    model: Arc<ScriptedModel>,
    zone_store: Arc<dyn EntryStore>,
    config: ScoutConfig,
) -> ZoneScout {
    let index = CentroidIndex::new(zones.iter().map(FakeZone::candidate).collect());
    let parts = ScoutParts {
        response_store: Arc::new(MemoryStore::new()),
        zone_store,
        transport,
        model,
        enumerator: Arc::new(index),
    };
    ZoneScout::from_parts(config, test_credentials(), parts).unwrap()
}

pub fn harness_with(zones: Vec<FakeZone>, zone_store: Arc<dyn EntryStore>, config: ScoutConfig) -> Harness {
    let transport = Arc::new(fake_upstream(zones.clone()));
    let model = Arc::new(ScriptedModel::answering("moderate"));
    let scout = scout_over(&zones, transport.clone(), model.clone(), zone_store, config);

    Harness {
        scout,
        transport,
        model,
    }
}

pub fn harness(zones: Vec<FakeZone>) -> Harness {
    harness_with(zones, Arc::new(MemoryStore::new()), test_config())
}

/// Formatted log output collected while installed as the thread's default subscriber.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub const TWO_SECONDS: Duration = Duration::from_secs(2);
