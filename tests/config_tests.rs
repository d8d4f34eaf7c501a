use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use zone_scout::{
    preset, ApiCredentials, CentroidIndex, Metric, ScoutConfig, ScoutError, ZoneScout, PRESETS,
};

#[test]
fn test_scout_config_default() {
    let config = ScoutConfig::default();

    assert_eq!(config.response_ttl, Duration::from_secs(30 * 24 * 3600)); // 30 days
    assert_eq!(config.zone_ttl, Duration::from_secs(30 * 24 * 3600));
    assert_eq!(config.search_radius_m, 1000);
    assert_eq!(config.page_delay, Duration::from_secs(2));
    assert_eq!(config.category_delay, Duration::from_millis(100));
    assert_eq!(config.worker_pool_size, 4);
    assert_eq!(config.census_year, 2022);
    assert_eq!(config.acceptable_statuses, ["OK", "ZERO_RESULTS"]);
    assert_eq!(config.secret_params, ["key"]);
    assert!(config.cache_dir.to_string_lossy().contains("zone_scout_cache"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_cache_directories() {
    let config = ScoutConfig {
        cache_dir: "/var/cache/scout".into(),
        ..ScoutConfig::default()
    };

    assert_eq!(config.response_cache_dir(), std::path::Path::new("/var/cache/scout/responses"));
    assert_eq!(config.zone_cache_dir(), std::path::Path::new("/var/cache/scout/zones"));
}

#[test]
fn test_config_validation() {
    let no_workers = ScoutConfig {
        worker_pool_size: 0,
        ..ScoutConfig::default()
    };
    assert!(matches!(no_workers.validate(), Err(ScoutError::Configuration(_))));

    let no_memo = ScoutConfig {
        rent_memo_capacity: 0,
        ..ScoutConfig::default()
    };
    assert!(no_memo.validate().is_err());

    let mut no_attempts = ScoutConfig::default();
    no_attempts.retry.max_attempts = 0;
    assert!(no_attempts.validate().is_err());
}

#[test]
fn test_config_round_trips_through_json() {
    let config = ScoutConfig {
        worker_pool_size: 8,
        ..ScoutConfig::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    let parsed: ScoutConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.worker_pool_size, 8);
    assert_eq!(parsed.page_delay, config.page_delay);
    assert_eq!(parsed.retry.retryable_statuses, config.retry.retryable_statuses);
}

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| vars.get(name).cloned()
}

#[test]
fn test_credentials_from_lookup() {
    let credentials = ApiCredentials::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "g"),
        ("CENSUS_API_KEY", "c"),
        ("OPENAI_API_KEY", "o"),
    ]))
    .unwrap();

    assert_eq!(credentials.google_api_key, "g");
    assert_eq!(credentials.census_api_key, "c");
    assert_eq!(credentials.openai_api_key, "o");

    let debug = format!("{credentials:?}");
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("\"g\""));
}

#[test]
fn test_missing_credential_is_a_configuration_error() {
    let result = ApiCredentials::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "g"),
        ("OPENAI_API_KEY", "o"),
    ]));
    match result {
        Err(ScoutError::Configuration(message)) => assert!(message.contains("CENSUS_API_KEY")),
        other => panic!("expected configuration error, got {other:?}"),
    }

    let blank = ApiCredentials::from_lookup(lookup(&[
        ("GOOGLE_API_KEY", "  "),
        ("CENSUS_API_KEY", "c"),
        ("OPENAI_API_KEY", "o"),
    ]));
    assert!(blank.is_err());
}

#[test]
fn test_open_creates_cache_tables() {
    let temp_dir = TempDir::new().unwrap();
    let config = ScoutConfig {
        cache_dir: temp_dir.path().to_path_buf(),
        ..ScoutConfig::default()
    };
    let credentials = ApiCredentials::from_lookup(|_| Some("test".to_string())).unwrap();

    let scout = ZoneScout::open(config, credentials, Arc::new(CentroidIndex::default())).unwrap();

    assert!(temp_dir.path().join("responses").is_dir());
    assert!(temp_dir.path().join("zones").is_dir());
    assert_eq!(scout.response_cache_stats().entry_count, 0);
    assert_eq!(scout.config().worker_pool_size, 4);
}

#[test]
fn test_presets() {
    assert_eq!(PRESETS.len(), 6);

    let barbershop = preset("Barbershop").unwrap();
    assert_eq!(barbershop.place_type, "hair_care");

    let request = barbershop.request(25.77, -80.19);
    assert_eq!(request.business_type, "hair_care");
    assert_eq!(request.radius_km, 3.0);
    assert_eq!(request.weights.weight(Metric::Population), 0.3);
    assert_eq!(request.weights.weight(Metric::TrafficScore), 0.0);
    assert!(request.validate().is_ok());

    for p in PRESETS.iter() {
        assert!(p.weights().validate().is_ok(), "{}", p.name);
    }

    assert!(preset("bakery").is_none());
}
