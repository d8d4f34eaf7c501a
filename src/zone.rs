//! Zone records, scoring output and weight configuration.

use crate::error::ScoutError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A candidate zone produced by a [`crate::enumerator::ZoneEnumerator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateZone {
    pub zone_id: String,
    pub lat: f64,
    pub lng: f64,
}

/// Derived metrics for one ZIP code, as persisted by the zone metrics cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRecord {
    pub zip_id: String,
    pub lat: f64,
    pub lng: f64,
    pub population: Option<i64>,
    pub median_income: Option<i64>,
    /// Affordability score in `0..=1`; higher means cheaper rent
    pub rent_cost: Option<f64>,
    pub traffic_score: Option<i64>,
    pub parking_score: Option<i64>,
    /// Competitor count per business type, filled in as types are queried
    #[serde(default)]
    pub competitors: BTreeMap<String, i64>,
}

impl ZoneRecord {
    pub fn empty(zip_id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            zip_id: zip_id.into(),
            lat,
            lng,
            population: None,
            median_income: None,
            rent_cost: None,
            traffic_score: None,
            parking_score: None,
            competitors: BTreeMap::new(),
        }
    }
}

/// A zone record resolved for one business type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedZone {
    pub record: ZoneRecord,
    pub competitor_count: Option<i64>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Population,
    MedianIncome,
    RentCost,
    TrafficScore,
    ParkingScore,
    CompetitorCount,
}

/// Whether a larger raw value makes a zone more or less attractive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    HigherIsWorse,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::TrafficScore,
        Metric::ParkingScore,
        Metric::Population,
        Metric::MedianIncome,
        Metric::RentCost,
        Metric::CompetitorCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::Population => "population",
            Metric::MedianIncome => "median_income",
            Metric::RentCost => "rent_cost",
            Metric::TrafficScore => "traffic_score",
            Metric::ParkingScore => "parking_score",
            Metric::CompetitorCount => "competitor_count",
        }
    }

    /// Key under which this metric is weighted in a [`WeightConfig`].
    pub fn weight_key(self) -> &'static str {
        match self {
            Metric::Population => "population",
            Metric::MedianIncome => "income",
            Metric::RentCost => "rent",
            Metric::TrafficScore => "traffic",
            Metric::ParkingScore => "parking",
            Metric::CompetitorCount => "competition",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Metric::RentCost | Metric::CompetitorCount => Direction::HigherIsWorse,
            _ => Direction::HigherIsBetter,
        }
    }

    pub fn value(self, zone: &EvaluatedZone) -> Option<f64> {
        let record = &zone.record;
        match self {
            Metric::Population => record.population.map(|v| v as f64),
            Metric::MedianIncome => record.median_income.map(|v| v as f64),
            Metric::RentCost => record.rent_cost,
            Metric::TrafficScore => record.traffic_score.map(|v| v as f64),
            Metric::ParkingScore => record.parking_score.map(|v| v as f64),
            Metric::CompetitorCount => zone.competitor_count.map(|v| v as f64),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Low,
    Medium,
    High,
}

impl Label {
    pub fn from_normalized(value: f64) -> Self {
        if value < 0.33 {
            Label::Low
        } else if value < 0.66 {
            Label::Medium
        } else {
            Label::High
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Label::Low => "Low",
            Label::Medium => "Medium",
            Label::High => "High",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub raw: f64,
    /// Min-max position of `raw` within the scored set, before any inversion
    pub normalized: f64,
    /// Value multiplied by the weight; `1 - normalized` for cost metrics
    pub contribution: f64,
    pub label: Label,
}

/// A ranked zone. Recomputed on every ranking call and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredZone {
    #[serde(flatten)]
    pub record: ZoneRecord,
    pub city: Option<String>,
    pub competitor_count: i64,
    pub score: f64,
    pub metrics: BTreeMap<Metric, MetricScore>,
    pub listing_url: Option<String>,
    pub commentary: Option<String>,
}

impl ScoredZone {
    pub fn metric(&self, metric: Metric) -> Option<&MetricScore> {
        self.metrics.get(&metric)
    }

    pub fn label(&self, metric: Metric) -> Option<Label> {
        self.metric(metric).map(|m| m.label)
    }
}

/// Non-negative weight per metric key; absent keys weigh zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightConfig(BTreeMap<String, f64>);

impl WeightConfig {
    pub const KEYS: [&'static str; 6] = [
        "population",
        "income",
        "rent",
        "competition",
        "traffic",
        "parking",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, weight: f64) -> Self {
        self.0.insert(key.to_string(), weight);
        self
    }

    pub fn set(&mut self, metric: Metric, weight: f64) {
        self.0.insert(metric.weight_key().to_string(), weight);
    }

    pub fn weight(&self, metric: Metric) -> f64 {
        self.0.get(metric.weight_key()).copied().unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<(), ScoutError> {
        for (key, weight) in &self.0 {
            if !Self::KEYS.contains(&key.as_str()) {
                return Err(ScoutError::InvalidRequest(format!(
                    "unknown weight '{key}'; expected one of {}",
                    Self::KEYS.join(", ")
                )));
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ScoutError::InvalidRequest(format!(
                    "weight '{key}' must be a non-negative number, got {weight}"
                )));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for WeightConfig {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, w)| (k.into(), w)).collect())
    }
}
