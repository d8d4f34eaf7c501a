//! Min-max normalization and weighted composite scoring.
//!
//! Each metric is normalized independently over the zones that have all six
//! metrics. Cost metrics (`rent_cost`, `competitor_count`) contribute
//! `1 - normalized`. When every zone shares the same value the normalized
//! value is 1.0 for benefit metrics and 0.0 for cost metrics, so the metric
//! contributes its full weight to every zone.

use crate::zone::{Direction, EvaluatedZone, Label, Metric, MetricScore, ScoredZone, WeightConfig};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn normalize(&self, value: f64, direction: Direction) -> f64 {
        if self.max > self.min {
            (value - self.min) / (self.max - self.min)
        } else {
            match direction {
                Direction::HigherIsBetter => 1.0,
                Direction::HigherIsWorse => 0.0,
            }
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// All six metric values, or `None` if the zone cannot be scored.
fn complete_values(zone: &EvaluatedZone) -> Option<[f64; 6]> {
    let mut values = [0.0; 6];
    for (slot, metric) in values.iter_mut().zip(Metric::ALL) {
        let value = metric.value(zone)?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }
    Some(values)
}

/// Score and rank zones, best first. Zones missing any metric are omitted.
pub fn score(zones: &[EvaluatedZone], weights: &WeightConfig) -> Vec<ScoredZone> {
    let valid: Vec<(&EvaluatedZone, [f64; 6])> = zones
        .iter()
        .filter_map(|zone| complete_values(zone).map(|values| (zone, values)))
        .collect();

    let excluded = zones.len() - valid.len();
    if excluded > 0 {
        tracing::debug!(excluded, "Zones excluded from scoring for missing metrics");
    }
    if valid.is_empty() {
        return Vec::new();
    }

    let mut ranges = [Range {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    }; 6];
    for (_, values) in &valid {
        for (range, value) in ranges.iter_mut().zip(values) {
            range.min = range.min.min(*value);
            range.max = range.max.max(*value);
        }
    }

    let mut scored: Vec<ScoredZone> = valid
        .into_iter()
        .map(|(zone, values)| {
            let mut metrics = BTreeMap::new();
            let mut total = 0.0;

            for ((metric, range), raw) in Metric::ALL.iter().zip(&ranges).zip(values) {
                let direction = metric.direction();
                let normalized = range.normalize(raw, direction);
                let contribution = match direction {
                    Direction::HigherIsBetter => normalized,
                    Direction::HigherIsWorse => 1.0 - normalized,
                };
                total += contribution * weights.weight(*metric);
                metrics.insert(
                    *metric,
                    MetricScore {
                        raw,
                        normalized,
                        contribution,
                        label: Label::from_normalized(normalized),
                    },
                );
            }

            ScoredZone {
                record: zone.record.clone(),
                city: zone.city.clone(),
                competitor_count: zone.competitor_count.unwrap_or_default(),
                score: round4(total),
                metrics,
                listing_url: None,
                commentary: None,
            }
        })
        .collect();

    // Stable: equal scores keep their input order.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}
