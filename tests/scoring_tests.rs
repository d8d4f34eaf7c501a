use std::collections::BTreeMap;
use zone_scout::{score, EvaluatedZone, Label, Metric, WeightConfig, ZoneRecord};

fn zone(zip: &str, traffic: i64) -> EvaluatedZone {
    EvaluatedZone {
        record: ZoneRecord {
            population: Some(10_000),
            median_income: Some(50_000),
            rent_cost: Some(0.5),
            traffic_score: Some(traffic),
            parking_score: Some(5),
            competitors: BTreeMap::from([("restaurant".to_string(), 8)]),
            ..ZoneRecord::empty(zip, 25.0, -80.0)
        },
        competitor_count: Some(8),
        city: Some("Miami".to_string()),
    }
}

fn all_weights(weight: f64) -> WeightConfig {
    WeightConfig::KEYS.iter().map(|key| (*key, weight)).collect()
}

fn zips(scored: &[zone_scout::ScoredZone]) -> Vec<&str> {
    scored.iter().map(|z| z.record.zip_id.as_str()).collect()
}

#[test]
fn test_single_metric_ordering() {
    let zones = vec![zone("A", 10), zone("B", 20), zone("C", 30)];
    let weights = WeightConfig::new().with("traffic", 1.0);

    let scored = score(&zones, &weights);

    assert_eq!(zips(&scored), ["C", "B", "A"]);
    let scores: Vec<f64> = scored.iter().map(|z| z.score).collect();
    assert_eq!(scores, [1.0, 0.5, 0.0]);
}

#[test]
fn test_identical_zones_get_full_weight_everywhere() {
    let zones = vec![zone("A", 7), zone("B", 7), zone("C", 7)];

    let scored = score(&zones, &all_weights(1.0));

    assert_eq!(scored.len(), 3);
    for z in &scored {
        assert_eq!(z.score, 6.0);
        assert_eq!(z.metric(Metric::TrafficScore).unwrap().normalized, 1.0);
        assert_eq!(z.metric(Metric::CompetitorCount).unwrap().normalized, 0.0);
        assert_eq!(z.metric(Metric::CompetitorCount).unwrap().contribution, 1.0);
    }
    // Ties keep input order
    assert_eq!(zips(&scored), ["A", "B", "C"]);
}

#[test]
fn test_cost_metrics_are_inverted() {
    let mut quiet = zone("quiet", 1);
    quiet.record.rent_cost = Some(0.2);
    quiet.competitor_count = Some(2);
    let mut crowded = zone("crowded", 1);
    crowded.record.rent_cost = Some(0.8);
    crowded.competitor_count = Some(20);

    let weights = WeightConfig::new().with("rent", 1.0).with("competition", 1.0);
    let scored = score(&[crowded, quiet], &weights);

    assert_eq!(zips(&scored), ["quiet", "crowded"]);
    assert_eq!(scored[0].score, 2.0);
    assert_eq!(scored[1].score, 0.0);

    let competition = scored[1].metric(Metric::CompetitorCount).unwrap();
    assert_eq!(competition.raw, 20.0);
    assert_eq!(competition.normalized, 1.0);
    assert_eq!(competition.contribution, 0.0);
    // Labels describe the raw level, not its desirability
    assert_eq!(competition.label, Label::High);
}

#[test]
fn test_zone_missing_a_metric_is_excluded() {
    let mut unknown_income = zone("B", 20);
    unknown_income.record.median_income = None;
    let mut no_competitors = zone("C", 30);
    no_competitors.competitor_count = None;

    let scored = score(
        &[zone("A", 10), unknown_income, no_competitors, zone("D", 40)],
        &all_weights(1.0),
    );

    assert_eq!(zips(&scored), ["D", "A"]);
    // Ranges come from the scored zones only
    assert_eq!(scored[1].metric(Metric::TrafficScore).unwrap().normalized, 0.0);
}

#[test]
fn test_empty_input_and_all_excluded() {
    assert!(score(&[], &all_weights(1.0)).is_empty());

    let mut broken = zone("A", 1);
    broken.record.population = None;
    assert!(score(&[broken], &all_weights(1.0)).is_empty());
}

#[test]
fn test_absent_weights_count_as_zero() {
    let zones = vec![zone("A", 10), zone("B", 20)];

    let scored = score(&zones, &WeightConfig::new());

    assert!(scored.iter().all(|z| z.score == 0.0));
    assert_eq!(zips(&scored), ["A", "B"]);
}

#[test]
fn test_labels_follow_thresholds() {
    let zones: Vec<_> = [0, 32, 33, 65, 66, 100]
        .into_iter()
        .map(|traffic| zone(&format!("z{traffic}"), traffic))
        .collect();

    let scored = score(&zones, &WeightConfig::new().with("traffic", 1.0));
    let label_of = |zip: &str| {
        scored
            .iter()
            .find(|z| z.record.zip_id == zip)
            .and_then(|z| z.label(Metric::TrafficScore))
            .unwrap()
    };

    assert_eq!(label_of("z0"), Label::Low);
    assert_eq!(label_of("z32"), Label::Low);
    assert_eq!(label_of("z33"), Label::Medium);
    assert_eq!(label_of("z65"), Label::Medium);
    assert_eq!(label_of("z66"), Label::High);
    assert_eq!(label_of("z100"), Label::High);
}

#[test]
fn test_scores_are_rounded_to_four_places() {
    let zones = vec![zone("A", 0), zone("B", 1), zone("C", 3)];

    let scored = score(&zones, &WeightConfig::new().with("traffic", 1.0));

    let middle = scored.iter().find(|z| z.record.zip_id == "B").unwrap();
    assert_eq!(middle.score, 0.3333);
    assert_eq!(middle.label(Metric::TrafficScore), Some(Label::Medium));
}

#[test]
fn test_scoring_is_deterministic() {
    let zones: Vec<_> = (0..20).map(|i| zone(&format!("{i:05}"), (i * 7) % 11)).collect();
    let weights = WeightConfig::new()
        .with("traffic", 0.4)
        .with("population", 0.3)
        .with("competition", 0.3);

    let first = score(&zones, &weights);
    let second = score(&zones, &weights);

    assert_eq!(first, second);
}

#[test]
fn test_every_metric_is_reported() {
    let scored = score(&[zone("A", 1), zone("B", 2)], &all_weights(0.5));

    for z in &scored {
        assert_eq!(z.metrics.len(), 6);
        for metric in Metric::ALL {
            assert!(z.metric(metric).is_some(), "missing {metric}");
        }
        assert_eq!(z.competitor_count, 8);
        assert_eq!(z.city.as_deref(), Some("Miami"));
        assert!(z.listing_url.is_none());
    }
}

#[test]
fn test_weight_validation() {
    assert!(all_weights(0.2).validate().is_ok());
    assert!(WeightConfig::new().validate().is_ok());
    assert!(WeightConfig::new().with("vibes", 1.0).validate().is_err());
    assert!(WeightConfig::new().with("traffic", -0.1).validate().is_err());
    assert!(WeightConfig::new().with("traffic", f64::NAN).validate().is_err());

    let mut weights = WeightConfig::new();
    weights.set(Metric::MedianIncome, 0.7);
    assert_eq!(weights.weight(Metric::MedianIncome), 0.7);
    assert_eq!(weights.weight(Metric::RentCost), 0.0);
}

#[test]
fn test_weights_deserialize_from_plain_map() {
    let weights: WeightConfig =
        serde_json::from_str(r#"{"population": 0.3, "competition": 0.3, "traffic": 0.4}"#).unwrap();

    assert_eq!(weights.weight(Metric::Population), 0.3);
    assert_eq!(weights.weight(Metric::CompetitorCount), 0.3);
    assert_eq!(weights.weight(Metric::TrafficScore), 0.4);
    assert_eq!(weights.weight(Metric::ParkingScore), 0.0);
}
