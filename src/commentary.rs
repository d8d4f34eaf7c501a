use crate::fetchers::geocode::Geocoder;
use crate::llm::TextModel;
use crate::zone::{Label, Metric, ScoredZone};
use std::sync::Arc;
use tracing::Instrument;

fn label_text(zone: &ScoredZone, metric: Metric) -> String {
    zone.label(metric)
        .map(|label: Label| label.to_string())
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn lifestyle_prompt(zone: &ScoredZone, zone_name: &str, business_type: &str) -> String {
    let record = &zone.record;
    let value = |v: Option<i64>| v.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string());

    format!(
        "You are assessing whether {zone_name} is a good place to open a {business_type}.\n\
         Metrics (labels are relative to the other candidate areas):\n\
         - Population: {} ({})\n\
         - Median income: ${} ({})\n\
         - Rent score: {} ({}; a lower score means more expensive rent)\n\
         - Competitors: {} ({})\n\
         - Transit stops: {} ({})\n\
         - Parking: {} ({})\n\
         Location: ({}, {})\n\n\
         Write three short paragraphs: first the strengths of the area, then the \
         drawbacks for a {business_type}, then a one-paragraph recommendation. \
         Use what you know about the area; be practical and constructive.",
        value(record.population),
        label_text(zone, Metric::Population),
        value(record.median_income),
        label_text(zone, Metric::MedianIncome),
        record.rent_cost.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string()),
        label_text(zone, Metric::RentCost),
        zone.competitor_count,
        label_text(zone, Metric::CompetitorCount),
        value(record.traffic_score),
        label_text(zone, Metric::TrafficScore),
        value(record.parking_score),
        label_text(zone, Metric::ParkingScore),
        record.lat,
        record.lng,
    )
}

/// Attaches LLM prose about each ranked zone. Presentation only; never affects scores.
pub struct Commentator {
    model: Arc<dyn TextModel>,
}

impl Commentator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    pub async fn annotate(&self, zones: &mut [ScoredZone], geocoder: &Geocoder, business_type: &str) {
        for zone in zones.iter_mut() {
            let span = tracing::info_span!("zone", zone = %zone.record.zip_id);
            let lookup = geocoder.neighborhood(zone.record.lat, zone.record.lng);
            let zone_name = match lookup.instrument(span).await {
                Some(name) => name,
                None => format!("ZIP code {}", zone.record.zip_id),
            };

            let prompt = lifestyle_prompt(zone, &zone_name, business_type);
            zone.commentary = match self.model.generate(&prompt).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(zone = %zone.record.zip_id, "Commentary generation failed: {}", e);
                    None
                }
            };
        }
    }
}
