use crate::ranking::RankRequest;
use crate::zone::WeightConfig;

/// Suggested search radius and weights for a kind of business.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessPreset {
    pub name: &'static str,
    pub label: &'static str,
    /// Places category searched for competitors
    pub place_type: &'static str,
    pub radius_km: f64,
    /// rent, competition, population, income, traffic, parking
    weights: [f64; 6],
}

impl BusinessPreset {
    pub fn weights(&self) -> WeightConfig {
        ["rent", "competition", "population", "income", "traffic", "parking"]
            .into_iter()
            .zip(self.weights)
            .collect()
    }

    /// Ranking request centered on `(lat, lng)` using this preset's radius and weights.
    pub fn request(&self, lat: f64, lng: f64) -> RankRequest {
        RankRequest {
            radius_km: self.radius_km,
            business_type: self.place_type.to_string(),
            ..RankRequest::new(lat, lng, self.weights())
        }
    }
}

pub static PRESETS: [BusinessPreset; 6] = [
    BusinessPreset {
        name: "barbershop",
        label: "Barbershop / Salon",
        place_type: "hair_care",
        radius_km: 3.0,
        weights: [0.2, 0.2, 0.3, 0.1, 0.0, 0.2],
    },
    BusinessPreset {
        name: "cafe",
        label: "Café / Coffee shop",
        place_type: "cafe",
        radius_km: 3.0,
        weights: [0.15, 0.25, 0.25, 0.15, 0.1, 0.1],
    },
    BusinessPreset {
        name: "restaurant",
        label: "Restaurant",
        place_type: "restaurant",
        radius_km: 4.0,
        weights: [0.15, 0.25, 0.2, 0.2, 0.15, 0.05],
    },
    BusinessPreset {
        name: "retail",
        label: "Retail boutique",
        place_type: "clothing_store",
        radius_km: 4.0,
        weights: [0.25, 0.2, 0.25, 0.15, 0.05, 0.1],
    },
    BusinessPreset {
        name: "gym",
        label: "Gym / Fitness studio",
        place_type: "gym",
        radius_km: 5.0,
        weights: [0.2, 0.2, 0.25, 0.15, 0.05, 0.15],
    },
    BusinessPreset {
        name: "warehouse",
        label: "Warehouse / Fulfilment",
        place_type: "storage",
        radius_km: 5.0,
        weights: [0.35, 0.0, 0.0, 0.0, 0.1, 0.55],
    },
];

pub fn preset(name: &str) -> Option<&'static BusinessPreset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
