use crate::error::ScoutError;
use crate::zone::CandidateZone;
use std::path::Path;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Source of candidate zones around a center point.
#[async_trait::async_trait]
pub trait ZoneEnumerator: Send + Sync + 'static {
    async fn zones_within(
        &self,
        center_lat: f64,
        center_lng: f64,
        radius_km: f64,
    ) -> Result<Vec<CandidateZone>, ScoutError>;
}

/// Great-circle distance in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// In-memory table of ZIP centroids.
///
/// Selects zones whose centroid lies within the search radius, which stands in
/// for intersecting zone polygons with the search circle.
#[derive(Debug, Clone, Default)]
pub struct CentroidIndex {
    zones: Vec<CandidateZone>,
}

impl CentroidIndex {
    pub fn new(zones: Vec<CandidateZone>) -> Self {
        Self { zones }
    }

    /// Load `[{"zone_id": .., "lat": .., "lng": ..}, ...]` from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScoutError> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| ScoutError::Enumeration(format!("reading {}: {e}", path.display())))?;
        let zones: Vec<CandidateZone> = serde_json::from_slice(&data)
            .map_err(|e| ScoutError::Enumeration(format!("parsing {}: {e}", path.display())))?;
        Ok(Self::new(zones))
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

#[async_trait::async_trait]
impl ZoneEnumerator for CentroidIndex {
    async fn zones_within(
        &self,
        center_lat: f64,
        center_lng: f64,
        radius_km: f64,
    ) -> Result<Vec<CandidateZone>, ScoutError> {
        Ok(self
            .zones
            .iter()
            .filter(|z| haversine_km(center_lat, center_lng, z.lat, z.lng) <= radius_km)
            .cloned()
            .collect())
    }
}
