//! Fixed vegetation observations.

use async_trait::async_trait;
use sprout_geo::{GeoError, SatelliteLookup, SatelliteObservation};
use sprout_types::GeoPoint;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
pub struct NullSatellite {
    answer: Result<SatelliteObservation, GeoError>,
    calls: AtomicU32,
}

impl NullSatellite {
    pub fn scoring(score: f64) -> Self {
        Self {
            answer: Ok(SatelliteObservation {
                score,
                source: Some("null-satellite".into()),
            }),
            calls: AtomicU32::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            answer: Err(GeoError::Unreachable("null satellite offline".into())),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SatelliteLookup for NullSatellite {
    async fn observe(&self, _point: GeoPoint) -> Result<SatelliteObservation, GeoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}
