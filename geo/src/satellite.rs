//! Vegetation observations from satellite imagery.

use crate::error::GeoError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sprout_types::GeoPoint;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Greenness at a coordinate as seen from orbit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteObservation {
    /// Vegetation score in [0, 100].
    pub score: f64,
    /// Imagery provider or scene id.
    #[serde(default)]
    pub source: Option<String>,
}

/// Satellite vegetation source. Optional: without one the bonus stage is
/// reported as missing.
#[async_trait]
pub trait SatelliteLookup: Send + Sync {
    async fn observe(&self, point: GeoPoint) -> Result<SatelliteObservation, GeoError>;
}

/// Client for a vegetation-index service.
///
/// `GET {base_url}/vegetation?lat=..&lon=..` answering
/// `{"score": 0-100, "source": "..."}`.
pub struct HttpSatelliteClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpSatelliteClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SatelliteLookup for HttpSatelliteClient {
    async fn observe(&self, point: GeoPoint) -> Result<SatelliteObservation, GeoError> {
        let url = format!("{}/vegetation", self.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .get(&url)
            .query(&[("lat", point.lat.to_string()), ("lon", point.lon.to_string())])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    GeoError::Unreachable(format!("satellite service: {e}"))
                } else {
                    GeoError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GeoError::RequestFailed(format!("HTTP status {}", response.status())));
        }

        let observation: SatelliteObservation = response
            .json()
            .await
            .map_err(|e| GeoError::InvalidResponse(format!("failed to parse satellite response: {e}")))?;
        checked(observation)
    }
}

fn checked(mut observation: SatelliteObservation) -> Result<SatelliteObservation, GeoError> {
    if !observation.score.is_finite() {
        return Err(GeoError::InvalidResponse(format!(
            "vegetation score {} is not a number",
            observation.score
        )));
    }
    observation.score = observation.score.clamp(0.0, 100.0);
    Ok(observation)
}
