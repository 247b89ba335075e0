//! Local weather and time-of-day context for a coordinate.

use crate::error::GeoError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sprout_types::GeoPoint;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// What the weather service reports for a location right now.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherContext {
    /// Degrees Celsius.
    pub temperature: f64,
    pub conditions: String,
    /// `None` when the service did not report sunrise/sunset.
    pub is_daylight: Option<bool>,
    /// Relative humidity in percent.
    #[serde(default)]
    pub humidity: Option<f64>,
    /// Rain over the last hour, in millimetres.
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuitabilityRating {
    Excellent,
    Good,
    Moderate,
    Poor,
}

/// How favourable current conditions are for putting a sapling in the ground.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantingSuitability {
    /// Starts at 100 and loses points per unfavourable condition.
    pub score: u32,
    pub rating: SuitabilityRating,
    /// False only for a poor rating.
    pub suitable: bool,
    pub notes: Vec<String>,
}

impl WeatherContext {
    /// Rate the conditions for planting. Unknown humidity or rain costs nothing.
    pub fn planting_suitability(&self) -> PlantingSuitability {
        let mut score: u32 = 100;
        let mut notes = Vec::new();

        if self.temperature < 0.0 {
            score -= 50;
            notes.push("below freezing, unsuitable for planting".to_string());
        } else if self.temperature < 5.0 {
            score -= 20;
            notes.push("very cold, planting may be difficult".to_string());
        } else if self.temperature > 40.0 {
            score -= 15;
            notes.push("very hot, needs extra watering".to_string());
        }
        if self.precipitation_mm.is_some_and(|mm| mm > 50.0) {
            score -= 10;
            notes.push("heavy rain may delay planting".to_string());
        }
        if self.humidity.is_some_and(|h| h < 20.0) {
            score -= 10;
            notes.push("low humidity, needs frequent watering".to_string());
        }

        let rating = match score {
            80.. => SuitabilityRating::Excellent,
            60..=79 => SuitabilityRating::Good,
            40..=59 => SuitabilityRating::Moderate,
            _ => SuitabilityRating::Poor,
        };
        PlantingSuitability {
            score,
            rating,
            suitable: rating != SuitabilityRating::Poor,
            notes,
        }
    }
}

/// Weather / geo-context source. Optional: without one, only the weather
/// heuristic is skipped.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn lookup(&self, point: GeoPoint) -> Result<WeatherContext, GeoError>;
}

/// Client for an OpenWeather-compatible current-weather endpoint.
///
/// `GET {base_url}/data/2.5/weather?lat=..&lon=..&appid=..&units=metric`
pub struct OpenWeatherClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainBlock,
    #[serde(default)]
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    dt: Option<u64>,
    #[serde(default)]
    sys: Option<SysBlock>,
    #[serde(default)]
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    #[serde(default)]
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RainBlock {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    description: String,
}

#[derive(Debug, Deserialize)]
struct SysBlock {
    sunrise: Option<u64>,
    sunset: Option<u64>,
}

impl OpenWeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl WeatherLookup for OpenWeatherClient {
    async fn lookup(&self, point: GeoPoint) -> Result<WeatherContext, GeoError> {
        let url = format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'));
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("lat", point.lat.to_string()),
                ("lon", point.lon.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeoError::Unreachable(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    GeoError::Unreachable(format!("connection failed: {e}"))
                } else {
                    GeoError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GeoError::RequestFailed(format!("HTTP status {}", response.status())));
        }

        let body: CurrentWeather = response
            .json()
            .await
            .map_err(|e| GeoError::InvalidResponse(format!("failed to parse weather response: {e}")))?;

        Ok(body.into_context())
    }
}

impl CurrentWeather {
    fn into_context(self) -> WeatherContext {
        let is_daylight = match (self.dt, self.sys.as_ref().and_then(|s| s.sunrise.zip(s.sunset))) {
            (Some(now), Some((rise, set))) => Some(now >= rise && now < set),
            _ => None,
        };
        WeatherContext {
            temperature: self.main.temp,
            conditions: self
                .weather
                .into_iter()
                .next()
                .map(|c| c.description)
                .unwrap_or_default(),
            is_daylight,
            humidity: self.main.humidity,
            precipitation_mm: self.rain.and_then(|r| r.one_hour),
        }
    }
}
