//! Fixed weather answers.

use async_trait::async_trait;
use sprout_geo::{GeoError, WeatherContext, WeatherLookup};
use sprout_types::GeoPoint;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct NullWeather {
    answer: Result<WeatherContext, GeoError>,
    delay: Option<Duration>,
}

impl NullWeather {
    pub fn daylight() -> Self {
        Self::reporting(WeatherContext {
            temperature: 30.0,
            conditions: "clear sky".into(),
            is_daylight: Some(true),
            humidity: Some(55.0),
            precipitation_mm: None,
        })
    }

    pub fn night() -> Self {
        Self::reporting(WeatherContext {
            temperature: 22.0,
            conditions: "clear sky".into(),
            is_daylight: Some(false),
            humidity: Some(70.0),
            precipitation_mm: None,
        })
    }

    pub fn reporting(ctx: WeatherContext) -> Self {
        Self {
            answer: Ok(ctx),
            delay: None,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            answer: Err(GeoError::Unreachable("null weather offline".into())),
            delay: None,
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl WeatherLookup for NullWeather {
    async fn lookup(&self, _point: GeoPoint) -> Result<WeatherContext, GeoError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer.clone()
    }
}
