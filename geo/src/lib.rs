//! Geo-consistency checker.
//!
//! Compares a claimed coordinate against the plant's registration baseline,
//! raises spoofing-suspicion flags, and (when a weather source is configured)
//! cross-checks the claim against the local time-of-day. Satellite vegetation
//! observations for a coordinate also come from here.

pub mod checker;
pub mod distance;
pub mod error;
pub mod satellite;
pub mod weather;

pub use checker::{GeoChecker, GeoParams, GeoReport, SuspicionFlag};
pub use distance::{decimal_places, haversine_m, EARTH_RADIUS_M};
pub use error::GeoError;
pub use satellite::{HttpSatelliteClient, SatelliteLookup, SatelliteObservation};
pub use weather::{OpenWeatherClient, PlantingSuitability, SuitabilityRating, WeatherContext, WeatherLookup};
