//! Coordinates and the registration-time location baseline.

use crate::error::InputError;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// A WGS-84 coordinate pair in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting NaN and out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, InputError> {
        if !lat.is_finite() || !lon.is_finite() || !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(InputError::CoordinatesOutOfRange { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Parse the free-form formats field apps send:
    /// `"19.0760° N, 72.8777° E"`, `"19.0760, 72.8777"`, `"(19.0760, 72.8777)"`.
    ///
    /// Hemisphere letters `S` and `W` negate the value.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        let malformed = || InputError::MalformedCoordinates(raw.to_string());
        let cleaned = raw.trim().trim_start_matches('(').trim_end_matches(')');
        let mut parts = cleaned.split(',');
        let (Some(a), Some(b), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let lat = parse_component(a, 'N', 'S').ok_or_else(malformed)?;
        let lon = parse_component(b, 'E', 'W').ok_or_else(malformed)?;
        Self::new(lat, lon)
    }

    /// Quantised key used to compare coordinates for exact repeats.
    ///
    /// 1e-7 degrees is roughly one centimetre at the equator.
    pub fn repeat_key(&self) -> (i64, i64) {
        (
            (self.lat * 1e7).round() as i64,
            (self.lon * 1e7).round() as i64,
        )
    }
}

fn parse_component(raw: &str, positive: char, negative: char) -> Option<f64> {
    let mut s = raw.trim().replace('°', "");
    let mut sign = 1.0;
    if let Some(last) = s.chars().last() {
        let upper = last.to_ascii_uppercase();
        if upper == positive || upper == negative {
            if upper == negative {
                sign = -1.0;
            }
            s.pop();
        }
    }
    s.trim().parse::<f64>().ok().map(|v| v * sign)
}

/// Immutable snapshot of a plant's coordinates at registration (or first claim).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationProfile {
    pub point: GeoPoint,
    pub recorded_at: Timestamp,
}

impl LocationProfile {
    pub fn new(point: GeoPoint, recorded_at: Timestamp) -> Self {
        Self { point, recorded_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_formats() {
        let expected = GeoPoint::new(19.0760, 72.8777).unwrap();
        assert_eq!(GeoPoint::parse("19.0760° N, 72.8777° E").unwrap(), expected);
        assert_eq!(GeoPoint::parse("19.0760, 72.8777").unwrap(), expected);
        assert_eq!(GeoPoint::parse("(19.0760, 72.8777)").unwrap(), expected);
    }

    #[test]
    fn southern_and_western_hemispheres_are_negative() {
        let p = GeoPoint::parse("33.8688 S, 151.2093 E").unwrap();
        assert!(p.lat < 0.0 && p.lon > 0.0);
        let p = GeoPoint::parse("40.7128N, 74.0060W").unwrap();
        assert!(p.lon < 0.0);
    }

    #[test]
    fn rejects_garbage_and_out_of_range() {
        assert!(matches!(
            GeoPoint::parse("invalid coords"),
            Err(InputError::MalformedCoordinates(_))
        ));
        assert!(matches!(
            GeoPoint::new(91.0, 0.0),
            Err(InputError::CoordinatesOutOfRange { .. })
        ));
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn repeat_key_is_stable_for_equal_points() {
        let a = GeoPoint::new(19.0760, 72.8777).unwrap();
        let b = GeoPoint::new(19.076_000_001, 72.8777).unwrap();
        assert_eq!(a.repeat_key(), b.repeat_key());
    }
}
