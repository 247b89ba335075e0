//! The geo-consistency check.

use crate::distance::{decimal_places, haversine_m};
use crate::weather::{PlantingSuitability, WeatherContext, WeatherLookup};
use serde::{Deserialize, Serialize};
use sprout_types::{GeoPoint, LocationProfile, PlantId, Timestamp, VerificationParams};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct GeoParams {
    pub radius_m: f64,
    pub min_decimals: u32,
    pub max_identical_claims: u32,
    pub repeat_window_secs: u64,
    pub flag_penalty: f64,
    /// A weather answer slower than this is dropped and the daylight check skipped.
    pub weather_timeout: Duration,
}

impl GeoParams {
    /// The radius is inclusive: a claim exactly on the boundary passes.
    pub fn within_radius(&self, distance_m: f64) -> bool {
        distance_m <= self.radius_m
    }
}

impl From<&VerificationParams> for GeoParams {
    fn from(p: &VerificationParams) -> Self {
        Self {
            radius_m: p.geo_radius_m,
            min_decimals: p.min_coordinate_decimals,
            max_identical_claims: p.max_identical_claims,
            repeat_window_secs: p.repeat_window_secs,
            flag_penalty: p.geo_flag_penalty,
            weather_timeout: Duration::from_millis(p.stage_timeout_ms),
        }
    }
}

impl Default for GeoParams {
    fn default() -> Self {
        Self::from(&VerificationParams::default())
    }
}

/// A spoofing heuristic that fired. None of these rejects a claim on its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum SuspicionFlag {
    /// Fewer decimal places than a real GPS fix usually carries.
    LowPrecision { lat_decimals: u32, lon_decimals: u32 },
    /// The exact same coordinate was claimed for `count` different plants
    /// inside the repeat window.
    RepeatedCoordinates { count: u32 },
    /// The device reported daylight (or darkness) that contradicts local time.
    DaylightMismatch { claimed_daylight: bool, local_daylight: bool },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoReport {
    /// Distance from the baseline; zero when this claim created the baseline.
    pub distance_m: f64,
    pub within_threshold: bool,
    pub radius_m: f64,
    pub suspicion_flags: Vec<SuspicionFlag>,
    /// Set on the first claim for a plant with no baseline yet.
    pub created_profile: Option<LocationProfile>,
    pub weather: Option<WeatherContext>,
    /// Filled in by the caller for planting claims when weather is known.
    #[serde(default)]
    pub planting_suitability: Option<PlantingSuitability>,
    /// Stage score in [0, 100].
    pub score: f64,
}

/// Which plants claimed each exact coordinate, and when they last did.
///
/// Entries older than the window are dropped on every update, so the tally
/// only holds coordinates seen recently.
#[derive(Debug, Default)]
struct RepeatTracker {
    seen: HashMap<(i64, i64), HashMap<PlantId, Timestamp>>,
}

impl RepeatTracker {
    /// Record `plant` at `point` and return how many distinct plants claimed
    /// that point within the window.
    fn record(&mut self, plant: &PlantId, point: &GeoPoint, window_secs: u64, now: Timestamp) -> u32 {
        self.seen.retain(|_, plants| {
            plants.retain(|_, last| !last.has_expired(window_secs, now));
            !plants.is_empty()
        });
        let plants = self.seen.entry(point.repeat_key()).or_default();
        plants.insert(plant.clone(), now);
        plants.len() as u32
    }
}

/// Checks claimed coordinates against a plant's baseline.
pub struct GeoChecker {
    params: GeoParams,
    weather: Option<Arc<dyn WeatherLookup>>,
    repeats: Mutex<RepeatTracker>,
}

impl GeoChecker {
    pub fn new(params: GeoParams) -> Self {
        Self {
            params,
            weather: None,
            repeats: Mutex::new(RepeatTracker::default()),
        }
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherLookup>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn params(&self) -> &GeoParams {
        &self.params
    }

    /// Run the check.
    ///
    /// `observed_daylight` is what the capture device reported, if anything.
    /// Without both that and a weather answer inside the weather timeout the
    /// daylight heuristic is skipped; the rest of the check always completes.
    pub async fn check(
        &self,
        plant: &PlantId,
        claimed: GeoPoint,
        profile: Option<&LocationProfile>,
        observed_daylight: Option<bool>,
        now: Timestamp,
    ) -> GeoReport {
        let mut flags = Vec::new();

        let (lat_decimals, lon_decimals) = (decimal_places(claimed.lat), decimal_places(claimed.lon));
        if lat_decimals < self.params.min_decimals || lon_decimals < self.params.min_decimals {
            flags.push(SuspicionFlag::LowPrecision { lat_decimals, lon_decimals });
        }

        let count = self.record_claim(plant, &claimed, now);
        if count > self.params.max_identical_claims {
            flags.push(SuspicionFlag::RepeatedCoordinates { count });
        }

        let weather = match &self.weather {
            Some(lookup) => match tokio::time::timeout(self.params.weather_timeout, lookup.lookup(claimed)).await {
                Ok(Ok(ctx)) => Some(ctx),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "weather lookup failed, skipping daylight check");
                    None
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.params.weather_timeout.as_millis() as u64,
                        "weather lookup timed out, skipping daylight check"
                    );
                    None
                }
            },
            None => None,
        };
        if let (Some(claimed_daylight), Some(local_daylight)) =
            (observed_daylight, weather.as_ref().and_then(|w| w.is_daylight))
        {
            if claimed_daylight != local_daylight {
                flags.push(SuspicionFlag::DaylightMismatch { claimed_daylight, local_daylight });
            }
        }

        let (distance_m, within_threshold, created_profile) = match profile {
            Some(baseline) => {
                let d = haversine_m(&baseline.point, &claimed);
                (d, self.params.within_radius(d), None)
            }
            None => (0.0, true, Some(LocationProfile::new(claimed, now))),
        };

        let score = if within_threshold {
            (100.0 - self.params.flag_penalty * flags.len() as f64).max(0.0)
        } else {
            0.0
        };

        if !flags.is_empty() {
            tracing::debug!(?flags, "geo suspicion flags raised");
        }

        GeoReport {
            distance_m,
            within_threshold,
            radius_m: self.params.radius_m,
            suspicion_flags: flags,
            created_profile,
            weather,
            planting_suitability: None,
            score,
        }
    }

    /// Coordinates currently held by the repeat tally.
    pub fn tracked_points(&self) -> usize {
        self.repeats.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).seen.len()
    }

    fn record_claim(&self, plant: &PlantId, point: &GeoPoint, now: Timestamp) -> u32 {
        let mut repeats = self.repeats.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        repeats.record(plant, point, self.params.repeat_window_secs, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoError;
    use async_trait::async_trait;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    fn plant(id: &str) -> PlantId {
        PlantId::parse(id).unwrap()
    }

    fn tulsi() -> PlantId {
        plant("tulsi-1")
    }

    fn baseline() -> LocationProfile {
        LocationProfile::new(p(19.076, 72.8777), Timestamp::new(1_700_000_000))
    }

    struct Fixed(Result<WeatherContext, GeoError>);

    #[async_trait]
    impl WeatherLookup for Fixed {
        async fn lookup(&self, _point: GeoPoint) -> Result<WeatherContext, GeoError> {
            self.0.clone()
        }
    }

    struct Slow;

    #[async_trait]
    impl WeatherLookup for Slow {
        async fn lookup(&self, _point: GeoPoint) -> Result<WeatherContext, GeoError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(night())
        }
    }

    fn night() -> WeatherContext {
        WeatherContext {
            temperature: 24.0,
            conditions: "clear sky".into(),
            is_daylight: Some(false),
            humidity: None,
            precipitation_mm: None,
        }
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let params = GeoParams::default();
        assert!(params.within_radius(50.0));
        assert!(!params.within_radius(50.01));
    }

    #[tokio::test]
    async fn same_point_passes_with_full_score() {
        let checker = GeoChecker::new(GeoParams::default());
        let r = checker.check(&tulsi(), p(19.076, 72.8777), Some(&baseline()), None, Timestamp::new(0)).await;
        assert_eq!(r.distance_m, 0.0);
        assert!(r.within_threshold);
        assert!(r.suspicion_flags.is_empty());
        assert_eq!(r.score, 100.0);
        assert!(r.created_profile.is_none());
    }

    #[tokio::test]
    async fn far_point_fails() {
        let checker = GeoChecker::new(GeoParams::default());
        // ~111 m north
        let r = checker.check(&tulsi(), p(19.077, 72.8777), Some(&baseline()), None, Timestamp::new(0)).await;
        assert!(r.distance_m > 100.0);
        assert!(!r.within_threshold);
        assert_eq!(r.score, 0.0);
    }

    #[tokio::test]
    async fn first_claim_creates_profile() {
        let checker = GeoChecker::new(GeoParams::default());
        let now = Timestamp::new(1_700_000_500);
        let r = checker.check(&tulsi(), p(22.7196, 75.8577), None, None, now).await;
        assert!(r.within_threshold);
        let created = r.created_profile.unwrap();
        assert_eq!(created.point, p(22.7196, 75.8577));
        assert_eq!(created.recorded_at, now);
    }

    #[tokio::test]
    async fn low_precision_is_flagged_not_fatal() {
        let checker = GeoChecker::new(GeoParams::default());
        let profile = LocationProfile::new(p(22.0, 75.0), Timestamp::new(0));
        let r = checker.check(&tulsi(), p(22.0, 75.0), Some(&profile), None, Timestamp::new(0)).await;
        assert!(r.within_threshold);
        assert_eq!(
            r.suspicion_flags,
            vec![SuspicionFlag::LowPrecision { lat_decimals: 0, lon_decimals: 0 }]
        );
        assert_eq!(r.score, 75.0);
    }

    #[tokio::test]
    async fn one_point_shared_by_many_plants_is_flagged() {
        let checker = GeoChecker::new(GeoParams::default());
        let point = p(19.076, 72.8777);
        let now = Timestamp::new(1_700_000_000);
        for i in 0..5 {
            let r = checker.check(&plant(&format!("p-{i}")), point, Some(&baseline()), None, now).await;
            assert!(r.suspicion_flags.is_empty());
        }
        let r = checker.check(&plant("p-5"), point, Some(&baseline()), None, now).await;
        assert_eq!(r.suspicion_flags, vec![SuspicionFlag::RepeatedCoordinates { count: 6 }]);
    }

    #[tokio::test]
    async fn owner_reusing_their_own_fix_is_never_flagged() {
        let checker = GeoChecker::new(GeoParams::default());
        let point = p(19.076, 72.8777);
        for day in 0..30 {
            let now = Timestamp::new(1_700_000_000 + day * 86_400);
            let r = checker.check(&tulsi(), point, Some(&baseline()), None, now).await;
            assert!(r.suspicion_flags.is_empty(), "flagged on day {day}");
        }
    }

    #[tokio::test]
    async fn repeat_tally_forgets_old_claims() {
        let checker = GeoChecker::new(GeoParams::default());
        let start = Timestamp::new(1_700_000_000);
        for i in 0..100u32 {
            let point = p(19.0 + f64::from(i) * 0.001, 72.8777);
            checker.check(&plant(&format!("p-{i}")), point, None, None, start).await;
        }
        assert_eq!(checker.tracked_points(), 100);

        let later = Timestamp::new(start.as_secs() + 86_400);
        checker.check(&tulsi(), p(19.076, 72.8777), Some(&baseline()), None, later).await;
        assert_eq!(checker.tracked_points(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_weather_only_skips_heuristic() {
        let checker = GeoChecker::new(GeoParams::default()).with_weather(Arc::new(Slow));
        let now = Timestamp::new(1_700_000_500);
        let r = checker.check(&tulsi(), p(22.7196, 75.8577), None, Some(true), now).await;
        assert!(r.within_threshold);
        assert!(r.weather.is_none());
        assert!(r.suspicion_flags.is_empty());
        assert_eq!(r.score, 100.0);
        assert_eq!(r.created_profile.map(|c| c.point), Some(p(22.7196, 75.8577)));
    }

    #[tokio::test]
    async fn daylight_mismatch_uses_weather() {
        let checker = GeoChecker::new(GeoParams::default()).with_weather(Arc::new(Fixed(Ok(night()))));
        let r = checker.check(&tulsi(), p(19.076, 72.8777), Some(&baseline()), Some(true), Timestamp::new(0)).await;
        assert_eq!(
            r.suspicion_flags,
            vec![SuspicionFlag::DaylightMismatch { claimed_daylight: true, local_daylight: false }]
        );
        assert_eq!(r.weather, Some(night()));
    }

    #[tokio::test]
    async fn weather_failure_only_skips_heuristic() {
        let checker = GeoChecker::new(GeoParams::default())
            .with_weather(Arc::new(Fixed(Err(GeoError::Unreachable("down".into())))));
        let r = checker.check(&tulsi(), p(19.076, 72.8777), Some(&baseline()), Some(true), Timestamp::new(0)).await;
        assert!(r.within_threshold);
        assert!(r.suspicion_flags.is_empty());
        assert!(r.weather.is_none());
    }
}
