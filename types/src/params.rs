//! Tunable parameters for verification and rewards.
//!
//! Every field has a serde default so a partial TOML section is valid.

use crate::activity::{ActivityType, RemedyKind};
use serde::{Deserialize, Serialize};

/// Per-stage weights used by the plausibility scorer.
///
/// The core stages sum to 90; the satellite bonus lifts the ceiling to 100.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageWeights {
    pub gesture: f64,
    pub geo: f64,
    pub classifier: f64,
    pub satellite: f64,
}

impl StageWeights {
    pub fn total(&self) -> f64 {
        self.gesture + self.geo + self.classifier + self.satellite
    }
}

impl Default for StageWeights {
    fn default() -> Self {
        Self {
            gesture: 30.0,
            geo: 20.0,
            classifier: 40.0,
            satellite: 10.0,
        }
    }
}

/// Parameters for the checkers, the scorer and the orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationParams {
    // ── Gesture ──────────────────────────────────────────────────────────
    /// Distinct gestures required within the window.
    pub required_gestures: u32,
    /// Capture window in milliseconds.
    pub gesture_window_ms: u64,
    /// Minimum gap between two counted gestures, in milliseconds.
    pub gesture_cooldown_ms: u64,
    /// Frames arriving closer together than this are skipped.
    pub gesture_sample_interval_ms: u64,
    /// Multiplier applied to the gesture completion ratio, in [0, 1].
    pub gesture_base_weight: f64,

    // ── Geo ──────────────────────────────────────────────────────────────
    /// Inclusive consistency radius in metres.
    pub geo_radius_m: f64,
    /// Coordinates with fewer decimal places than this on either axis are flagged.
    pub min_coordinate_decimals: u32,
    /// Identical coordinates claimed for more than this many plants are flagged.
    pub max_identical_claims: u32,
    /// How long a claimed coordinate counts towards the repeat tally, in seconds.
    pub repeat_window_secs: u64,
    /// Points deducted from the geo stage per suspicion flag.
    pub geo_flag_penalty: f64,

    // ── Stage execution ──────────────────────────────────────────────────
    /// Timeout for the classifier, satellite and weather lookups, in milliseconds.
    pub stage_timeout_ms: u64,
    /// Slack added to the gesture window before the stage is cancelled.
    pub gesture_grace_ms: u64,
    /// Evidence captured longer ago than this is refused, in seconds.
    pub max_capture_age_secs: u64,

    // ── Scoring ──────────────────────────────────────────────────────────
    pub weights: StageWeights,
    /// Inclusive lower bound for approval.
    pub approve_threshold: f64,
    /// Inclusive lower bound for manual review.
    pub review_threshold: f64,

    // ── Minting ──────────────────────────────────────────────────────────
    pub mint_max_attempts: u32,
    /// First retry delay; doubles on every further attempt.
    pub mint_base_backoff_ms: u64,
}

impl Default for VerificationParams {
    fn default() -> Self {
        Self {
            required_gestures: 3,
            gesture_window_ms: 10_000,
            gesture_cooldown_ms: 500,
            gesture_sample_interval_ms: 100,
            gesture_base_weight: 1.0,

            geo_radius_m: 50.0,
            min_coordinate_decimals: 3,
            max_identical_claims: 5,
            repeat_window_secs: 86_400,
            geo_flag_penalty: 25.0,

            stage_timeout_ms: 15_000,
            gesture_grace_ms: 2_000,
            max_capture_age_secs: 600,

            weights: StageWeights::default(),
            approve_threshold: 80.0,
            review_threshold: 60.0,

            mint_max_attempts: 3,
            mint_base_backoff_ms: 500,
        }
    }
}

/// A streak length that pays a one-time bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub days: u32,
    pub bonus: i64,
}

/// Point values and ledger rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardParams {
    pub purchase_points: i64,
    pub planting_photo_points: i64,
    pub watering_points: i64,
    pub health_scan_points: i64,
    pub protection_points: i64,
    pub compost_points: i64,
    pub neem_oil_points: i64,
    pub mulch_points: i64,
    pub organic_fertilizer_points: i64,

    /// Accepted health scans allowed in any rolling window of `health_scan_window_days`.
    pub health_scan_weekly_cap: u32,
    pub health_scan_window_days: u64,

    /// Ascending by `days`.
    pub streak_milestones: Vec<Milestone>,

    /// Offset applied before splitting time into calendar days.
    pub utc_offset_secs: i64,
}

impl RewardParams {
    /// Base points for an approved activity of this type.
    pub fn base_points(&self, activity: ActivityType) -> i64 {
        match activity {
            ActivityType::Purchase => self.purchase_points,
            ActivityType::PlantingPhoto => self.planting_photo_points,
            ActivityType::Watering => self.watering_points,
            ActivityType::HealthScan => self.health_scan_points,
            ActivityType::Protection => self.protection_points,
            ActivityType::Remedy(RemedyKind::Compost) => self.compost_points,
            ActivityType::Remedy(RemedyKind::NeemOil) => self.neem_oil_points,
            ActivityType::Remedy(RemedyKind::Mulch) => self.mulch_points,
            ActivityType::Remedy(RemedyKind::OrganicFertilizer) => self.organic_fertilizer_points,
        }
    }
}

impl Default for RewardParams {
    fn default() -> Self {
        Self {
            purchase_points: 30,
            planting_photo_points: 20,
            watering_points: 5,
            health_scan_points: 5,
            protection_points: 10,
            compost_points: 20,
            neem_oil_points: 25,
            mulch_points: 20,
            organic_fertilizer_points: 25,

            health_scan_weekly_cap: 2,
            health_scan_window_days: 7,

            streak_milestones: vec![
                Milestone { days: 7, bonus: 10 },
                Milestone { days: 30, bonus: 50 },
                Milestone { days: 100, bonus: 200 },
            ],

            utc_offset_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_leave_room_for_bonus() {
        let w = StageWeights::default();
        assert_eq!(w.gesture + w.geo + w.classifier, 90.0);
        assert_eq!(w.total(), 100.0);
    }

    #[test]
    fn remedy_points_fall_in_band() {
        let p = RewardParams::default();
        for kind in [
            RemedyKind::Compost,
            RemedyKind::NeemOil,
            RemedyKind::Mulch,
            RemedyKind::OrganicFertilizer,
        ] {
            let pts = p.base_points(ActivityType::Remedy(kind));
            assert!((20..=25).contains(&pts), "{kind:?} pays {pts}");
        }
    }

    #[test]
    fn milestones_are_ascending() {
        let p = RewardParams::default();
        assert!(p.streak_milestones.windows(2).all(|w| w[0].days < w[1].days));
    }
}
