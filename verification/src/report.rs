//! Per-attempt verification report.

use serde::{Deserialize, Serialize};
use sprout_classifier::{ClassificationResult, ClassifierVerdict};
use sprout_geo::{GeoReport, SatelliteObservation};
use sprout_gesture::GestureOutcome;
use sprout_ledger::RejectionReason;
use sprout_scoring::{ScoreBreakdown, StageSignal};
use sprout_store::StreakRecord;
use sprout_types::{
    ActivityId, ActivityStatus, ActivityType, Decision, GeoPoint, Milestone, MintStatus, PlantId,
    Timestamp, UserId,
};

use crate::state::PhaseTrail;

/// One checker's result: the signal the scorer saw plus the checker's own output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageReport<T> {
    pub signal: StageSignal,
    pub detail: Option<T>,
    pub elapsed_ms: u64,
}

impl<T> StageReport<T> {
    pub fn missing() -> Self {
        Self {
            signal: StageSignal::Missing,
            detail: None,
            elapsed_ms: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierDetail {
    pub result: ClassificationResult,
    pub verdict: ClassifierVerdict,
}

/// Everything the checkers and the scorer produced. This is what gets stored
/// on the Activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub gesture: StageReport<GestureOutcome>,
    pub geo: StageReport<GeoReport>,
    pub classifier: StageReport<ClassifierDetail>,
    pub satellite: StageReport<SatelliteObservation>,
    pub score: ScoreBreakdown,
}

impl Assessment {
    pub fn aggregate(&self) -> f64 {
        self.score.aggregate
    }

    pub fn decision(&self) -> Decision {
        self.score.decision
    }

    pub fn gesture_signature(&self) -> Option<&str> {
        self.gesture.detail.as_ref().map(|g| g.signature.as_str())
    }

    /// Recover the assessment stored on an activity, looking through review
    /// resolutions to the original attempt.
    pub fn from_stored(report: &serde_json::Value) -> Option<Self> {
        let original = report.get("original").unwrap_or(report);
        serde_json::from_value(original.clone()).ok()
    }
}

/// What `submit_activity` returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub plant: PlantId,
    pub user: UserId,
    pub activity_type: ActivityType,
    pub quantity: u32,
    pub claimed_location: Option<GeoPoint>,
    /// Arrival time; the ledger day is taken from it.
    pub claimed_at: Timestamp,
    /// When the evidence says it was captured, clamped to arrival.
    pub captured_at: Timestamp,
    pub phases: PhaseTrail,
    pub assessment: Assessment,
    pub activity: ActivityId,
    pub status: ActivityStatus,
    pub points_earned: i64,
    pub milestones: Vec<Milestone>,
    pub streak: Option<StreakRecord>,
    pub rejection: Option<RejectionReason>,
    /// Set when an approval queued a mint.
    pub mint: Option<MintStatus>,
    pub elapsed_ms: u64,
}

impl VerificationReport {
    pub fn decision(&self) -> Decision {
        self.assessment.decision()
    }

    pub fn aggregate_confidence(&self) -> f64 {
        self.assessment.aggregate()
    }

    pub fn is_duplicate(&self) -> bool {
        self.rejection.as_ref().is_some_and(RejectionReason::is_duplicate)
    }
}
