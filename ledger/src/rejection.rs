//! Why an attempt was stored without points.

use serde::{Deserialize, Serialize};
use sprout_types::ActivityId;
use thiserror::Error;

/// A recorded (not raised) rejection. The attempt is still stored as an
/// Activity so the claimant can see why it failed.
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("duplicate activity: {original} was already accepted for this plant on this day")]
    DuplicateActivity { original: ActivityId },

    #[error("one-time activity already claimed by {original}")]
    OneTimeAlreadyClaimed { original: ActivityId },

    #[error("gesture recording replayed from {original}")]
    ReplayedGesture { original: ActivityId },

    #[error("weekly cap reached: {cap} accepted in the last {window_days} days")]
    WeeklyCapReached { cap: u32, window_days: u64 },

    #[error("verification failed: {detail}")]
    Verification { detail: String },

    #[error("rejected on review: {note}")]
    ReviewRejected { note: String },
}

impl RejectionReason {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateActivity { .. })
    }
}
