//! Activity storage trait.
//!
//! Activities are append-only: one row per evaluated attempt, never rewritten.

use crate::StoreError;
use sprout_types::{
    ActivityId, ActivityStatus, ActivityType, CalendarDay, LocationProfile, PlantId, Timestamp,
    UserId,
};
use serde::{Deserialize, Serialize};

/// One claimed action and its outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: ActivityId,
    pub plant: PlantId,
    pub user: UserId,
    pub activity_type: ActivityType,
    pub quantity: u32,
    pub claimed_at: Timestamp,
    /// When the row was written. Differs from `claimed_at` for review resolutions.
    pub recorded_at: Timestamp,
    /// Local calendar day of `claimed_at`, the idempotency bucket.
    pub day: CalendarDay,
    pub status: ActivityStatus,
    pub points_earned: i64,
    /// Why the attempt earned nothing, for rejected and pending attempts.
    pub reason: Option<String>,
    /// Set when this row resolves an earlier manual-review activity.
    pub resolves: Option<ActivityId>,
    /// Plant-level side effects applied if (and when) the attempt is accepted.
    #[serde(default)]
    pub effects: ActivityEffects,
    /// Hash of the accepted gesture sequence, when the gesture check ran.
    #[serde(default)]
    pub gesture_signature: Option<String>,
    /// Serialized verification report for the attempt.
    pub report: serde_json::Value,
}

/// Plant updates carried by an attempt.
///
/// Stored with the attempt so that a manual-review resolution can apply them
/// later without re-running verification.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityEffects {
    /// Geo baseline established by this claim, for a plant that had none.
    pub location_profile: Option<LocationProfile>,
    pub fingerprint: Option<String>,
    pub health_score: Option<u8>,
}

pub trait ActivityStore {
    fn get_activity(&self, id: ActivityId) -> Result<Option<ActivityRecord>, StoreError>;

    /// All activities of a plant, oldest first.
    fn activities_for_plant(&self, plant: &PlantId) -> Result<Vec<ActivityRecord>, StoreError>;

    /// All activities of a user, oldest first.
    fn activities_for_user(&self, user: &UserId) -> Result<Vec<ActivityRecord>, StoreError>;

    /// The accepted activity of this type for this plant on `day`, if any.
    fn find_accepted_on_day(
        &self,
        plant: &PlantId,
        activity_type: ActivityType,
        day: CalendarDay,
    ) -> Result<Option<ActivityRecord>, StoreError> {
        Ok(self.activities_for_plant(plant)?.into_iter().find(|a| {
            a.activity_type == activity_type && a.day == day && a.status.is_accepted()
        }))
    }

    /// The user's earliest activity carrying this gesture signature.
    fn find_by_gesture_signature(
        &self,
        user: &UserId,
        signature: &str,
    ) -> Result<Option<ActivityRecord>, StoreError> {
        Ok(self
            .activities_for_user(user)?
            .into_iter()
            .find(|a| a.gesture_signature.as_deref() == Some(signature)))
    }

    /// Whether a resolving activity already exists for `pending`.
    fn is_resolved(&self, plant: &PlantId, pending: ActivityId) -> Result<bool, StoreError> {
        Ok(self
            .activities_for_plant(plant)?
            .iter()
            .any(|a| a.resolves == Some(pending)))
    }
}
