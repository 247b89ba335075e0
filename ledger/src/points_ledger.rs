//! The ledger proper: every mutation is one store batch.

use crate::error::LedgerError;
use crate::rejection::RejectionReason;
use crate::streak::advance_streak;
use serde::{Deserialize, Serialize};
use sprout_store::{
    ActivityEffects, ActivityRecord, ActivityStore, LedgerBatch, LedgerStore, MintRecord,
    PlantRecord, PointsTransaction, StreakRecord, UserRecord,
};
use sprout_types::{
    ActivityId, ActivityStatus, ActivityType, CalendarDay, Clock, Decision, InputError, Milestone,
    MintStatus, PlantId, RewardParams, Timestamp, TransactionType, UserId,
};
use std::sync::Arc;

/// An evaluated attempt, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityClaim {
    pub plant: PlantId,
    pub activity_type: ActivityType,
    pub quantity: u32,
    /// The instant the attempt is booked on. Callers pass the arrival time.
    pub claimed_at: Timestamp,
    pub decision: Decision,
    /// Explanation for a review or reject decision.
    pub detail: Option<String>,
    pub effects: ActivityEffects,
    /// A recording already stored for this user is refused as a replay.
    pub gesture_signature: Option<String>,
    pub report: serde_json::Value,
}

/// What [`PointsLedger::record`] wrote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub activity: ActivityId,
    pub status: ActivityStatus,
    pub points_awarded: i64,
    pub milestones: Vec<Milestone>,
    /// Streak after this attempt, for streak-driving activity types.
    pub streak: Option<StreakRecord>,
    pub rejection: Option<RejectionReason>,
    /// A mint record was queued in the same batch.
    pub mint_scheduled: bool,
}

/// Manual-review verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewResolution {
    Approve,
    Reject,
}

impl ReviewResolution {
    fn decision(self) -> Decision {
        match self {
            Self::Approve => Decision::Approve,
            Self::Reject => Decision::Reject,
        }
    }
}

/// Points & streak ledger over any [`LedgerStore`].
///
/// `User.total_points` and `Plant.total_points_earned` are materialized: they
/// are updated in the same batch that appends the matching transaction rows.
pub struct PointsLedger<S: LedgerStore> {
    store: Arc<S>,
    rewards: RewardParams,
    clock: Arc<dyn Clock>,
    mint_on_approval: bool,
}

impl<S: LedgerStore> PointsLedger<S> {
    pub fn new(store: Arc<S>, rewards: RewardParams, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            rewards,
            clock,
            mint_on_approval: false,
        }
    }

    /// Queue a mint record alongside every approval.
    pub fn with_minting(mut self, enabled: bool) -> Self {
        self.mint_on_approval = enabled;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn rewards(&self) -> &RewardParams {
        &self.rewards
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn mint_on_approval(&self) -> bool {
        self.mint_on_approval
    }

    /// Local calendar day of an instant, under the configured offset.
    pub fn day_of(&self, at: Timestamp) -> CalendarDay {
        at.calendar_day(self.rewards.utc_offset_secs)
    }

    /// Write one attempt. Idempotency, one-time and weekly-cap rules are
    /// checked inside the batch, so concurrent attempts serialize on them.
    pub fn record(&self, claim: ActivityClaim) -> Result<RecordOutcome, LedgerError> {
        let now = self.clock.now();
        let mut batch = self.store.begin_batch()?;
        let outcome = self.apply(&mut batch, claim, None, now)?;
        batch.commit()?;
        tracing::info!(
            activity = %outcome.activity,
            status = ?outcome.status,
            points = outcome.points_awarded,
            "activity recorded"
        );
        Ok(outcome)
    }

    /// Resolve a pending manual review by appending a new activity.
    ///
    /// The pending row is left untouched. Approval re-runs every ledger rule as
    /// of now, so a resolution can still lose to a duplicate accepted meanwhile.
    pub fn resolve_review(
        &self,
        pending: ActivityId,
        resolution: ReviewResolution,
        note: impl Into<String>,
    ) -> Result<RecordOutcome, LedgerError> {
        let note = note.into();
        let now = self.clock.now();
        let mut batch = self.store.begin_batch()?;

        let original = batch
            .get_activity(pending)?
            .ok_or(LedgerError::ActivityNotFound(pending))?;
        if original.status != ActivityStatus::PendingReview {
            return Err(LedgerError::NotPendingReview(pending));
        }
        if batch.is_resolved(&original.plant, pending)? {
            return Err(LedgerError::AlreadyResolved(pending));
        }

        let claim = ActivityClaim {
            plant: original.plant.clone(),
            activity_type: original.activity_type,
            quantity: original.quantity,
            claimed_at: original.claimed_at,
            decision: resolution.decision(),
            detail: Some(note.clone()),
            effects: original.effects.clone(),
            gesture_signature: original.gesture_signature.clone(),
            report: serde_json::json!({
                "resolution": {
                    "resolves": pending,
                    "decision": resolution,
                    "note": note,
                    "resolved_at": now,
                },
                "original": original.report,
            }),
        };
        let outcome = self.apply(&mut batch, claim, Some(pending), now)?;
        batch.commit()?;
        tracing::info!(
            pending = %pending,
            activity = %outcome.activity,
            status = ?outcome.status,
            "manual review resolved"
        );
        Ok(outcome)
    }

    fn apply<B: LedgerBatch>(
        &self,
        batch: &mut B,
        claim: ActivityClaim,
        resolves: Option<ActivityId>,
        now: Timestamp,
    ) -> Result<RecordOutcome, LedgerError> {
        let mut plant = batch
            .get_plant(&claim.plant)?
            .ok_or_else(|| InputError::UnknownPlant(claim.plant.to_string()))?;
        if !plant.active {
            return Err(InputError::InactivePlant(plant.id.to_string()).into());
        }
        let mut user = batch
            .get_user(&plant.owner)?
            .ok_or_else(|| InputError::UnknownUser(plant.owner.to_string()))?;
        if !user.active {
            return Err(InputError::InactiveUser(user.id.to_string()).into());
        }

        let day = self.day_of(claim.claimed_at);
        let violation = self.check_rules(batch, &claim, &user.id, day, resolves)?;
        let (status, rejection) = match (violation, claim.decision) {
            (Some(reason), _) => (ActivityStatus::Rejected, Some(reason)),
            (None, Decision::Approve) => (ActivityStatus::Approved, None),
            (None, Decision::ManualReview) => (ActivityStatus::PendingReview, None),
            (None, Decision::Reject) => {
                let detail = claim.detail.clone().unwrap_or_else(|| "verification rejected".into());
                let reason = match resolves {
                    Some(_) => RejectionReason::ReviewRejected { note: detail },
                    None => RejectionReason::Verification { detail },
                };
                (ActivityStatus::Rejected, Some(reason))
            }
        };

        let id = batch.next_activity_id();
        let mut points_awarded = 0;
        let mut milestones = Vec::new();
        let mut streak = None;
        let mut mint_scheduled = false;

        if status != ActivityStatus::Rejected && plant.location_profile.is_none() {
            plant.location_profile = claim.effects.location_profile;
        }

        if status == ActivityStatus::Approved {
            let mut rows = vec![(
                TransactionType::ActivityReward(claim.activity_type),
                self.rewards.base_points(claim.activity_type),
                format!("{} reward", claim.activity_type),
            )];

            if claim.activity_type.drives_streak() {
                let prev = batch.get_streak(&plant.id)?.unwrap_or_default();
                let advance = advance_streak(&prev, day, &self.rewards.streak_milestones);
                batch.put_streak(&plant.id, &advance.record)?;
                for m in &advance.milestones {
                    rows.push((
                        TransactionType::StreakBonus { milestone_days: m.days },
                        m.bonus,
                        format!("{}-day watering streak bonus", m.days),
                    ));
                }
                milestones = advance.milestones;
                streak = Some(advance.record);
            }

            for (transaction_type, amount, description) in rows {
                let row = PointsTransaction {
                    id: batch.next_transaction_id(),
                    user: user.id.clone(),
                    plant: plant.id.clone(),
                    activity: id,
                    transaction_type,
                    amount,
                    created_at: now,
                    description,
                };
                points_awarded += amount;
                batch.append_transaction(row)?;
            }

            user.total_points += points_awarded;
            plant.total_points_earned += points_awarded;
            if plant.fingerprint.is_none() {
                plant.fingerprint = claim.effects.fingerprint.clone();
            }
            if claim.activity_type == ActivityType::HealthScan {
                if let Some(score) = claim.effects.health_score {
                    plant.health_score = score.min(100);
                }
            }
            batch.put_user(&user)?;

            if self.mint_on_approval {
                batch.put_mint(&MintRecord {
                    activity: id,
                    status: MintStatus::Pending { attempts: 0 },
                    updated_at: now,
                })?;
                mint_scheduled = true;
            }
        } else if claim.activity_type.drives_streak() {
            streak = batch.get_streak(&plant.id)?;
        }
        batch.put_plant(&plant)?;

        let reason = match (&rejection, status) {
            (Some(r), _) => Some(r.to_string()),
            (None, ActivityStatus::PendingReview) => {
                Some(claim.detail.clone().unwrap_or_else(|| "awaiting manual review".into()))
            }
            _ => None,
        };

        batch.insert_activity(ActivityRecord {
            id,
            plant: plant.id.clone(),
            user: user.id.clone(),
            activity_type: claim.activity_type,
            quantity: claim.quantity,
            claimed_at: claim.claimed_at,
            recorded_at: now,
            day,
            status,
            points_earned: points_awarded,
            reason,
            resolves,
            effects: claim.effects,
            gesture_signature: claim.gesture_signature,
            report: claim.report,
        })?;

        if let Some(r) = &rejection {
            tracing::debug!(activity = %id, plant = %plant.id, reason = %r, "attempt rejected");
        }

        Ok(RecordOutcome {
            activity: id,
            status,
            points_awarded,
            milestones,
            streak,
            rejection,
            mint_scheduled,
        })
    }

    fn check_rules<B: LedgerBatch>(
        &self,
        batch: &B,
        claim: &ActivityClaim,
        user: &UserId,
        day: CalendarDay,
        resolves: Option<ActivityId>,
    ) -> Result<Option<RejectionReason>, LedgerError> {
        if let Some(original) = batch.find_accepted_on_day(&claim.plant, claim.activity_type, day)? {
            return Ok(Some(RejectionReason::DuplicateActivity { original: original.id }));
        }

        // A resolution carries the signature of the attempt it resolves.
        if let (None, Some(signature)) = (resolves, claim.gesture_signature.as_deref()) {
            if let Some(original) = batch.find_by_gesture_signature(user, signature)? {
                return Ok(Some(RejectionReason::ReplayedGesture { original: original.id }));
            }
        }

        if !claim.activity_type.is_one_time() && claim.activity_type != ActivityType::HealthScan {
            return Ok(None);
        }

        let accepted: Vec<ActivityRecord> = batch
            .activities_for_plant(&claim.plant)?
            .into_iter()
            .filter(|a| a.activity_type == claim.activity_type && a.status.is_accepted())
            .collect();

        if claim.activity_type.is_one_time() {
            if let Some(original) = accepted.first() {
                return Ok(Some(RejectionReason::OneTimeAlreadyClaimed { original: original.id }));
            }
        }

        if claim.activity_type == ActivityType::HealthScan {
            let window = self.rewards.health_scan_window_days;
            let in_window = accepted
                .iter()
                .filter(|a| a.day <= day && day.days_since(a.day) < window)
                .count();
            if in_window >= self.rewards.health_scan_weekly_cap as usize {
                return Ok(Some(RejectionReason::WeeklyCapReached {
                    cap: self.rewards.health_scan_weekly_cap,
                    window_days: self.rewards.health_scan_window_days,
                }));
            }
        }

        Ok(None)
    }

    /// Re-derive a user's balance from the transaction log and compare it with
    /// the materialized total.
    pub fn audit_user(&self, user: &UserId) -> Result<bool, LedgerError> {
        let record: UserRecord = self.store.require_user(user)?;
        Ok(record.total_points == self.store.ledger_sum_for_user(user)?)
    }

    pub fn plant(&self, id: &PlantId) -> Result<Option<PlantRecord>, LedgerError> {
        Ok(self.store.get_plant(id)?)
    }
}
