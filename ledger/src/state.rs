//! Read models over the ledger.

use crate::error::LedgerError;
use crate::points_ledger::PointsLedger;
use serde::{Deserialize, Serialize};
use sprout_scoring::ClaimHistory;
use sprout_store::{ActivityRecord, LedgerStore, PlantRecord, PointsTransaction};
use sprout_types::{ActivityStatus, InputError, Timestamp, UserId, SECS_PER_DAY};

/// A user's balances and full history, newest first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub user: UserId,
    pub display_name: Option<String>,
    pub active: bool,
    pub total_points: i64,
    pub total_coins: i64,
    pub history: Vec<PointsTransaction>,
    pub activities: Vec<ActivityRecord>,
    pub plants: Vec<PlantRecord>,
}

impl<S: LedgerStore> PointsLedger<S> {
    pub fn ledger_state(&self, user: &UserId) -> Result<LedgerState, LedgerError> {
        let store = self.store();
        let record = store
            .get_user(user)?
            .ok_or_else(|| InputError::UnknownUser(user.to_string()))?;

        let mut history = store.transactions_for_user(user)?;
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let mut activities = store.activities_for_user(user)?;
        activities.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then(b.id.cmp(&a.id)));

        Ok(LedgerState {
            user: record.id,
            display_name: record.display_name,
            active: record.active,
            total_points: record.total_points,
            total_coins: record.total_coins,
            history,
            activities,
            plants: store.plants_for_user(user)?,
        })
    }

    /// The claimant's record as of `now`, for the plausibility scorer.
    ///
    /// Review resolutions are not counted as submissions; they are decisions on
    /// an earlier one.
    pub fn claim_history(&self, user: &UserId, now: Timestamp) -> Result<ClaimHistory, LedgerError> {
        let activities = self.store().activities_for_user(user)?;

        let approved_quantities: Vec<u32> = activities
            .iter()
            .filter(|a| a.status == ActivityStatus::Approved)
            .map(|a| a.quantity)
            .collect();
        let average_quantity = (!approved_quantities.is_empty()).then(|| {
            approved_quantities.iter().map(|&q| f64::from(q)).sum::<f64>() / approved_quantities.len() as f64
        });

        let submissions_last_24h = activities
            .iter()
            .filter(|a| a.resolves.is_none() && a.recorded_at.elapsed_since(now) < SECS_PER_DAY)
            .count() as u32;
        let approved = approved_quantities.len() as u32;
        let rejected = activities
            .iter()
            .filter(|a| a.status == ActivityStatus::Rejected)
            .count() as u32;

        Ok(ClaimHistory {
            average_quantity,
            submissions_last_24h,
            decided: approved + rejected,
            approved,
        })
    }
}
