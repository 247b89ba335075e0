//! Points-ledger storage trait.

use crate::StoreError;
use sprout_types::{ActivityId, PlantId, Timestamp, TransactionId, TransactionType, UserId};
use serde::{Deserialize, Serialize};

/// An append-only ledger row. Always tied to exactly one activity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointsTransaction {
    pub id: TransactionId,
    pub user: UserId,
    pub plant: PlantId,
    pub activity: ActivityId,
    pub transaction_type: TransactionType,
    /// Signed so that corrections can be expressed as further rows.
    pub amount: i64,
    pub created_at: Timestamp,
    pub description: String,
}

pub trait PointsStore {
    /// All rows for a user, oldest first.
    fn transactions_for_user(&self, user: &UserId) -> Result<Vec<PointsTransaction>, StoreError>;

    /// Recomputes the user's balance from the log.
    fn ledger_sum_for_user(&self, user: &UserId) -> Result<i64, StoreError> {
        Ok(self
            .transactions_for_user(user)?
            .iter()
            .map(|t| t.amount)
            .sum())
    }
}
