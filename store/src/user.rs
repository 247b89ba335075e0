//! User storage trait.

use crate::StoreError;
use sprout_types::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A registered user and their materialized totals.
///
/// `total_points` always equals the sum of the user's points-ledger rows; it is
/// only changed inside the same batch that appends those rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub display_name: Option<String>,
    pub created_at: Timestamp,
    pub total_points: i64,
    pub total_coins: i64,
    /// Users are soft-deactivated, never deleted.
    pub active: bool,
}

impl UserRecord {
    pub fn new(id: UserId, display_name: Option<String>, created_at: Timestamp) -> Self {
        Self {
            id,
            display_name,
            created_at,
            total_points: 0,
            total_coins: 0,
            active: true,
        }
    }
}

pub trait UserStore {
    fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Like [`get_user`](Self::get_user) but treats absence as an error.
    fn require_user(&self, id: &UserId) -> Result<UserRecord, StoreError> {
        self.get_user(id)?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }
}
