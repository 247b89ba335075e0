//! Mint-status storage trait.
//!
//! Mint state lives beside the activity log rather than inside it so that the
//! activity rows stay immutable while retries progress.

use crate::StoreError;
use sprout_types::{ActivityId, MintStatus, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MintRecord {
    pub activity: ActivityId,
    pub status: MintStatus,
    pub updated_at: Timestamp,
}

pub trait MintStore {
    fn get_mint(&self, activity: ActivityId) -> Result<Option<MintRecord>, StoreError>;

    /// Mints not yet in a terminal state.
    fn pending_mints(&self) -> Result<Vec<MintRecord>, StoreError>;
}
