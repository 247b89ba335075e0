//! Atomic write batches.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = store.begin_batch()?;
//! let id = batch.next_activity_id();
//! batch.insert_activity(record)?;
//! batch.append_transaction(row)?;
//! batch.put_user(&user)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`LedgerBatch::commit`], every
//! staged write is discarded.

use crate::{
    ActivityRecord, ActivityStore, MintRecord, MintStore, PlantRecord, PlantStore,
    PointsStore, PointsTransaction, StoreError, StreakRecord, StreakStore, UserRecord,
    UserStore,
};
use sprout_types::{ActivityId, PlantId, TransactionId};

/// Read access to every ledger table.
pub trait LedgerView:
    UserStore + PlantStore + ActivityStore + PointsStore + StreakStore + MintStore
{
}

impl<T> LedgerView for T where
    T: UserStore + PlantStore + ActivityStore + PointsStore + StreakStore + MintStore
{
}

/// A unit of work over the ledger tables.
///
/// Reads through a batch observe its own staged writes.
pub trait LedgerBatch: LedgerView {
    fn put_user(&mut self, user: &UserRecord) -> Result<(), StoreError>;

    fn put_plant(&mut self, plant: &PlantRecord) -> Result<(), StoreError>;

    fn put_streak(&mut self, plant: &PlantId, streak: &StreakRecord) -> Result<(), StoreError>;

    fn put_mint(&mut self, mint: &MintRecord) -> Result<(), StoreError>;

    /// Reserve the next activity id.
    fn next_activity_id(&mut self) -> ActivityId;

    /// Reserve the next ledger row id.
    fn next_transaction_id(&mut self) -> TransactionId;

    /// Append an activity. Fails with [`StoreError::Immutable`] if the id exists.
    fn insert_activity(&mut self, activity: ActivityRecord) -> Result<(), StoreError>;

    /// Append a ledger row. Fails with [`StoreError::Immutable`] if the id exists.
    fn append_transaction(&mut self, row: PointsTransaction) -> Result<(), StoreError>;

    /// Make every staged write visible at once.
    fn commit(self) -> Result<(), StoreError>;
}

/// A store that can open write batches.
pub trait LedgerStore: LedgerView + Send + Sync {
    type Batch<'a>: LedgerBatch
    where
        Self: 'a;

    /// Open a batch. Blocks until no other batch is open.
    fn begin_batch(&self) -> Result<Self::Batch<'_>, StoreError>;
}
