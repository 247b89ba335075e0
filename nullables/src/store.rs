//! Nullable store: thread-safe in-memory ledger tables for testing.

use sprout_store::{
    ActivityRecord, ActivityStore, LedgerBatch, LedgerStore, MintRecord, MintStore, PlantRecord,
    PlantStore, PointsStore, PointsTransaction, StoreError, StreakRecord, StreakStore, UserRecord,
    UserStore,
};
use sprout_types::{ActivityId, PlantId, TransactionId, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, Default)]
struct Tables {
    users: HashMap<UserId, UserRecord>,
    plants: BTreeMap<PlantId, PlantRecord>,
    activities: BTreeMap<ActivityId, ActivityRecord>,
    transactions: BTreeMap<TransactionId, PointsTransaction>,
    streaks: HashMap<PlantId, StreakRecord>,
    mints: BTreeMap<ActivityId, MintRecord>,
    last_activity_id: u64,
    last_transaction_id: u64,
}

/// An in-memory ledger store.
///
/// A batch holds the table lock for its whole lifetime and works on a private
/// copy of the tables; commit swaps the copy in. Batches are therefore fully
/// serialized. Reading through the store itself while a batch is open on the
/// same thread deadlocks, so read through the batch instead.
#[derive(Debug, Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    fail_next_commit: AtomicBool,
    commits: AtomicU64,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next commit fail with a backend error (and roll back).
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Total number of activity rows.
    pub fn activity_count(&self) -> usize {
        self.lock().map(|t| t.activities.len()).unwrap_or(0)
    }

    /// Total number of points-ledger rows.
    pub fn transaction_count(&self) -> usize {
        self.lock().map(|t| t.transactions.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("null store lock poisoned".into()))
    }
}

/// A staged unit of work over a [`NullStore`].
pub struct NullBatch<'a> {
    store: &'a NullStore,
    guard: MutexGuard<'a, Tables>,
    staged: Tables,
}

impl LedgerStore for NullStore {
    type Batch<'a> = NullBatch<'a>;

    fn begin_batch(&self) -> Result<NullBatch<'_>, StoreError> {
        let guard = self.lock()?;
        let staged = guard.clone();
        Ok(NullBatch {
            store: self,
            guard,
            staged,
        })
    }
}

impl LedgerBatch for NullBatch<'_> {
    fn put_user(&mut self, user: &UserRecord) -> Result<(), StoreError> {
        self.staged.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    fn put_plant(&mut self, plant: &PlantRecord) -> Result<(), StoreError> {
        self.staged.plants.insert(plant.id.clone(), plant.clone());
        Ok(())
    }

    fn put_streak(&mut self, plant: &PlantId, streak: &StreakRecord) -> Result<(), StoreError> {
        self.staged.streaks.insert(plant.clone(), streak.clone());
        Ok(())
    }

    fn put_mint(&mut self, mint: &MintRecord) -> Result<(), StoreError> {
        self.staged.mints.insert(mint.activity, mint.clone());
        Ok(())
    }

    fn next_activity_id(&mut self) -> ActivityId {
        self.staged.last_activity_id += 1;
        ActivityId::new(self.staged.last_activity_id)
    }

    fn next_transaction_id(&mut self) -> TransactionId {
        self.staged.last_transaction_id += 1;
        TransactionId::new(self.staged.last_transaction_id)
    }

    fn insert_activity(&mut self, activity: ActivityRecord) -> Result<(), StoreError> {
        if self.staged.activities.contains_key(&activity.id) {
            return Err(StoreError::Immutable(activity.id.to_string()));
        }
        self.staged.activities.insert(activity.id, activity);
        Ok(())
    }

    fn append_transaction(&mut self, row: PointsTransaction) -> Result<(), StoreError> {
        if self.staged.transactions.contains_key(&row.id) {
            return Err(StoreError::Immutable(row.id.to_string()));
        }
        self.staged.transactions.insert(row.id, row);
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        if self.store.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        *self.guard = std::mem::take(&mut self.staged);
        self.store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Reads ────────────────────────────────────────────────────────────────
//
// Implemented once on the tables; the store locks, the batch reads its copy.

impl Tables {
    fn user(&self, id: &UserId) -> Option<UserRecord> {
        self.users.get(id).cloned()
    }

    fn plant(&self, id: &PlantId) -> Option<PlantRecord> {
        self.plants.get(id).cloned()
    }

    fn plants_of(&self, owner: &UserId) -> Vec<PlantRecord> {
        self.plants.values().filter(|p| &p.owner == owner).cloned().collect()
    }

    fn activity(&self, id: ActivityId) -> Option<ActivityRecord> {
        self.activities.get(&id).cloned()
    }

    fn activities_of_plant(&self, plant: &PlantId) -> Vec<ActivityRecord> {
        self.activities.values().filter(|a| &a.plant == plant).cloned().collect()
    }

    fn activities_of_user(&self, user: &UserId) -> Vec<ActivityRecord> {
        self.activities.values().filter(|a| &a.user == user).cloned().collect()
    }

    fn transactions_of(&self, user: &UserId) -> Vec<PointsTransaction> {
        self.transactions.values().filter(|t| &t.user == user).cloned().collect()
    }

    fn streak(&self, plant: &PlantId) -> Option<StreakRecord> {
        self.streaks.get(plant).cloned()
    }

    fn mint(&self, activity: ActivityId) -> Option<MintRecord> {
        self.mints.get(&activity).cloned()
    }

    fn pending(&self) -> Vec<MintRecord> {
        self.mints.values().filter(|m| !m.status.is_terminal()).cloned().collect()
    }
}

macro_rules! impl_reads {
    ($ty:ty, $tables:ident => $access:expr) => {
        impl UserStore for $ty {
            fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
                let $tables = self;
                Ok($access.user(id))
            }
        }

        impl PlantStore for $ty {
            fn get_plant(&self, id: &PlantId) -> Result<Option<PlantRecord>, StoreError> {
                let $tables = self;
                Ok($access.plant(id))
            }

            fn plants_for_user(&self, owner: &UserId) -> Result<Vec<PlantRecord>, StoreError> {
                let $tables = self;
                Ok($access.plants_of(owner))
            }
        }

        impl ActivityStore for $ty {
            fn get_activity(&self, id: ActivityId) -> Result<Option<ActivityRecord>, StoreError> {
                let $tables = self;
                Ok($access.activity(id))
            }

            fn activities_for_plant(&self, plant: &PlantId) -> Result<Vec<ActivityRecord>, StoreError> {
                let $tables = self;
                Ok($access.activities_of_plant(plant))
            }

            fn activities_for_user(&self, user: &UserId) -> Result<Vec<ActivityRecord>, StoreError> {
                let $tables = self;
                Ok($access.activities_of_user(user))
            }
        }

        impl PointsStore for $ty {
            fn transactions_for_user(&self, user: &UserId) -> Result<Vec<PointsTransaction>, StoreError> {
                let $tables = self;
                Ok($access.transactions_of(user))
            }
        }

        impl StreakStore for $ty {
            fn get_streak(&self, plant: &PlantId) -> Result<Option<StreakRecord>, StoreError> {
                let $tables = self;
                Ok($access.streak(plant))
            }
        }

        impl MintStore for $ty {
            fn get_mint(&self, activity: ActivityId) -> Result<Option<MintRecord>, StoreError> {
                let $tables = self;
                Ok($access.mint(activity))
            }

            fn pending_mints(&self) -> Result<Vec<MintRecord>, StoreError> {
                let $tables = self;
                Ok($access.pending())
            }
        }
    };
}

impl_reads!(NullStore, store => store.lock()?);
impl_reads!(NullBatch<'_>, batch => batch.staged);
