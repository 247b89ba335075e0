//! Abstract storage traits for the Sprout ledger.
//!
//! Every storage backend (an SQL database, an embedded KV store, the in-memory
//! store used in tests) implements these traits. The rest of the codebase
//! depends only on the traits.
//!
//! Reads go through the per-table traits. Writes only happen inside a
//! [`LedgerBatch`]: everything staged in a batch becomes visible atomically on
//! [`LedgerBatch::commit`], and a batch dropped without committing is rolled
//! back. Backends must serialize batches so that two concurrent batches never
//! both observe the state that precedes the other's commit.

pub mod activity;
pub mod batch;
pub mod error;
pub mod mint;
pub mod plant;
pub mod points;
pub mod streak;
pub mod user;

pub use activity::{ActivityEffects, ActivityRecord, ActivityStore};
pub use batch::{LedgerBatch, LedgerStore, LedgerView};
pub use error::StoreError;
pub use mint::{MintRecord, MintStore};
pub use plant::{PlantRecord, PlantStore};
pub use points::{PointsStore, PointsTransaction};
pub use streak::{StreakRecord, StreakStore};
pub use user::{UserRecord, UserStore};
