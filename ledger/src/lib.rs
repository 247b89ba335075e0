//! Points & streak ledger.
//!
//! The ledger is an append-only log of activities and points transactions with
//! materialized per-user and per-plant totals. Each mutation runs inside one
//! store batch, so the idempotency check, the points rows, the streak update
//! and the totals commit together or not at all.
//!
//! Rules applied to every attempt, in order:
//!
//! 1. an accepted activity of the same type for the same plant on the same
//!    calendar day makes the attempt a duplicate;
//! 2. one-time activities (purchase, protection) are accepted once per plant;
//! 3. health scans are capped per rolling window;
//! 4. only approvals award points; reviews wait, rejections record a reason.

pub mod error;
pub mod points_ledger;
pub mod registry;
pub mod rejection;
pub mod state;
pub mod streak;

pub use error::LedgerError;
pub use points_ledger::{ActivityClaim, PointsLedger, RecordOutcome, ReviewResolution};
pub use rejection::RejectionReason;
pub use state::LedgerState;
pub use streak::{advance_streak, StreakAdvance};
