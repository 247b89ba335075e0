//! Record-minting adapter.
//!
//! An approved claim can be recorded with an external minting service. The
//! call never blocks the ledger commit: the orchestrator hands the metadata to
//! a [`MintScheduler`], which retries with exponential backoff in a background
//! task and tracks progress as a [`MintStatus`](sprout_types::MintStatus) beside
//! the activity.

pub mod client;
pub mod error;
pub mod metadata;
pub mod minter;
pub mod retry;

pub use client::HttpMinter;
pub use error::MintError;
pub use metadata::{co2_absorption_kg_per_year, estimate_offset_kg, MintMetadata, DEFAULT_CO2_KG_PER_PLANT};
pub use minter::{MintReceipt, RecordMinter};
pub use retry::{MintScheduler, RetryPolicy};
