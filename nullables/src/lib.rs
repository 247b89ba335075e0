//! Nullable infrastructure for deterministic testing.
//!
//! Every external collaborator of the engine (clock, storage, evidence
//! classifier, weather and satellite lookups, minting service, gesture frame
//! classifier) sits behind a trait. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be scripted programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and dry runs.

pub mod classifier;
pub mod clock;
pub mod frames;
pub mod minter;
pub mod satellite;
pub mod store;
pub mod weather;

pub use classifier::NullClassifier;
pub use clock::NullClock;
pub use frames::{recording_with_gestures, NullFrameClassifier};
pub use minter::NullMinter;
pub use satellite::NullSatellite;
pub use store::{NullBatch, NullStore};
pub use weather::NullWeather;
