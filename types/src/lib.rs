//! Fundamental types for the Sprout engine.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! identifiers, timestamps and calendar days, coordinates, activity kinds,
//! verification decisions, tunable parameters, and input errors.

pub mod activity;
pub mod error;
pub mod geo;
pub mod ids;
pub mod params;
pub mod time;

pub use activity::{ActivityStatus, ActivityType, Decision, MintStatus, RemedyKind, TransactionType};
pub use error::InputError;
pub use geo::{GeoPoint, LocationProfile};
pub use ids::{ActivityId, PlantId, TransactionId, UserId};
pub use params::{Milestone, RewardParams, StageWeights, VerificationParams};
pub use time::{CalendarDay, Clock, SystemClock, Timestamp, SECS_PER_DAY};
