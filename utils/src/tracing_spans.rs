//! Pre-built [`tracing::Span`] constructors for engine operations.
//!
//! Consistent span names and field sets make traces easy to filter and
//! correlate across crates.

use tracing::{info_span, Span};

/// Span covering one `submit_activity` call, from input validation to report.
pub fn submission_span(plant: &str, activity_type: &str) -> Span {
    info_span!("submission", plant = %plant, activity = %activity_type)
}

/// Span covering one verification stage (gesture, geo, classifier).
pub fn stage_span(stage: &str) -> Span {
    info_span!("stage", stage = %stage)
}

/// Span covering the ledger batch for one attempt.
pub fn ledger_commit_span(plant: &str) -> Span {
    info_span!("ledger_commit", plant = %plant)
}

/// Span covering one call to the minting service.
pub fn mint_attempt_span(activity: &str, attempt: u32) -> Span {
    info_span!("mint_attempt", activity = %activity, attempt = attempt)
}
