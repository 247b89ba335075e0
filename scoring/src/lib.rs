//! Fraud/plausibility scorer.
//!
//! Stage checkers report a [`StageSignal`] each. The scorer weights the scored
//! ones, contributes nothing for degraded or missing stages, subtracts
//! plausibility penalties derived from the claimant's history, and maps the
//! result to a [`Decision`](sprout_types::Decision). A vetoed stage forces
//! rejection whatever the numbers say.

pub mod plausibility;
pub mod scorer;
pub mod signal;

pub use plausibility::{ClaimHistory, PlausibilityFlag};
pub use scorer::{PlausibilityScorer, ScoreBreakdown, StageContribution};
pub use signal::{StageKind, StageResults, StageSignal};
