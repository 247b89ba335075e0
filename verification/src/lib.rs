//! Verification orchestrator.
//!
//! One submission moves through `Collecting → Scoring → Deciding → Recording →
//! Done`. The gesture, geo, classifier and satellite checkers run concurrently,
//! each under its own timeout; a stage that times out or whose backing service
//! is down is reported as degraded and contributes nothing to the aggregate. The scorer's
//! decision is then written to the points ledger in one batch, and approvals
//! are handed to the minting scheduler without waiting on it.
//!
//! Only input errors stop a submission before anything is recorded.

pub mod error;
pub mod evidence;
pub mod orchestrator;
pub mod report;
pub mod state;

pub use error::VerificationError;
pub use evidence::{Evidence, Submission};
pub use orchestrator::Orchestrator;
pub use report::{Assessment, ClassifierDetail, StageReport, VerificationReport};
pub use state::{OrchestratorPhase, PhaseTrail};
