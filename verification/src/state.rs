//! Orchestrator state machine.

use serde::{Deserialize, Serialize};

/// Phase of one submission.
///
/// `Collecting → Scoring → Deciding → Recording → Done`. `Failed` is reachable
/// from any non-terminal phase and only on unrecoverable input errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorPhase {
    /// Stage checkers are running.
    Collecting,
    Scoring,
    Deciding,
    /// Writing the ledger entry and scheduling the mint.
    Recording,
    Done,
    Failed,
}

impl OrchestratorPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// The phase that follows on success, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Collecting => Some(Self::Scoring),
            Self::Scoring => Some(Self::Deciding),
            Self::Deciding => Some(Self::Recording),
            Self::Recording => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    pub fn can_transition_to(&self, to: Self) -> bool {
        match to {
            Self::Failed => !self.is_terminal(),
            other => self.next() == Some(other),
        }
    }
}

/// The phases a submission went through, in order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTrail {
    phases: Vec<OrchestratorPhase>,
}

impl PhaseTrail {
    pub fn start() -> Self {
        Self {
            phases: vec![OrchestratorPhase::Collecting],
        }
    }

    pub fn current(&self) -> OrchestratorPhase {
        self.phases.last().copied().unwrap_or(OrchestratorPhase::Collecting)
    }

    /// Move to `to`. An illegal transition is ignored and logged.
    pub fn advance(&mut self, to: OrchestratorPhase) {
        let from = self.current();
        if from.can_transition_to(to) {
            tracing::trace!(from = ?from, to = ?to, "phase transition");
            self.phases.push(to);
        } else {
            tracing::warn!(from = ?from, to = ?to, "illegal phase transition ignored");
        }
    }

    pub fn phases(&self) -> &[OrchestratorPhase] {
        &self.phases
    }
}

impl Default for PhaseTrail {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrchestratorPhase::*;

    #[test]
    fn happy_path_is_linear() {
        let mut trail = PhaseTrail::start();
        for p in [Scoring, Deciding, Recording, Done] {
            trail.advance(p);
        }
        assert_eq!(trail.phases(), &[Collecting, Scoring, Deciding, Recording, Done]);
        assert!(trail.current().is_terminal());
    }

    #[test]
    fn phases_cannot_be_skipped() {
        let mut trail = PhaseTrail::start();
        trail.advance(Recording);
        assert_eq!(trail.current(), Collecting);
    }

    #[test]
    fn failed_only_from_live_phases() {
        assert!(Collecting.can_transition_to(Failed));
        assert!(Recording.can_transition_to(Failed));
        assert!(!Done.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Collecting));
    }
}
