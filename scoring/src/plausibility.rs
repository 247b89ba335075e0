//! History-based fraud heuristics.

use serde::{Deserialize, Serialize};

/// Above this the claimed quantity is physically implausible for one day.
pub const MAX_PLAUSIBLE_QUANTITY: u32 = 500;
/// A quantity more than this multiple of the claimant's average is a spike.
pub const SPIKE_FACTOR: f64 = 3.0;
/// More submissions than this within 24 hours is a burst.
pub const MAX_SUBMISSIONS_PER_DAY: u32 = 10;
/// The approval-rate check needs at least this many decided attempts.
pub const MIN_DECIDED_FOR_RATE: u32 = 4;
pub const MIN_APPROVAL_RATE: f64 = 0.5;

/// The claimant's recent record, read from the ledger before scoring.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimHistory {
    /// Average quantity over previous approved claims, if any.
    pub average_quantity: Option<f64>,
    /// Submissions (any outcome) in the trailing 24 hours.
    pub submissions_last_24h: u32,
    /// Approved or rejected attempts. Pending reviews are not decided.
    pub decided: u32,
    pub approved: u32,
}

impl ClaimHistory {
    pub fn approval_rate(&self) -> Option<f64> {
        (self.decided > 0).then(|| self.approved as f64 / self.decided as f64)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum PlausibilityFlag {
    QuantitySpike { quantity: u32, average: f64 },
    SubmissionBurst { count: u32 },
    LowApprovalRate { rate: f64 },
    ImplausibleQuantity { quantity: u32 },
}

impl PlausibilityFlag {
    /// Points subtracted from the aggregate.
    pub fn penalty(&self) -> f64 {
        match self {
            Self::QuantitySpike { .. } => 20.0,
            Self::SubmissionBurst { .. } => 30.0,
            Self::LowApprovalRate { .. } => 20.0,
            Self::ImplausibleQuantity { .. } => 50.0,
        }
    }

    pub fn evaluate(quantity: u32, history: &ClaimHistory) -> Vec<PlausibilityFlag> {
        let mut flags = Vec::new();
        if let Some(average) = history.average_quantity {
            if average > 0.0 && quantity as f64 > average * SPIKE_FACTOR {
                flags.push(Self::QuantitySpike { quantity, average });
            }
        }
        if history.submissions_last_24h > MAX_SUBMISSIONS_PER_DAY {
            flags.push(Self::SubmissionBurst {
                count: history.submissions_last_24h,
            });
        }
        if history.decided >= MIN_DECIDED_FOR_RATE {
            if let Some(rate) = history.approval_rate() {
                if rate < MIN_APPROVAL_RATE {
                    flags.push(Self::LowApprovalRate { rate });
                }
            }
        }
        if quantity > MAX_PLAUSIBLE_QUANTITY {
            flags.push(Self::ImplausibleQuantity { quantity });
        }
        flags
    }
}
