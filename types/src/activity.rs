//! Activity kinds, verification decisions and ledger-row sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Organic remedy applied after a health scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemedyKind {
    Compost,
    NeemOil,
    Mulch,
    OrganicFertilizer,
}

impl RemedyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compost => "compost",
            Self::NeemOil => "neem_oil",
            Self::Mulch => "mulch",
            Self::OrganicFertilizer => "organic_fertilizer",
        }
    }
}

/// A claimed plant-care action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Purchase,
    PlantingPhoto,
    Watering,
    HealthScan,
    Remedy(RemedyKind),
    Protection,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::PlantingPhoto => "planting_photo",
            Self::Watering => "watering",
            Self::HealthScan => "health_scan",
            Self::Remedy(_) => "remedy",
            Self::Protection => "protection",
        }
    }

    /// Activities that can be accepted at most once per plant lifetime.
    pub fn is_one_time(&self) -> bool {
        matches!(self, Self::Purchase | Self::Protection)
    }

    /// Only watering drives the per-plant streak.
    pub fn drives_streak(&self) -> bool {
        matches!(self, Self::Watering)
    }

    /// The content label a classifier is expected to confirm for this action.
    pub fn expected_label(&self) -> &'static str {
        match self {
            Self::Purchase => "plant_present",
            Self::PlantingPhoto => "planting_present",
            Self::Watering => "water_visible",
            Self::HealthScan => "health_assessed",
            Self::Remedy(_) => "remedy_applied",
            Self::Protection => "protection_present",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remedy(kind) => write!(f, "remedy:{}", kind.as_str()),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Three-way outcome of the plausibility scorer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    ManualReview,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::ManualReview => "manual_review",
            Self::Reject => "reject",
        }
    }
}

/// Ledger status of a stored Activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// Points were awarded.
    Approved,
    /// Awaiting a reviewer; zero points so far.
    PendingReview,
    /// Zero points, with a stored reason.
    Rejected,
}

impl ActivityStatus {
    /// Whether this activity counts toward idempotency, caps and one-time rules.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Permanent-record state of an approved activity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum MintStatus {
    /// A mint was scheduled and has not yet succeeded.
    Pending { attempts: u32 },
    /// The record exists on the minting service.
    Minted {
        record_id: String,
        external_reference: String,
    },
    /// Every retry failed; needs external follow-up.
    Failed { attempts: u32, reason: String },
}

impl MintStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending { .. })
    }
}

/// Source of a points-ledger row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Base points for an approved activity.
    ActivityReward(ActivityType),
    /// One-time streak milestone bonus.
    StreakBonus { milestone_days: u32 },
}
