use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Gesture,
    Geo,
    Classifier,
    Satellite,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [Self::Gesture, Self::Geo, Self::Classifier, Self::Satellite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gesture => "gesture",
            Self::Geo => "geo",
            Self::Classifier => "classifier",
            Self::Satellite => "satellite",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one stage contributed.
///
/// Degraded and missing stages are never imputed: they contribute zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum StageSignal {
    /// A definitive score in [0, 100].
    Scored { score: f64 },
    /// The stage ran but could not produce a definitive answer.
    Degraded { reason: String },
    /// The stage produced nothing (not configured, or no input for it).
    Missing,
    /// The stage refused the evidence outright.
    Vetoed { reason: String },
}

impl StageSignal {
    pub fn scored(score: f64) -> Self {
        Self::Scored {
            score: if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) },
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded { reason: reason.into() }
    }

    pub fn vetoed(reason: impl Into<String>) -> Self {
        Self::Vetoed { reason: reason.into() }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Scored { score } => Some(*score),
            _ => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn is_vetoed(&self) -> bool {
        matches!(self, Self::Vetoed { .. })
    }
}

/// One signal per stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageResults {
    pub gesture: StageSignal,
    pub geo: StageSignal,
    pub classifier: StageSignal,
    pub satellite: StageSignal,
}

impl StageResults {
    pub fn get(&self, kind: StageKind) -> &StageSignal {
        match kind {
            StageKind::Gesture => &self.gesture,
            StageKind::Geo => &self.geo,
            StageKind::Classifier => &self.classifier,
            StageKind::Satellite => &self.satellite,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StageKind, &StageSignal)> {
        StageKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

impl Default for StageResults {
    fn default() -> Self {
        Self {
            gesture: StageSignal::Missing,
            geo: StageSignal::Missing,
            classifier: StageSignal::Missing,
            satellite: StageSignal::Missing,
        }
    }
}
