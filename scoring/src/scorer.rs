//! Weighted aggregation and the decision rule.

use crate::plausibility::{ClaimHistory, PlausibilityFlag};
use crate::signal::{StageKind, StageResults, StageSignal};
use serde::{Deserialize, Serialize};
use sprout_types::{Decision, StageWeights, VerificationParams};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageContribution {
    pub stage: StageKind,
    pub weight: f64,
    pub signal: StageSignal,
    /// `weight * score / 100`, or zero for anything but a scored stage.
    pub points: f64,
}

/// Everything the scorer looked at and how it got to the decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub contributions: Vec<StageContribution>,
    /// Sum of stage contributions before penalties.
    pub weighted_total: f64,
    pub plausibility_flags: Vec<PlausibilityFlag>,
    /// Final aggregate confidence in [0, 100].
    pub aggregate: f64,
    pub decision: Decision,
    /// First stage that vetoed, if any.
    pub vetoed_by: Option<StageKind>,
}

impl ScoreBreakdown {
    pub fn degraded_stages(&self) -> impl Iterator<Item = StageKind> + '_ {
        self.contributions
            .iter()
            .filter(|c| c.signal.is_degraded())
            .map(|c| c.stage)
    }
}

/// Fixed weights, fixed thresholds, no hidden state.
#[derive(Clone, Debug, PartialEq)]
pub struct PlausibilityScorer {
    weights: StageWeights,
    approve_threshold: f64,
    review_threshold: f64,
}

impl PlausibilityScorer {
    pub fn new(weights: StageWeights, approve_threshold: f64, review_threshold: f64) -> Self {
        let non_negative = |w: f64| if w.is_finite() { w.max(0.0) } else { 0.0 };
        Self {
            weights: StageWeights {
                gesture: non_negative(weights.gesture),
                geo: non_negative(weights.geo),
                classifier: non_negative(weights.classifier),
                satellite: non_negative(weights.satellite),
            },
            approve_threshold,
            review_threshold,
        }
    }

    pub fn from_params(params: &VerificationParams) -> Self {
        Self::new(params.weights, params.approve_threshold, params.review_threshold)
    }

    fn weight(&self, stage: StageKind) -> f64 {
        match stage {
            StageKind::Gesture => self.weights.gesture,
            StageKind::Geo => self.weights.geo,
            StageKind::Classifier => self.weights.classifier,
            StageKind::Satellite => self.weights.satellite,
        }
    }

    /// Map an aggregate to a decision. Both thresholds are inclusive lower bounds.
    pub fn decide(&self, aggregate: f64) -> Decision {
        if aggregate >= self.approve_threshold {
            Decision::Approve
        } else if aggregate >= self.review_threshold {
            Decision::ManualReview
        } else {
            Decision::Reject
        }
    }

    pub fn score(&self, stages: &StageResults, quantity: u32, history: &ClaimHistory) -> ScoreBreakdown {
        let contributions: Vec<StageContribution> = stages
            .iter()
            .map(|(stage, signal)| {
                let weight = self.weight(stage);
                let points = signal.score().map_or(0.0, |s| weight * s / 100.0);
                StageContribution {
                    stage,
                    weight,
                    signal: signal.clone(),
                    points,
                }
            })
            .collect();

        let weighted_total: f64 = contributions.iter().map(|c| c.points).sum();
        let plausibility_flags = PlausibilityFlag::evaluate(quantity, history);
        let penalty: f64 = plausibility_flags.iter().map(PlausibilityFlag::penalty).sum();
        let aggregate = (weighted_total - penalty).clamp(0.0, 100.0);

        let vetoed_by = contributions.iter().find(|c| c.signal.is_vetoed()).map(|c| c.stage);
        let decision = match vetoed_by {
            Some(_) => Decision::Reject,
            None => self.decide(aggregate),
        };

        tracing::debug!(
            weighted_total,
            penalty,
            aggregate,
            decision = decision.as_str(),
            vetoed_by = ?vetoed_by,
            "claim scored"
        );

        ScoreBreakdown {
            contributions,
            weighted_total,
            plausibility_flags,
            aggregate,
            decision,
            vetoed_by,
        }
    }
}

impl Default for PlausibilityScorer {
    fn default() -> Self {
        Self::from_params(&VerificationParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_scored(g: f64, geo: f64, c: f64) -> StageResults {
        StageResults {
            gesture: StageSignal::scored(g),
            geo: StageSignal::scored(geo),
            classifier: StageSignal::scored(c),
            satellite: StageSignal::Missing,
        }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let s = PlausibilityScorer::default();
        assert_eq!(s.decide(80.0), Decision::Approve);
        assert_eq!(s.decide(79.9), Decision::ManualReview);
        assert_eq!(s.decide(60.0), Decision::ManualReview);
        assert_eq!(s.decide(59.99), Decision::Reject);
    }

    #[test]
    fn full_marks_without_satellite_is_ninety() {
        let b = PlausibilityScorer::default().score(&all_scored(100.0, 100.0, 100.0), 1, &ClaimHistory::default());
        assert_eq!(b.aggregate, 90.0);
        assert_eq!(b.decision, Decision::Approve);
    }

    #[test]
    fn satellite_is_additive_upside() {
        let mut stages = all_scored(100.0, 100.0, 100.0);
        stages.satellite = StageSignal::scored(100.0);
        let b = PlausibilityScorer::default().score(&stages, 1, &ClaimHistory::default());
        assert_eq!(b.aggregate, 100.0);
    }

    #[test]
    fn degraded_classifier_contributes_zero() {
        let mut stages = all_scored(100.0, 100.0, 0.0);
        stages.classifier = StageSignal::degraded("timeout");
        let b = PlausibilityScorer::default().score(&stages, 1, &ClaimHistory::default());
        assert_eq!(b.aggregate, 50.0);
        assert_eq!(b.decision, Decision::Reject);
        assert_eq!(b.degraded_stages().collect::<Vec<_>>(), vec![StageKind::Classifier]);
    }

    #[test]
    fn veto_forces_reject() {
        let mut stages = all_scored(100.0, 100.0, 0.0);
        stages.classifier = StageSignal::vetoed("blank image");
        stages.satellite = StageSignal::scored(100.0);
        let b = PlausibilityScorer::default().score(&stages, 1, &ClaimHistory::default());
        assert_eq!(b.decision, Decision::Reject);
        assert_eq!(b.vetoed_by, Some(StageKind::Classifier));
    }

    #[test]
    fn penalties_subtract_and_clamp() {
        let history = ClaimHistory {
            submissions_last_24h: 20,
            ..Default::default()
        };
        let b = PlausibilityScorer::default().score(&all_scored(100.0, 100.0, 100.0), 600, &history);
        assert_eq!(b.plausibility_flags.len(), 2);
        assert_eq!(b.aggregate, 10.0);
        assert_eq!(b.decision, Decision::Reject);
    }

    #[test]
    fn negative_weights_are_zeroed() {
        let weights = StageWeights {
            gesture: -10.0,
            ..StageWeights::default()
        };
        let s = PlausibilityScorer::new(weights, 80.0, 60.0);
        let b = s.score(&all_scored(100.0, 100.0, 100.0), 1, &ClaimHistory::default());
        assert_eq!(b.aggregate, 60.0);
    }
}
