//! Scripted evidence classifier.

use async_trait::async_trait;
use serde_json::Value;
use sprout_classifier::{ClassificationHint, ClassificationResult, ClassifierError, EvidenceClassifier};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Debug)]
enum Answer {
    Fixed(Result<ClassificationResult, ClassifierError>),
    /// Confirm whatever label the hint expects.
    Confirm { confidence: f64 },
}

/// A classifier that answers from a script.
///
/// Queued answers are used first, one per call; after that the default answer
/// repeats. Every hint received is kept for inspection.
#[derive(Debug)]
pub struct NullClassifier {
    default: Answer,
    queued: Mutex<VecDeque<Answer>>,
    delay: Option<Duration>,
    attributes: Vec<(String, Value)>,
    hints: Mutex<Vec<ClassificationHint>>,
}

impl NullClassifier {
    fn with_default(default: Answer) -> Self {
        Self {
            default,
            queued: Mutex::new(VecDeque::new()),
            delay: None,
            attributes: Vec::new(),
            hints: Mutex::new(Vec::new()),
        }
    }

    /// Always confirms the expected label at `confidence`.
    pub fn confirming(confidence: f64) -> Self {
        Self::with_default(Answer::Confirm { confidence })
    }

    pub fn answering(result: ClassificationResult) -> Self {
        Self::with_default(Answer::Fixed(Ok(result)))
    }

    pub fn unavailable(reason: &str) -> Self {
        Self::with_default(Answer::Fixed(Err(ClassifierError::Unavailable(reason.into()))))
    }

    pub fn rejecting(reason: &str) -> Self {
        Self::with_default(Answer::Fixed(Err(ClassifierError::Rejected(reason.into()))))
    }

    /// Queue one answer ahead of the default.
    pub fn then(self, result: Result<ClassificationResult, ClassifierError>) -> Self {
        if let Ok(mut q) = self.queued.lock() {
            q.push_back(Answer::Fixed(result));
        }
        self
    }

    /// Sleep before answering (on the tokio clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Attach an attribute to every confirming answer.
    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.push((key.to_string(), value.into()));
        self
    }

    /// Hints received so far, oldest first.
    pub fn hints(&self) -> Vec<ClassificationHint> {
        self.hints.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.hints.lock().map(|h| h.len()).unwrap_or(0)
    }
}

#[async_trait]
impl EvidenceClassifier for NullClassifier {
    async fn classify(&self, _evidence: &[u8], hint: &ClassificationHint) -> Result<ClassificationResult, ClassifierError> {
        if let Ok(mut hints) = self.hints.lock() {
            hints.push(hint.clone());
        }
        let answer = self
            .queued
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| self.default.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match answer {
            Answer::Fixed(result) => result,
            Answer::Confirm { confidence } => {
                let label = hint.expected_label.clone().unwrap_or_else(|| "plant_present".into());
                let mut result = ClassificationResult::new(label, confidence);
                for (k, v) in &self.attributes {
                    result = result.with_attribute(k, v.clone());
                }
                Ok(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_types::ActivityType;

    #[tokio::test]
    async fn confirms_expected_label() {
        let c = NullClassifier::confirming(90.0).with_attribute("health_score", 70);
        let r = c
            .classify(b"img", &ClassificationHint::for_activity(ActivityType::Watering))
            .await
            .unwrap();
        assert_eq!(r.label, "water_visible");
        assert_eq!(r.health_score(), Some(70));
        assert_eq!(c.calls(), 1);
    }

    #[tokio::test]
    async fn queued_answers_come_first() {
        let c = NullClassifier::confirming(90.0).then(Err(ClassifierError::Unavailable("busy".into())));
        let hint = ClassificationHint::default();
        assert!(c.classify(b"", &hint).await.is_err());
        assert!(c.classify(b"", &hint).await.is_ok());
    }
}
