//! Classification results and the adapter trait.

use crate::error::ClassifierError;
use async_trait::async_trait;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sprout_types::ActivityType;

type Blake2b256 = Blake2b<U32>;

/// Context passed alongside the evidence bytes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationHint {
    pub activity_type: Option<ActivityType>,
    /// Label the activity expects, e.g. `water_visible`.
    pub expected_label: Option<String>,
    pub species: Option<String>,
    /// Fingerprint stored from the plant's first verified photo.
    pub fingerprint: Option<String>,
}

impl ClassificationHint {
    pub fn for_activity(activity_type: ActivityType) -> Self {
        Self {
            activity_type: Some(activity_type),
            expected_label: Some(activity_type.expected_label().to_string()),
            ..Self::default()
        }
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.fingerprint = fingerprint;
        self
    }
}

/// A successful classification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// In [0, 100].
    pub confidence: f64,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl ClassificationResult {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 100.0),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// `health_score` attribute, clamped to 0..=100.
    pub fn health_score(&self) -> Option<u8> {
        self.attributes
            .get("health_score")
            .and_then(Value::as_f64)
            .map(|v| v.clamp(0.0, 100.0).round() as u8)
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.attributes.get("fingerprint").and_then(Value::as_str)
    }

    /// The classifier's same-plant judgement against the hinted fingerprint.
    pub fn same_plant(&self) -> Option<bool> {
        self.attributes.get("same_plant").and_then(Value::as_bool)
    }

    /// Score this result for an activity expecting `expected_label`.
    ///
    /// A label mismatch scores zero. A `same_plant = false` answer halves the
    /// score.
    pub fn verdict(&self, expected_label: &str) -> ClassifierVerdict {
        let label_matched = self.label.eq_ignore_ascii_case(expected_label);
        let plant_mismatch = self.same_plant() == Some(false);
        let mut score = if label_matched { self.confidence.clamp(0.0, 100.0) } else { 0.0 };
        if plant_mismatch {
            score /= 2.0;
        }
        ClassifierVerdict {
            score,
            label_matched,
            plant_mismatch,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub score: f64,
    pub label_matched: bool,
    pub plant_mismatch: bool,
}

/// An external content classifier.
#[async_trait]
pub trait EvidenceClassifier: Send + Sync {
    async fn classify(&self, evidence: &[u8], hint: &ClassificationHint) -> Result<ClassificationResult, ClassifierError>;
}

/// Fallback plant fingerprint when the classifier does not provide one.
pub fn image_fingerprint(image: &[u8]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(b"sprout/plant-fingerprint/v1");
    hasher.update(image);
    hex::encode(hasher.finalize())
}
