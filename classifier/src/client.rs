//! HTTP client for a remote classification service.

use crate::error::ClassifierError;
use crate::result::{ClassificationHint, ClassificationResult, EvidenceClassifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends `POST {base_url}/classify` with the evidence hex-encoded in a JSON body.
///
/// `200` carries a [`ClassificationResult`]. `400` and `422` mean the service
/// looked at the evidence and refused it. Everything else, including timeouts
/// and connection failures, is reported as unavailable.
pub struct HttpClassifier {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    evidence_hex: String,
    hint: &'a ClassificationHint,
}

#[derive(Debug, Deserialize)]
struct RejectBody {
    #[serde(default)]
    reason: Option<String>,
}

impl HttpClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl EvidenceClassifier for HttpClassifier {
    async fn classify(&self, evidence: &[u8], hint: &ClassificationHint) -> Result<ClassificationResult, ClassifierError> {
        let url = format!("{}/classify", self.base_url.trim_end_matches('/'));
        let body = ClassifyRequest {
            evidence_hex: hex::encode(evidence),
            hint,
        };

        let response = self.http_client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Unavailable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                ClassifierError::Unavailable(format!("connection failed: {e}"))
            } else {
                ClassifierError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let reason = response
                .json::<RejectBody>()
                .await
                .ok()
                .and_then(|b| b.reason)
                .unwrap_or_else(|| format!("HTTP status {status}"));
            return Err(ClassifierError::Rejected(reason));
        }
        if !status.is_success() {
            return Err(ClassifierError::Unavailable(format!("HTTP status {status}")));
        }

        let mut result: ClassificationResult = response
            .json()
            .await
            .map_err(|e| ClassifierError::Unavailable(format!("failed to parse classification: {e}")))?;
        result.confidence = result.confidence.clamp(0.0, 100.0);
        tracing::debug!(label = %result.label, confidence = result.confidence, "classification received");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let client = HttpClassifier::with_timeout("http://127.0.0.1:9", Duration::from_millis(500));
        let err = client
            .classify(b"jpeg", &ClassificationHint::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifierError::Unavailable(_)), "{err:?}");
    }

    #[test]
    fn request_body_shape() {
        let hint = ClassificationHint::default();
        let body = ClassifyRequest {
            evidence_hex: hex::encode([0xAB, 0x01]),
            hint: &hint,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["evidence_hex"], "ab01");
        assert!(json["hint"].is_object());
    }
}
