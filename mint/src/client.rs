//! HTTP client for a minting gateway.

use crate::error::MintError;
use crate::metadata::MintMetadata;
use crate::minter::{MintReceipt, RecordMinter};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// `POST {base_url}/mint` with [`MintMetadata`] as JSON, expecting a
/// [`MintReceipt`] back. A `4xx` answer is a refusal; anything else that is not
/// a success is retryable.
pub struct HttpMinter {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpMinter {
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
impl RecordMinter for HttpMinter {
    async fn mint(&self, metadata: &MintMetadata) -> Result<MintReceipt, MintError> {
        let url = format!("{}/mint", self.base_url.trim_end_matches('/'));
        let response = self.http_client.post(&url).json(metadata).send().await.map_err(|e| {
            if e.is_timeout() {
                MintError::Unreachable(format!("request timed out: {e}"))
            } else if e.is_connect() {
                MintError::Unreachable(format!("connection failed: {e}"))
            } else {
                MintError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(MintError::Refused(format!("HTTP status {status}: {body}")));
        }
        if !status.is_success() {
            return Err(MintError::RequestFailed(format!("HTTP status {status}")));
        }

        response
            .json::<MintReceipt>()
            .await
            .map_err(|e| MintError::InvalidResponse(format!("failed to parse mint receipt: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprout_types::{ActivityId, ActivityType, PlantId, UserId};

    #[tokio::test]
    async fn unreachable_gateway_is_retryable() {
        let minter = HttpMinter::with_timeout("http://127.0.0.1:9", Duration::from_millis(500));
        let metadata = MintMetadata {
            activity: ActivityId::new(1),
            plant: PlantId::parse("p1").unwrap(),
            user: UserId::parse("u1").unwrap(),
            activity_type: ActivityType::Purchase,
            species: "neem".into(),
            quantity: 1,
            location: None,
            co2_offset_kg: 30.0,
            aggregate_confidence: 92.0,
            gesture_signature: None,
        };
        let err = minter.mint(&metadata).await.unwrap_err();
        assert!(err.is_retryable(), "{err:?}");
    }
}
