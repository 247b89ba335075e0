use crate::error::MintError;
use crate::metadata::MintMetadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identifiers returned by the minting service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub record_id: String,
    pub external_reference: String,
}

/// An external service that durably records an approved claim.
#[async_trait]
pub trait RecordMinter: Send + Sync {
    async fn mint(&self, metadata: &MintMetadata) -> Result<MintReceipt, MintError>;
}
