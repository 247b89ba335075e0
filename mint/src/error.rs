use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MintError {
    #[error("minting service unreachable: {0}")]
    Unreachable(String),

    #[error("mint request failed: {0}")]
    RequestFailed(String),

    /// The service refused the record. Retrying will not help.
    #[error("mint refused: {0}")]
    Refused(String),

    #[error("invalid mint response: {0}")]
    InvalidResponse(String),
}

impl MintError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Refused(_))
    }
}
