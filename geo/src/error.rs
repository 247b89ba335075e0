use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeoError {
    #[error("geo service unreachable: {0}")]
    Unreachable(String),

    #[error("geo service request failed: {0}")]
    RequestFailed(String),

    #[error("invalid geo service response: {0}")]
    InvalidResponse(String),
}
