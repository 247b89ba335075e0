use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    /// The service could not answer. Degrades the stage; never fatal alone.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// The evidence itself is malformed or unusable. Vetoes the claim.
    #[error("classifier rejected evidence: {0}")]
    Rejected(String),
}
