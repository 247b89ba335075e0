use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("verification error: {0}")]
    Verification(#[from] sprout_verification::VerificationError),

    #[error("ledger error: {0}")]
    Ledger(#[from] sprout_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] sprout_store::StoreError),

    #[error("invalid input: {0}")]
    Input(#[from] sprout_types::InputError),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("logging error: {0}")]
    Logging(#[from] sprout_utils::LoggingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
