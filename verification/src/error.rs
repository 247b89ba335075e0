use sprout_ledger::LedgerError;
use sprout_types::InputError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationError {
    /// The submission could not be evaluated. Nothing was written.
    #[error("invalid submission: {0}")]
    Input(#[from] InputError),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for VerificationError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::Input(input) => Self::Input(input),
            other => Self::Ledger(other),
        }
    }
}

impl VerificationError {
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
