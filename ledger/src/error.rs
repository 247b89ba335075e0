use sprout_types::{ActivityId, InputError, PlantId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("plant {0} is already registered")]
    PlantExists(PlantId),

    #[error("activity not found: {0}")]
    ActivityNotFound(ActivityId),

    #[error("activity {0} is not awaiting review")]
    NotPendingReview(ActivityId),

    #[error("activity {0} has already been resolved")]
    AlreadyResolved(ActivityId),

    #[error("storage error: {0}")]
    Storage(#[from] sprout_store::StoreError),
}
