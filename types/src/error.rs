//! Input errors: a submission that cannot be evaluated at all.
//!
//! An `InputError` is returned before any Activity is created.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("malformed {kind} id: {value:?}")]
    MalformedId { kind: &'static str, value: String },

    #[error("coordinates out of range: lat {lat}, lon {lon}")]
    CoordinatesOutOfRange { lat: f64, lon: f64 },

    #[error("unparseable coordinates: {0:?}")]
    MalformedCoordinates(String),

    #[error("no evidence supplied")]
    NoEvidence,

    #[error("evidence is empty: {0}")]
    EmptyEvidence(&'static str),

    #[error("evidence captured {age_secs}s ago, older than the {max_secs}s limit")]
    StaleEvidence { age_secs: u64, max_secs: u64 },

    #[error("quantity must be at least 1")]
    ZeroQuantity,

    #[error("unknown plant {0}")]
    UnknownPlant(String),

    #[error("unknown user {0}")]
    UnknownUser(String),

    #[error("plant {0} is inactive")]
    InactivePlant(String),

    #[error("user {0} is deactivated")]
    InactiveUser(String),
}
