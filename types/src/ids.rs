//! Identifier newtypes for users, plants, activities and ledger rows.

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted length of a caller-supplied identifier.
const MAX_ID_LEN: usize = 128;

fn validate_raw(kind: &'static str, raw: &str) -> Result<(), InputError> {
    if raw.is_empty() || raw.len() > MAX_ID_LEN {
        return Err(InputError::MalformedId {
            kind,
            value: raw.to_string(),
        });
    }
    if !raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(InputError::MalformedId {
            kind,
            value: raw.to_string(),
        });
    }
    Ok(())
}

/// Identity of a registered user.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Parse a user id. Ids are 1..=128 chars of `[A-Za-z0-9_-]`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InputError> {
        let s = raw.into();
        validate_raw("user", &s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a registered plant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlantId(String);

impl PlantId {
    /// Parse a plant id. Same alphabet and length rules as [`UserId`].
    pub fn parse(raw: impl Into<String>) -> Result<Self, InputError> {
        let s = raw.into();
        validate_raw("plant", &s)?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned, monotonically increasing activity number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityId(u64);

impl ActivityId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "act-{}", self.0)
    }
}

/// Store-assigned, monotonically increasing points-ledger row number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}
