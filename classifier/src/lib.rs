//! Evidence classifier adapter.
//!
//! The classifier is an external black box (species identification, health
//! assessment, activity-presence detection). This crate fixes the interface,
//! turns answers into a stage score, and ships an HTTP client.

pub mod client;
pub mod error;
pub mod result;

pub use client::HttpClassifier;
pub use error::ClassifierError;
pub use result::{
    image_fingerprint, ClassificationHint, ClassificationResult, ClassifierVerdict, EvidenceClassifier,
};
