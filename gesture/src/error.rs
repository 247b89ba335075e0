use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GestureError {
    #[error("no usable frames arrived within the capture window")]
    NoStream,

    #[error("frame classifier failed: {0}")]
    Classifier(String),
}
