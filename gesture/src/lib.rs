//! Gesture biometric verifier.
//!
//! The capture device produces a bounded stream of frames. Each sampled frame
//! is classified into a closed label set, a debouncer turns contiguous runs of
//! positive labels into discrete gesture events, and the accepted events are
//! hashed into a replay fingerprint.
//!
//! The ledger refuses a second attempt by the same user carrying a signature it
//! has already stored. The signature is not an identity proof.

pub mod debounce;
pub mod error;
pub mod frame;
pub mod signature;
pub mod verifier;

pub use debounce::{Debouncer, GestureEvent};
pub use error::GestureError;
pub use frame::{CaptureCancel, Frame, FrameClassifier, FrameSource, GestureLabel, VecFrameSource};
pub use signature::gesture_signature;
pub use verifier::{GestureOutcome, GestureParams, GestureVerifier};
