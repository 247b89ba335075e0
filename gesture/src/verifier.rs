//! The gesture check itself.

use crate::debounce::{Debouncer, GestureEvent};
use crate::error::GestureError;
use crate::frame::{CaptureCancel, FrameClassifier, FrameSource};
use crate::signature::gesture_signature;
use serde::{Deserialize, Serialize};
use sprout_types::{Timestamp, VerificationParams};

/// Gesture-check configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureParams {
    pub required: u32,
    pub window_ms: u64,
    pub cooldown_ms: u64,
    pub sample_interval_ms: u64,
    pub base_weight: f64,
}

impl From<&VerificationParams> for GestureParams {
    fn from(p: &VerificationParams) -> Self {
        Self {
            required: p.required_gestures,
            window_ms: p.gesture_window_ms,
            cooldown_ms: p.gesture_cooldown_ms,
            sample_interval_ms: p.gesture_sample_interval_ms,
            base_weight: p.gesture_base_weight.clamp(0.0, 1.0),
        }
    }
}

impl Default for GestureParams {
    fn default() -> Self {
        Self::from(&VerificationParams::default())
    }
}

/// Result of one capture.
///
/// A failed check (`passed == false`) is a negative verification, not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GestureOutcome {
    pub gesture_count: u32,
    pub required: u32,
    pub signature: String,
    /// `min(1, count / required) * base_weight`, in [0, 1].
    pub confidence: f64,
    pub passed: bool,
    pub frames_sampled: u32,
    /// The capture was cut short; counts are partial.
    pub cancelled: bool,
    pub events: Vec<GestureEvent>,
}

pub struct GestureVerifier {
    params: GestureParams,
}

impl GestureVerifier {
    pub fn new(params: GestureParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GestureParams {
        &self.params
    }

    /// Consume `source` for at most one window and count gestures.
    ///
    /// Frames past the window end the capture. Frames closer than the sample
    /// interval to the previous sampled frame are skipped. Frames the
    /// classifier cannot label count as "no gesture".
    pub fn verify(
        &self,
        source: &mut dyn FrameSource,
        classifier: &dyn FrameClassifier,
        captured_at: Timestamp,
        cancel: &CaptureCancel,
    ) -> Result<GestureOutcome, GestureError> {
        let mut debouncer = Debouncer::new(self.params.cooldown_ms);
        let mut events: Vec<GestureEvent> = Vec::new();
        let mut frames_sampled = 0u32;
        let mut last_sampled: Option<u64> = None;
        let mut cancelled = false;

        while let Some(frame) = source.next_frame() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if frame.offset_ms > self.params.window_ms {
                break;
            }
            if let Some(prev) = last_sampled {
                if frame.offset_ms < prev.saturating_add(self.params.sample_interval_ms) {
                    continue;
                }
            }
            last_sampled = Some(frame.offset_ms);
            frames_sampled += 1;

            let label = match classifier.classify(&frame) {
                Ok(label) => label,
                Err(e) => {
                    tracing::debug!(offset_ms = frame.offset_ms, error = %e, "frame unclassifiable");
                    crate::GestureLabel::None
                }
            };
            if let Some(event) = debouncer.observe(frame.offset_ms, label) {
                tracing::trace!(offset_ms = event.offset_ms, label = ?event.label, "gesture counted");
                events.push(event);
            }
        }

        if frames_sampled == 0 && !cancelled {
            return Err(GestureError::NoStream);
        }

        let gesture_count = events.len() as u32;
        let outcome = GestureOutcome {
            gesture_count,
            required: self.params.required,
            signature: gesture_signature(&events, captured_at),
            confidence: self.confidence(gesture_count),
            passed: gesture_count >= self.params.required,
            frames_sampled,
            cancelled,
            events,
        };
        tracing::debug!(
            count = outcome.gesture_count,
            required = outcome.required,
            passed = outcome.passed,
            cancelled = outcome.cancelled,
            "gesture capture evaluated"
        );
        Ok(outcome)
    }

    fn confidence(&self, count: u32) -> f64 {
        if self.params.required == 0 {
            return self.params.base_weight;
        }
        let ratio = (count as f64 / self.params.required as f64).min(1.0);
        ratio * self.params.base_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, GestureLabel, VecFrameSource};

    /// Reads the label from the first payload byte: 0 none, 1 pinch, 2 thumbs-up.
    struct ByteClassifier;

    impl FrameClassifier for ByteClassifier {
        fn classify(&self, frame: &Frame) -> Result<GestureLabel, String> {
            match frame.data.first() {
                Some(0) => Ok(GestureLabel::None),
                Some(1) => Ok(GestureLabel::Pinch),
                Some(2) => Ok(GestureLabel::ThumbsUp),
                _ => Err("unreadable frame".into()),
            }
        }
    }

    fn frames(script: &[(u64, u8)]) -> VecFrameSource {
        VecFrameSource::new(script.iter().map(|&(t, b)| Frame::new(t, vec![b])).collect())
    }

    fn verify(script: &[(u64, u8)]) -> Result<GestureOutcome, GestureError> {
        let verifier = GestureVerifier::new(GestureParams::default());
        verifier.verify(
            &mut frames(script),
            &ByteClassifier,
            Timestamp::new(1_700_000_000),
            &CaptureCancel::new(),
        )
    }

    #[test]
    fn three_gestures_pass() {
        let out = verify(&[
            (0, 0),
            (1_000, 1),
            (1_100, 1),
            (1_200, 0),
            (3_000, 2),
            (3_100, 0),
            (5_000, 1),
            (5_100, 0),
        ])
        .unwrap();
        assert_eq!(out.gesture_count, 3);
        assert!(out.passed);
        assert_eq!(out.confidence, 1.0);
        assert!(!out.cancelled);
    }

    #[test]
    fn two_gestures_fail_with_partial_confidence() {
        let out = verify(&[(0, 1), (200, 0), (2_000, 1), (2_200, 0)]).unwrap();
        assert_eq!(out.gesture_count, 2);
        assert!(!out.passed);
        assert!((out.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn gestures_after_window_are_ignored() {
        let out = verify(&[(0, 1), (200, 0), (2_000, 1), (2_200, 0), (10_500, 1)]).unwrap();
        assert_eq!(out.gesture_count, 2);
    }

    #[test]
    fn empty_stream_is_an_error() {
        assert_eq!(verify(&[]), Err(GestureError::NoStream));
        // Only frames past the window count as no usable frames.
        assert_eq!(verify(&[(20_000, 1)]), Err(GestureError::NoStream));
    }

    #[test]
    fn unreadable_frames_count_as_no_gesture() {
        let out = verify(&[(0, 1), (200, 9), (1_000, 1), (1_200, 9), (2_000, 1)]).unwrap();
        assert_eq!(out.gesture_count, 3);
    }

    #[test]
    fn frames_inside_sample_interval_are_skipped() {
        // The 50 ms "none" frame would split the run if it were sampled.
        let out = verify(&[(0, 1), (50, 0), (100, 1), (700, 0)]).unwrap();
        assert_eq!(out.frames_sampled, 3);
        assert_eq!(out.gesture_count, 1);
    }

    #[test]
    fn cancellation_yields_partial_result() {
        let verifier = GestureVerifier::new(GestureParams::default());
        let cancel = CaptureCancel::new();
        cancel.cancel();
        let out = verifier
            .verify(
                &mut frames(&[(0, 1), (1_000, 1)]),
                &ByteClassifier,
                Timestamp::new(0),
                &cancel,
            )
            .unwrap();
        assert!(out.cancelled);
        assert_eq!(out.gesture_count, 0);
        assert!(!out.passed);
    }
}
