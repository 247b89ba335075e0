//! Scripted gesture frames.

use sprout_gesture::{Frame, FrameClassifier, GestureLabel};

/// Labels a frame by its first payload byte: `0` none, `1` pinch,
/// `2` thumbs-up. Anything else (or an empty payload) is unreadable.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullFrameClassifier;

impl FrameClassifier for NullFrameClassifier {
    fn classify(&self, frame: &Frame) -> Result<GestureLabel, String> {
        match frame.data.first() {
            Some(0) => Ok(GestureLabel::None),
            Some(1) => Ok(GestureLabel::Pinch),
            Some(2) => Ok(GestureLabel::ThumbsUp),
            _ => Err(format!("unreadable frame at {} ms", frame.offset_ms)),
        }
    }
}

/// A recording sampled every 100 ms for `duration_ms`, with a 300 ms pinch
/// starting at each of `gesture_starts_ms`.
pub fn recording_with_gestures(gesture_starts_ms: &[u64], duration_ms: u64) -> Vec<Frame> {
    (0..=duration_ms / 100)
        .map(|i| {
            let t = i * 100;
            let held = gesture_starts_ms.iter().any(|&s| t >= s && t < s + 300);
            Frame::new(t, vec![u8::from(held)])
        })
        .collect()
}
