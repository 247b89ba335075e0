//! Frames, labels, and the capture/classification seams.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The closed set of per-frame classifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    None,
    Pinch,
    ThumbsUp,
}

impl GestureLabel {
    pub fn is_positive(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub(crate) fn tag(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Pinch => 1,
            Self::ThumbsUp => 2,
        }
    }
}

/// A captured frame.
///
/// `offset_ms` is measured from the start of the capture window. `data` is the
/// raw image payload in whatever encoding the classifier expects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub offset_ms: u64,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(offset_ms: u64, data: Vec<u8>) -> Self {
        Self { offset_ms, data }
    }
}

/// A finite, restartable sequence of frames from one capture.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Option<Frame>;

    /// Rewind to the first frame.
    fn restart(&mut self);
}

/// Labels a single frame.
///
/// Implementations wrap a real hand-landmark detector; tests use scripted ones.
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, frame: &Frame) -> Result<GestureLabel, String>;
}

/// A frame source over an in-memory recording.
#[derive(Clone, Debug, Default)]
pub struct VecFrameSource {
    frames: Vec<Frame>,
    cursor: usize,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        frame
    }

    fn restart(&mut self) {
        self.cursor = 0;
    }
}

/// Shared cancellation flag for an in-progress capture.
///
/// Cancelling does not raise an error: the verifier stops at the next frame and
/// reports whatever it has counted so far.
#[derive(Clone, Debug, Default)]
pub struct CaptureCancel(Arc<AtomicBool>);

impl CaptureCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_source_is_restartable() {
        let mut src = VecFrameSource::new(vec![Frame::new(0, vec![]), Frame::new(100, vec![])]);
        assert_eq!(src.next_frame().map(|f| f.offset_ms), Some(0));
        assert_eq!(src.next_frame().map(|f| f.offset_ms), Some(100));
        assert!(src.next_frame().is_none());
        src.restart();
        assert_eq!(src.next_frame().map(|f| f.offset_ms), Some(0));
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let a = CaptureCancel::new();
        let b = a.clone();
        b.cancel();
        assert!(a.is_cancelled());
    }
}
