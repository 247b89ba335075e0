//! Debouncing: one count per contiguous positive run, with a cool-down.

use crate::frame::GestureLabel;
use serde::{Deserialize, Serialize};

/// A counted gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureEvent {
    pub label: GestureLabel,
    pub offset_ms: u64,
}

/// Turns a stream of labelled frames into discrete gesture events.
///
/// A held pose produces a single event. A run that starts inside the cool-down
/// is counted as soon as the cool-down expires, provided the run is still going.
#[derive(Clone, Debug)]
pub struct Debouncer {
    cooldown_ms: u64,
    run_counted: bool,
    last_accepted_ms: Option<u64>,
}

impl Debouncer {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            run_counted: false,
            last_accepted_ms: None,
        }
    }

    pub fn observe(&mut self, offset_ms: u64, label: GestureLabel) -> Option<GestureEvent> {
        if !label.is_positive() {
            self.run_counted = false;
            return None;
        }
        if self.run_counted {
            return None;
        }
        let cooled = self
            .last_accepted_ms
            .map_or(true, |last| offset_ms.saturating_sub(last) >= self.cooldown_ms);
        if !cooled {
            return None;
        }
        self.run_counted = true;
        self.last_accepted_ms = Some(offset_ms);
        Some(GestureEvent { label, offset_ms })
    }
}
