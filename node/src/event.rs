//! Events emitted by the engine for subscribers.

use sprout_types::{ActivityId, ActivityStatus, MintStatus, PlantId, UserId};

/// Engine-level events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// An attempt was written to the ledger, whatever its outcome.
    ActivityRecorded {
        activity: ActivityId,
        plant: PlantId,
        user: UserId,
        status: ActivityStatus,
        points: i64,
    },
    /// A watering streak paid a milestone bonus.
    MilestoneReached {
        plant: PlantId,
        user: UserId,
        days: u32,
        bonus: i64,
    },
    /// An attempt is waiting for a reviewer.
    ReviewQueued { activity: ActivityId, plant: PlantId },
    MintScheduled { activity: ActivityId },
    /// A background mint reached a terminal state.
    MintFinished { status: MintStatus },
}

/// Synchronous fan-out event bus for engine events.
///
/// Listeners are invoked inline on the emitting task; keep handlers fast to
/// avoid stalling submissions.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&EngineEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&EngineEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &EngineEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
