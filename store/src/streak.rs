//! Watering-streak storage trait.

use crate::StoreError;
use sprout_types::{CalendarDay, PlantId};
use serde::{Deserialize, Serialize};

/// Per-plant watering streak.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRecord {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_count: u32,
    pub last_activity_date: Option<CalendarDay>,
    /// Largest milestone (in days) already paid out. Never decreases.
    pub highest_milestone: u32,
}

pub trait StreakStore {
    /// The plant's streak, or `None` if it was never watered.
    fn get_streak(&self, plant: &PlantId) -> Result<Option<StreakRecord>, StoreError>;
}
