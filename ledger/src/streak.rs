//! Watering-streak arithmetic.

use sprout_store::StreakRecord;
use sprout_types::{CalendarDay, Milestone};

/// Result of applying one accepted watering to a streak.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreakAdvance {
    pub record: StreakRecord,
    /// Milestones paid out by this watering. Each fires once per plant lifetime.
    pub milestones: Vec<Milestone>,
}

/// Apply an accepted watering on `day`.
///
/// * watered yesterday: the streak grows by one;
/// * already watered today: nothing changes;
/// * any longer gap (or first watering): the streak restarts at 1;
/// * a day earlier than the last watering (a late review resolution): only
///   `total_count` moves.
pub fn advance_streak(prev: &StreakRecord, day: CalendarDay, milestones: &[Milestone]) -> StreakAdvance {
    let mut next = prev.clone();
    match prev.last_activity_date {
        Some(last) if last == day => {
            return StreakAdvance {
                record: next,
                milestones: Vec::new(),
            };
        }
        Some(last) if last > day => {
            next.total_count += 1;
            return StreakAdvance {
                record: next,
                milestones: Vec::new(),
            };
        }
        Some(last) if last.next() == day => next.current_streak += 1,
        _ => next.current_streak = 1,
    }
    next.total_count += 1;
    next.last_activity_date = Some(day);
    next.longest_streak = next.longest_streak.max(next.current_streak);

    let mut paid: Vec<Milestone> = milestones
        .iter()
        .filter(|m| m.days > prev.highest_milestone && m.days <= next.current_streak)
        .copied()
        .collect();
    paid.sort_by_key(|m| m.days);
    if let Some(top) = paid.last() {
        next.highest_milestone = top.days;
    }

    StreakAdvance {
        record: next,
        milestones: paid,
    }
}
