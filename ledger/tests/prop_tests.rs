use std::sync::Arc;

use proptest::prelude::*;

use sprout_ledger::{advance_streak, ActivityClaim, PointsLedger};
use sprout_nullables::{NullClock, NullStore};
use sprout_store::{ActivityEffects, PointsStore, StreakRecord, UserStore};
use sprout_types::{
    ActivityType, CalendarDay, Decision, Milestone, PlantId, RewardParams, Timestamp, UserId,
    SECS_PER_DAY,
};

const NOON: u64 = 1_704_110_400;

fn decision() -> impl Strategy<Value = Decision> {
    prop_oneof![Just(Decision::Approve), Just(Decision::ManualReview), Just(Decision::Reject)]
}

fn activity_type() -> impl Strategy<Value = ActivityType> {
    prop_oneof![
        Just(ActivityType::Watering),
        Just(ActivityType::HealthScan),
        Just(ActivityType::Purchase),
        Just(ActivityType::PlantingPhoto),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The materialized total always equals the sum of ledger rows.
    #[test]
    fn totals_match_ledger_sum(
        ops in prop::collection::vec((0usize..2, activity_type(), 0u64..20, decision()), 1..40),
    ) {
        let store = Arc::new(NullStore::new());
        let ledger = PointsLedger::new(store, RewardParams::default(), Arc::new(NullClock::new(NOON)));
        let user = UserId::parse("u").unwrap();
        ledger.register_user(user.clone(), None).unwrap();
        let plants = [PlantId::parse("a").unwrap(), PlantId::parse("b").unwrap()];
        for p in &plants {
            ledger.register_plant(&user, p.clone(), "neem", None).unwrap();
        }

        for (plant, activity_type, day, decision) in ops {
            ledger.record(ActivityClaim {
                plant: plants[plant].clone(),
                activity_type,
                quantity: 1,
                claimed_at: Timestamp::new(NOON + day * SECS_PER_DAY),
                decision,
                detail: None,
                effects: ActivityEffects::default(),
                gesture_signature: None,
                report: serde_json::Value::Null,
            }).unwrap();
        }

        let total = ledger.store().require_user(&user).unwrap().total_points;
        prop_assert_eq!(total, ledger.store().ledger_sum_for_user(&user).unwrap());
        prop_assert!(total >= 0);
    }

    /// Longest never decreases, current is never zero after a watering, and
    /// each milestone pays at most once.
    #[test]
    fn streak_invariants(days in prop::collection::vec(0u64..60, 1..80)) {
        let milestones = RewardParams::default().streak_milestones;
        let mut rec = StreakRecord::default();
        let mut paid: Vec<Milestone> = Vec::new();
        for d in days {
            let adv = advance_streak(&rec, CalendarDay::new(d), &milestones);
            prop_assert!(adv.record.longest_streak >= rec.longest_streak);
            prop_assert!(adv.record.current_streak >= 1);
            prop_assert!(adv.record.longest_streak >= adv.record.current_streak);
            prop_assert!(adv.record.highest_milestone >= rec.highest_milestone);
            paid.extend(adv.milestones);
            rec = adv.record;
        }
        let mut days_paid: Vec<u32> = paid.iter().map(|m| m.days).collect();
        let n = days_paid.len();
        days_paid.dedup();
        prop_assert_eq!(days_paid.len(), n);
    }
}
