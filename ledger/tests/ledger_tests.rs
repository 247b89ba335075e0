use std::sync::Arc;

use sprout_ledger::{
    ActivityClaim, LedgerError, PointsLedger, RejectionReason, ReviewResolution,
};
use sprout_nullables::{NullClock, NullStore};
use sprout_store::{
    ActivityEffects, ActivityStore, MintStore, PlantStore, StreakStore, UserStore,
};
use sprout_types::{
    ActivityStatus, ActivityType, Decision, GeoPoint, InputError, LocationProfile, MintStatus,
    PlantId, RemedyKind, RewardParams, Timestamp, UserId, SECS_PER_DAY,
};

/// 2024-01-01T12:00:00Z
const NOON: u64 = 1_704_110_400;

struct Fixture {
    ledger: PointsLedger<NullStore>,
    clock: Arc<NullClock>,
    user: UserId,
    plant: PlantId,
}

fn fixture() -> Fixture {
    let store = Arc::new(NullStore::new());
    let clock = Arc::new(NullClock::new(NOON));
    let ledger = PointsLedger::new(store, RewardParams::default(), clock.clone());
    let user = UserId::parse("asha").unwrap();
    let plant = PlantId::parse("tulsi-1").unwrap();
    ledger.register_user(user.clone(), Some("Asha".into())).unwrap();
    ledger
        .register_plant(&user, plant.clone(), "tulsi", Some(GeoPoint::new(19.076, 72.8777).unwrap()))
        .unwrap();
    Fixture {
        ledger,
        clock,
        user,
        plant,
    }
}

fn claim(plant: &PlantId, activity_type: ActivityType, day: u64, decision: Decision) -> ActivityClaim {
    ActivityClaim {
        plant: plant.clone(),
        activity_type,
        quantity: 1,
        claimed_at: Timestamp::new(NOON + day * SECS_PER_DAY),
        decision,
        detail: None,
        effects: ActivityEffects::default(),
        gesture_signature: None,
        report: serde_json::json!({}),
    }
}

fn signed(mut claim: ActivityClaim, signature: &str) -> ActivityClaim {
    claim.gesture_signature = Some(signature.to_string());
    claim
}

fn water(f: &Fixture, day: u64) -> sprout_ledger::RecordOutcome {
    f.ledger
        .record(claim(&f.plant, ActivityType::Watering, day, Decision::Approve))
        .unwrap()
}

#[test]
fn first_watering_awards_base_points_and_starts_streak() {
    let f = fixture();
    let out = water(&f, 0);
    assert_eq!(out.status, ActivityStatus::Approved);
    assert_eq!(out.points_awarded, 5);
    let streak = out.streak.unwrap();
    assert_eq!((streak.current_streak, streak.longest_streak), (1, 1));

    let user = f.ledger.store().require_user(&f.user).unwrap();
    assert_eq!(user.total_points, 5);
    let plant = f.ledger.store().require_plant(&f.plant).unwrap();
    assert_eq!(plant.total_points_earned, 5);
    assert!(f.ledger.audit_user(&f.user).unwrap());
}

#[test]
fn same_day_second_watering_is_duplicate() {
    let f = fixture();
    let first = water(&f, 0);
    let second = water(&f, 0);
    assert_eq!(second.status, ActivityStatus::Rejected);
    assert_eq!(second.points_awarded, 0);
    assert_eq!(
        second.rejection,
        Some(RejectionReason::DuplicateActivity { original: first.activity })
    );

    // Original untouched, both attempts stored.
    let original = f.ledger.store().get_activity(first.activity).unwrap().unwrap();
    assert_eq!(original.status, ActivityStatus::Approved);
    assert_eq!(f.ledger.store().activities_for_plant(&f.plant).unwrap().len(), 2);
    assert_eq!(f.ledger.store().require_user(&f.user).unwrap().total_points, 5);
}

#[test]
fn rejected_then_approved_same_day_is_not_duplicate() {
    let f = fixture();
    let rejected = f
        .ledger
        .record(claim(&f.plant, ActivityType::Watering, 0, Decision::Reject))
        .unwrap();
    assert_eq!(
        rejected.rejection,
        Some(RejectionReason::Verification { detail: "verification rejected".into() })
    );
    let approved = water(&f, 0);
    assert_eq!(approved.status, ActivityStatus::Approved);
}

#[test]
fn seventh_consecutive_day_pays_bonus_once() {
    let f = fixture();
    for day in 0..6 {
        assert_eq!(water(&f, day).points_awarded, 5);
    }
    let seventh = water(&f, 6);
    assert_eq!(seventh.points_awarded, 15);
    assert_eq!(seventh.milestones.len(), 1);

    for day in 7..14 {
        assert_eq!(water(&f, day).points_awarded, 5);
    }
    let streak = f.ledger.store().get_streak(&f.plant).unwrap().unwrap();
    assert_eq!(streak.current_streak, 14);
    assert_eq!(streak.highest_milestone, 7);
    assert_eq!(f.ledger.store().require_user(&f.user).unwrap().total_points, 14 * 5 + 10);
    assert!(f.ledger.audit_user(&f.user).unwrap());

    // Bonus is its own ledger row.
    let state = f.ledger.ledger_state(&f.user).unwrap();
    assert_eq!(state.history.len(), 15);
}

#[test]
fn gap_resets_streak_but_not_longest() {
    let f = fixture();
    for day in 0..4 {
        water(&f, day);
    }
    let out = water(&f, 6);
    let streak = out.streak.unwrap();
    assert_eq!(streak.current_streak, 1);
    assert_eq!(streak.longest_streak, 4);
}

#[test]
fn manual_review_holds_points_until_resolved() {
    let f = fixture();
    let pending = f
        .ledger
        .record(claim(&f.plant, ActivityType::Watering, 0, Decision::ManualReview))
        .unwrap();
    assert_eq!(pending.status, ActivityStatus::PendingReview);
    assert_eq!(pending.points_awarded, 0);
    assert_eq!(f.ledger.store().require_user(&f.user).unwrap().total_points, 0);

    f.clock.advance(3_600);
    let resolved = f
        .ledger
        .resolve_review(pending.activity, ReviewResolution::Approve, "photo checked by hand")
        .unwrap();
    assert_eq!(resolved.status, ActivityStatus::Approved);
    assert_eq!(resolved.points_awarded, 5);

    let row = f.ledger.store().get_activity(resolved.activity).unwrap().unwrap();
    assert_eq!(row.resolves, Some(pending.activity));
    let original = f.ledger.store().get_activity(pending.activity).unwrap().unwrap();
    assert_eq!(original.status, ActivityStatus::PendingReview);

    let again = f
        .ledger
        .resolve_review(pending.activity, ReviewResolution::Approve, "twice");
    assert!(matches!(again, Err(LedgerError::AlreadyResolved(id)) if id == pending.activity));
}

#[test]
fn review_rejection_records_note() {
    let f = fixture();
    let pending = f
        .ledger
        .record(claim(&f.plant, ActivityType::Watering, 0, Decision::ManualReview))
        .unwrap();
    let out = f
        .ledger
        .resolve_review(pending.activity, ReviewResolution::Reject, "different plant")
        .unwrap();
    assert_eq!(out.status, ActivityStatus::Rejected);
    assert_eq!(
        out.rejection,
        Some(RejectionReason::ReviewRejected { note: "different plant".into() })
    );
}

#[test]
fn resolving_a_non_pending_activity_fails() {
    let f = fixture();
    let approved = water(&f, 0);
    assert!(matches!(
        f.ledger.resolve_review(approved.activity, ReviewResolution::Approve, ""),
        Err(LedgerError::NotPendingReview(_))
    ));
    assert!(matches!(
        f.ledger.resolve_review(sprout_types::ActivityId::new(999), ReviewResolution::Approve, ""),
        Err(LedgerError::ActivityNotFound(_))
    ));
}

#[test]
fn review_approval_loses_to_later_duplicate() {
    let f = fixture();
    let pending = f
        .ledger
        .record(claim(&f.plant, ActivityType::Watering, 0, Decision::ManualReview))
        .unwrap();
    let approved = water(&f, 0);
    let out = f
        .ledger
        .resolve_review(pending.activity, ReviewResolution::Approve, "ok")
        .unwrap();
    assert_eq!(
        out.rejection,
        Some(RejectionReason::DuplicateActivity { original: approved.activity })
    );
}

#[test]
fn reused_gesture_recording_is_rejected_on_another_plant() {
    let f = fixture();
    let second = PlantId::parse("tulsi-2").unwrap();
    f.ledger.register_plant(&f.user, second.clone(), "tulsi", None).unwrap();

    let first = f
        .ledger
        .record(signed(claim(&f.plant, ActivityType::Watering, 0, Decision::Approve), "abc123"))
        .unwrap();
    assert_eq!(first.status, ActivityStatus::Approved);

    let replay = f
        .ledger
        .record(signed(claim(&second, ActivityType::Watering, 0, Decision::Approve), "abc123"))
        .unwrap();
    assert_eq!(replay.status, ActivityStatus::Rejected);
    assert_eq!(
        replay.rejection,
        Some(RejectionReason::ReplayedGesture { original: first.activity })
    );
    assert_eq!(replay.points_awarded, 0);

    let fresh = f
        .ledger
        .record(signed(claim(&second, ActivityType::Watering, 0, Decision::Approve), "def456"))
        .unwrap();
    assert_eq!(fresh.status, ActivityStatus::Approved);
    assert_eq!(f.ledger.store().require_user(&f.user).unwrap().total_points, 10);
}

#[test]
fn review_resolution_is_not_a_replay_of_its_own_attempt() {
    let f = fixture();
    let pending = f
        .ledger
        .record(signed(claim(&f.plant, ActivityType::Watering, 0, Decision::ManualReview), "abc123"))
        .unwrap();
    let resolved = f
        .ledger
        .resolve_review(pending.activity, ReviewResolution::Approve, "looks fine")
        .unwrap();
    assert_eq!(resolved.status, ActivityStatus::Approved);
    let row = f.ledger.store().get_activity(resolved.activity).unwrap().unwrap();
    assert_eq!(row.gesture_signature.as_deref(), Some("abc123"));
}

#[test]
fn protection_is_one_time() {
    let f = fixture();
    let first = f
        .ledger
        .record(claim(&f.plant, ActivityType::Protection, 0, Decision::Approve))
        .unwrap();
    assert_eq!(first.points_awarded, 10);
    let second = f
        .ledger
        .record(claim(&f.plant, ActivityType::Protection, 5, Decision::Approve))
        .unwrap();
    assert_eq!(
        second.rejection,
        Some(RejectionReason::OneTimeAlreadyClaimed { original: first.activity })
    );
}

#[test]
fn health_scans_are_capped_per_week() {
    let f = fixture();
    let scan = |day| {
        f.ledger
            .record(claim(&f.plant, ActivityType::HealthScan, day, Decision::Approve))
            .unwrap()
    };
    assert_eq!(scan(0).points_awarded, 5);
    assert_eq!(scan(1).points_awarded, 5);
    let third = scan(2);
    assert!(matches!(third.rejection, Some(RejectionReason::WeeklyCapReached { cap: 2, .. })));
    // Day 0 has left the window by day 7.
    assert_eq!(scan(7).status, ActivityStatus::Approved);
}

#[test]
fn remedy_points_depend_on_kind() {
    let f = fixture();
    let neem = f
        .ledger
        .record(claim(&f.plant, ActivityType::Remedy(RemedyKind::NeemOil), 0, Decision::Approve))
        .unwrap();
    let compost = f
        .ledger
        .record(claim(&f.plant, ActivityType::Remedy(RemedyKind::Compost), 0, Decision::Approve))
        .unwrap();
    assert_eq!(neem.points_awarded, 25);
    assert_eq!(compost.points_awarded, 20);
}

#[test]
fn accepted_scan_updates_health_and_first_photo_sets_fingerprint() {
    let f = fixture();
    let mut c = claim(&f.plant, ActivityType::HealthScan, 0, Decision::Approve);
    c.effects.health_score = Some(64);
    c.effects.fingerprint = Some("fp-1".into());
    f.ledger.record(c).unwrap();

    let mut c = claim(&f.plant, ActivityType::PlantingPhoto, 0, Decision::Approve);
    c.effects.fingerprint = Some("fp-2".into());
    f.ledger.record(c).unwrap();

    let plant = f.ledger.store().require_plant(&f.plant).unwrap();
    assert_eq!(plant.health_score, 64);
    assert_eq!(plant.fingerprint.as_deref(), Some("fp-1"));
}

#[test]
fn first_claim_baseline_is_kept_unless_rejected() {
    let f = fixture();
    let bare = PlantId::parse("bamboo-1").unwrap();
    f.ledger.register_plant(&f.user, bare.clone(), "bamboo", None).unwrap();
    let profile = LocationProfile::new(GeoPoint::new(22.7196, 75.8577).unwrap(), Timestamp::new(NOON));

    let mut rejected = claim(&bare, ActivityType::Watering, 0, Decision::Reject);
    rejected.effects.location_profile = Some(profile);
    f.ledger.record(rejected).unwrap();
    assert!(f.ledger.store().require_plant(&bare).unwrap().location_profile.is_none());

    let mut approved = claim(&bare, ActivityType::Watering, 0, Decision::Approve);
    approved.effects.location_profile = Some(profile);
    f.ledger.record(approved).unwrap();
    assert_eq!(f.ledger.store().require_plant(&bare).unwrap().location_profile, Some(profile));
}

#[test]
fn inactive_plant_is_an_input_error_and_writes_nothing() {
    let f = fixture();
    f.ledger.deactivate_plant(&f.plant).unwrap();
    let before = f.ledger.store().activity_count();
    let err = f
        .ledger
        .record(claim(&f.plant, ActivityType::Watering, 0, Decision::Approve))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Input(InputError::InactivePlant(_))));
    assert_eq!(f.ledger.store().activity_count(), before);
}

#[test]
fn inactive_user_blocks_plant_registration() {
    let f = fixture();
    f.ledger.deactivate_user(&f.user).unwrap();
    let err = f
        .ledger
        .register_plant(&f.user, PlantId::parse("neem-1").unwrap(), "neem", None)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Input(InputError::InactiveUser(_))));
}

#[test]
fn registration_rules() {
    let f = fixture();
    let again = f.ledger.register_user(f.user.clone(), Some("Other".into())).unwrap();
    assert_eq!(again.display_name.as_deref(), Some("Asha"));

    let dup = f.ledger.register_plant(&f.user, f.plant.clone(), "tulsi", None);
    assert!(matches!(dup, Err(LedgerError::PlantExists(_))));

    let ghost = UserId::parse("ghost").unwrap();
    let orphan = f.ledger.register_plant(&ghost, PlantId::parse("p").unwrap(), "aloe vera", None);
    assert!(matches!(orphan, Err(LedgerError::Input(InputError::UnknownUser(_)))));
}

#[test]
fn failed_commit_leaves_no_trace() {
    let f = fixture();
    f.ledger.store().fail_next_commit();
    let err = f
        .ledger
        .record(claim(&f.plant, ActivityType::Watering, 0, Decision::Approve))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Storage(_)));
    assert_eq!(f.ledger.store().activity_count(), 0);
    assert_eq!(f.ledger.store().transaction_count(), 0);
    assert!(f.ledger.store().get_streak(&f.plant).unwrap().is_none());

    // Retrying succeeds as if the first attempt never happened.
    assert_eq!(water(&f, 0).status, ActivityStatus::Approved);
}

#[test]
fn approval_queues_mint_when_enabled() {
    let store = Arc::new(NullStore::new());
    let clock = Arc::new(NullClock::new(NOON));
    let ledger = PointsLedger::new(store, RewardParams::default(), clock).with_minting(true);
    let user = UserId::parse("ravi").unwrap();
    let plant = PlantId::parse("neem-7").unwrap();
    ledger.register_user(user.clone(), None).unwrap();
    ledger.register_plant(&user, plant.clone(), "neem", None).unwrap();

    let out = ledger
        .record(claim(&plant, ActivityType::Purchase, 0, Decision::Approve))
        .unwrap();
    assert!(out.mint_scheduled);
    let mint = ledger.store().get_mint(out.activity).unwrap().unwrap();
    assert_eq!(mint.status, MintStatus::Pending { attempts: 0 });

    let rejected = ledger
        .record(claim(&plant, ActivityType::Watering, 0, Decision::Reject))
        .unwrap();
    assert!(!rejected.mint_scheduled);
    assert!(ledger.store().get_mint(rejected.activity).unwrap().is_none());
}

#[test]
fn ledger_state_lists_newest_first() {
    let f = fixture();
    water(&f, 0);
    f.clock.advance_days(1);
    water(&f, 1);
    let state = f.ledger.ledger_state(&f.user).unwrap();
    assert_eq!(state.total_points, 10);
    assert_eq!(state.total_coins, 0);
    assert_eq!(state.history.len(), 2);
    assert!(state.history[0].created_at > state.history[1].created_at);
    assert!(state.activities[0].id > state.activities[1].id);
    assert_eq!(state.plants.len(), 1);

    let unknown = f.ledger.ledger_state(&UserId::parse("nobody").unwrap());
    assert!(matches!(unknown, Err(LedgerError::Input(InputError::UnknownUser(_)))));
}

#[test]
fn claim_history_counts_decisions() {
    let f = fixture();
    let mut c = claim(&f.plant, ActivityType::Watering, 0, Decision::Approve);
    c.quantity = 4;
    f.ledger.record(c).unwrap();
    f.ledger
        .record(claim(&f.plant, ActivityType::Watering, 1, Decision::Reject))
        .unwrap();
    f.ledger
        .record(claim(&f.plant, ActivityType::Watering, 2, Decision::ManualReview))
        .unwrap();

    let h = f.ledger.claim_history(&f.user, Timestamp::new(NOON)).unwrap();
    assert_eq!(h.average_quantity, Some(4.0));
    assert_eq!(h.submissions_last_24h, 3);
    assert_eq!(h.decided, 2);
    assert_eq!(h.approved, 1);

    let later = f
        .ledger
        .claim_history(&f.user, Timestamp::new(NOON + 2 * SECS_PER_DAY))
        .unwrap();
    assert_eq!(later.submissions_last_24h, 0);
}

#[test]
fn concurrent_same_day_waterings_yield_one_winner() {
    let f = fixture();
    let outcomes: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| water(&f, 0)))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    let approved = outcomes.iter().filter(|o| o.status == ActivityStatus::Approved).count();
    let duplicates = outcomes
        .iter()
        .filter(|o| o.rejection.as_ref().is_some_and(|r| r.is_duplicate()))
        .count();
    assert_eq!(approved, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(f.ledger.store().require_user(&f.user).unwrap().total_points, 5);
}
