use std::sync::{Arc, Mutex};

use sprout_ledger::ReviewResolution;
use sprout_node::{EngineConfig, EngineEvent, NodeError, SproutNode};
use sprout_nullables::{
    recording_with_gestures, NullClassifier, NullClock, NullFrameClassifier, NullMinter, NullSatellite, NullStore,
};
use sprout_types::{ActivityStatus, ActivityType, MintStatus, UserId, VerificationParams};
use sprout_verification::{Evidence, Orchestrator, Submission};

/// 2024-01-01T12:00:00Z
const NOON: u64 = 1_704_110_400;

fn evidence() -> Evidence {
    Evidence::new()
        .with_image(b"tulsi after watering".to_vec())
        .with_gesture_frames(recording_with_gestures(&[1_000, 3_000, 5_000], 8_000))
}

fn submission(evidence: Evidence, location: &str) -> Submission {
    Submission {
        plant_id: "tulsi-1".into(),
        activity_type: ActivityType::Watering,
        claimed_location: Some(location.into()),
        evidence,
    }
}

type Events = Arc<Mutex<Vec<EngineEvent>>>;

fn node_with(
    config: EngineConfig,
    classifier: NullClassifier,
    extra: impl FnOnce(Orchestrator<NullStore>) -> Orchestrator<NullStore>,
) -> (SproutNode<NullStore>, Arc<NullClock>, Events) {
    let (node, clock, events) = node_on(Arc::new(NullStore::new()), config, classifier, extra);
    node.register_user("asha", Some("Asha".into())).unwrap();
    node.register_plant("asha", "tulsi-1", "tulsi", Some("19.0760,72.8777"))
        .unwrap();
    (node, clock, events)
}

fn node_on(
    store: Arc<NullStore>,
    config: EngineConfig,
    classifier: NullClassifier,
    extra: impl FnOnce(Orchestrator<NullStore>) -> Orchestrator<NullStore>,
) -> (SproutNode<NullStore>, Arc<NullClock>, Events) {
    let clock = Arc::new(NullClock::new(NOON));
    let orchestrator = Orchestrator::new(
        store,
        clock.clone(),
        config.verification.clone(),
        config.rewards.clone(),
        Arc::new(NullFrameClassifier),
    )
    .with_classifier(Arc::new(classifier));
    let orchestrator = extra(orchestrator);

    let mut node = SproutNode::with_orchestrator(config, orchestrator).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    node.subscribe(Box::new(move |e| sink.lock().unwrap().push(e.clone())));
    (node, clock, events)
}

fn metrics_config() -> EngineConfig {
    EngineConfig {
        enable_metrics: true,
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn approval_updates_metrics_and_emits_events() {
    let (node, _, events) = node_with(metrics_config(), NullClassifier::confirming(95.0), |o| o);

    let report = node
        .submit(submission(evidence(), "19.0760,72.8777"))
        .await
        .unwrap();
    assert_eq!(report.status, ActivityStatus::Approved);

    let metrics = node.metrics().unwrap();
    assert_eq!(metrics.submissions.get(), 1);
    assert_eq!(metrics.points_awarded.get(), 5);
    assert_eq!(metrics.decisions.with_label_values(&["approve"]).get(), 1);

    let events = events.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[EngineEvent::ActivityRecorded {
            activity: report.activity,
            plant: report.plant.clone(),
            user: report.user.clone(),
            status: ActivityStatus::Approved,
            points: 5,
        }]
    );
}

#[tokio::test]
async fn malformed_submission_counts_as_input_error() {
    let (node, _, events) = node_with(metrics_config(), NullClassifier::confirming(95.0), |o| o);

    let err = node
        .submit(submission(evidence(), "not a place"))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::Input(_)));

    let err = node
        .submit(submission(Evidence::new(), "19.0760,72.8777"))
        .await
        .unwrap_err();
    assert!(matches!(err, NodeError::Verification(_)));

    let metrics = node.metrics().unwrap();
    assert_eq!(metrics.input_errors.get(), 2);
    assert_eq!(metrics.submissions.get(), 0);
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn review_is_queued_then_resolved() {
    let (node, _, events) = node_with(metrics_config(), NullClassifier::unavailable("model offline"), |o| {
        o.with_satellite(Arc::new(NullSatellite::scoring(100.0)))
    });

    let report = node
        .submit(submission(evidence(), "19.0760,72.8777"))
        .await
        .unwrap();
    assert_eq!(report.status, ActivityStatus::PendingReview);
    assert!(events.lock().unwrap().contains(&EngineEvent::ReviewQueued {
        activity: report.activity,
        plant: report.plant.clone(),
    }));

    let outcome = node
        .resolve_review(report.activity, ReviewResolution::Approve, "photo checked by hand")
        .unwrap();
    assert_eq!(outcome.status, ActivityStatus::Approved);
    assert_eq!(outcome.points_awarded, 5);

    let metrics = node.metrics().unwrap();
    assert_eq!(metrics.degraded_stages.with_label_values(&["classifier"]).get(), 1);
    assert_eq!(metrics.points_awarded.get(), 5);

    let state = node.get_ledger_state(&UserId::parse("asha").unwrap()).unwrap();
    assert_eq!(state.total_points, 5);
}

#[tokio::test]
async fn duplicates_are_counted() {
    let (node, _, _) = node_with(metrics_config(), NullClassifier::confirming(95.0), |o| o);
    node.submit(submission(evidence(), "19.0760,72.8777")).await.unwrap();
    let second = node
        .submit(submission(evidence(), "19.0760,72.8777"))
        .await
        .unwrap();

    assert!(second.is_duplicate());
    assert_eq!(node.metrics().unwrap().duplicate_rejections.get(), 1);
}

#[tokio::test]
async fn milestone_event_on_seventh_day() {
    let (node, clock, events) = node_with(EngineConfig::default(), NullClassifier::confirming(95.0), |o| o);
    for day in 0..7 {
        if day > 0 {
            clock.advance_days(1);
        }
        node.submit(submission(evidence(), "19.0760,72.8777")).await.unwrap();
    }

    let events = events.lock().unwrap();
    let milestones: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::MilestoneReached { .. }))
        .collect();
    assert_eq!(milestones.len(), 1);
    assert!(matches!(
        milestones[0],
        EngineEvent::MilestoneReached { days: 7, bonus: 10, .. }
    ));
    assert!(node.metrics().is_none());
}

#[tokio::test]
async fn finished_mints_are_reported() {
    let config = EngineConfig {
        enable_metrics: true,
        verification: VerificationParams {
            mint_base_backoff_ms: 10,
            ..VerificationParams::default()
        },
        ..EngineConfig::default()
    };
    let minter = Arc::new(NullMinter::succeeding());
    let m = minter.clone();
    let (node, _, events) = node_with(config, NullClassifier::confirming(95.0), move |o| o.with_minter(m));

    let report = node
        .submit(submission(evidence(), "19.0760,72.8777"))
        .await
        .unwrap();
    assert!(matches!(report.mint, Some(MintStatus::Pending { .. })));

    let statuses = node.finish_mints().await;
    assert_eq!(statuses.len(), 1);
    assert!(matches!(statuses[0], MintStatus::Minted { .. }));
    assert_eq!(minter.calls(), 1);
    assert_eq!(node.metrics().unwrap().mints_completed.get(), 1);

    let events = events.lock().unwrap();
    assert!(events.contains(&EngineEvent::MintScheduled {
        activity: report.activity
    }));
    assert!(matches!(events.last(), Some(EngineEvent::MintFinished { .. })));
}

#[tokio::test]
async fn restart_picks_up_unfinished_mints() {
    let config = EngineConfig {
        enable_metrics: true,
        ..EngineConfig::default()
    };
    let store = Arc::new(NullStore::new());
    let (crashed, _, _) = node_on(store.clone(), config.clone(), NullClassifier::confirming(95.0), |o| {
        o.with_minter(Arc::new(NullMinter::stalled()))
    });
    crashed.register_user("asha", None).unwrap();
    crashed
        .register_plant("asha", "tulsi-1", "tulsi", Some("19.0760,72.8777"))
        .unwrap();
    let report = crashed
        .submit(submission(evidence(), "19.0760,72.8777"))
        .await
        .unwrap();

    let minter = Arc::new(NullMinter::succeeding());
    let m = minter.clone();
    let (node, _, events) = node_on(store, config, NullClassifier::confirming(95.0), move |o| o.with_minter(m));
    assert_eq!(node.retry_pending_mints().unwrap(), vec![report.activity]);

    let statuses = node.finish_mints().await;
    assert!(matches!(statuses.as_slice(), [MintStatus::Minted { .. }]));
    assert_eq!(minter.calls(), 1);
    assert_eq!(node.metrics().unwrap().mints_completed.get(), 1);
    assert!(events.lock().unwrap().contains(&EngineEvent::MintScheduled {
        activity: report.activity
    }));
}

#[test]
fn unknown_owner_is_refused() {
    let store = Arc::new(NullStore::new());
    let node = SproutNode::new(
        EngineConfig::default(),
        store,
        Arc::new(NullClock::new(NOON)),
        Arc::new(NullFrameClassifier),
    )
    .unwrap();
    let err = node.register_plant("nobody", "fern-1", "fern", None).unwrap_err();
    assert!(matches!(err, NodeError::Ledger(_)));
}
