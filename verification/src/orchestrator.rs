//! Verification orchestrator: runs the checkers, scores the claim, writes the
//! ledger entry and hands approvals to the minting scheduler.

use crate::error::VerificationError;
use crate::evidence::Evidence;
use crate::report::{Assessment, ClassifierDetail, StageReport, VerificationReport};
use crate::state::{OrchestratorPhase, PhaseTrail};
use sprout_classifier::{image_fingerprint, ClassificationHint, ClassifierError, EvidenceClassifier};
use sprout_geo::{GeoChecker, GeoParams, GeoReport, SatelliteLookup, SatelliteObservation, WeatherLookup};
use sprout_gesture::{CaptureCancel, Frame, FrameClassifier, GestureOutcome, GestureParams, GestureVerifier, VecFrameSource};
use sprout_ledger::{ActivityClaim, LedgerError, LedgerState, PointsLedger, RecordOutcome, ReviewResolution};
use sprout_mint::{estimate_offset_kg, MintMetadata, MintScheduler, RecordMinter, RetryPolicy};
use sprout_scoring::{PlausibilityScorer, ScoreBreakdown, StageResults, StageSignal};
use sprout_store::{ActivityEffects, LedgerStore, PlantRecord};
use sprout_types::{
    ActivityId, ActivityType, Clock, Decision, GeoPoint, MintStatus, PlantId, RewardParams,
    Timestamp, UserId, VerificationParams,
};
use sprout_utils::tracing_spans::{ledger_commit_span, stage_span, submission_span};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::Instrument;

/// Ties the checkers, the scorer, the ledger and the minting scheduler into
/// one submission workflow.
pub struct Orchestrator<S: LedgerStore + 'static> {
    ledger: PointsLedger<S>,
    params: VerificationParams,
    gesture: Arc<GestureVerifier>,
    frame_classifier: Arc<dyn FrameClassifier>,
    geo: GeoChecker,
    classifier: Option<Arc<dyn EvidenceClassifier>>,
    satellite: Option<Arc<dyn SatelliteLookup>>,
    scorer: PlausibilityScorer,
    minting: Option<MintScheduler<S>>,
    mint_tasks: Mutex<Vec<(ActivityId, JoinHandle<MintStatus>)>>,
}

impl<S: LedgerStore + 'static> Orchestrator<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        params: VerificationParams,
        rewards: RewardParams,
        frame_classifier: Arc<dyn FrameClassifier>,
    ) -> Self {
        Self {
            ledger: PointsLedger::new(store, rewards, clock),
            gesture: Arc::new(GestureVerifier::new(GestureParams::from(&params))),
            frame_classifier,
            geo: GeoChecker::new(GeoParams::from(&params)),
            classifier: None,
            satellite: None,
            scorer: PlausibilityScorer::from_params(&params),
            minting: None,
            mint_tasks: Mutex::new(Vec::new()),
            params,
        }
    }

    /// Without a classifier the content stage always runs degraded.
    pub fn with_classifier(mut self, classifier: Arc<dyn EvidenceClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherLookup>) -> Self {
        self.geo = self.geo.with_weather(weather);
        self
    }

    /// Without a satellite source the bonus stage is always missing.
    pub fn with_satellite(mut self, satellite: Arc<dyn SatelliteLookup>) -> Self {
        self.satellite = Some(satellite);
        self
    }

    /// Mint every approval through `minter`, retrying in the background.
    pub fn with_minter(mut self, minter: Arc<dyn RecordMinter>) -> Self {
        let scheduler = MintScheduler::new(
            Arc::clone(self.ledger.store()),
            minter,
            Arc::clone(self.ledger.clock()),
            RetryPolicy::from(&self.params),
        );
        self.minting = Some(scheduler);
        self.ledger = self.ledger.with_minting(true);
        self
    }

    pub fn ledger(&self) -> &PointsLedger<S> {
        &self.ledger
    }

    pub fn params(&self) -> &VerificationParams {
        &self.params
    }

    /// Verify one claimed activity and record the outcome.
    ///
    /// Only input errors (no evidence, malformed evidence, unknown or inactive
    /// plant) return `Err`; every evaluated attempt is recorded, including
    /// rejections and duplicates.
    pub async fn submit_activity(
        &self,
        plant_id: &PlantId,
        activity_type: ActivityType,
        evidence: Evidence,
        claimed_location: Option<GeoPoint>,
    ) -> Result<VerificationReport, VerificationError> {
        let span = submission_span(plant_id.as_str(), &activity_type.to_string());
        self.run(plant_id, activity_type, evidence, claimed_location)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        plant_id: &PlantId,
        activity_type: ActivityType,
        mut evidence: Evidence,
        claimed_location: Option<GeoPoint>,
    ) -> Result<VerificationReport, VerificationError> {
        let started = Instant::now();
        let mut phases = PhaseTrail::start();
        let now = self.ledger.clock().now();

        let (plant, captured_at) = match self.admit(plant_id, &evidence, now) {
            Ok(admitted) => admitted,
            Err(e) => {
                phases.advance(OrchestratorPhase::Failed);
                tracing::warn!(error = %e, "submission refused");
                return Err(e);
            }
        };

        let frames = evidence.gesture_frames.take();
        let (gesture, mut geo, classifier, satellite) = tokio::join!(
            self.gesture_stage(frames, captured_at).instrument(stage_span("gesture")),
            self.geo_stage(
                &plant,
                claimed_location,
                evidence.observed_daylight,
                now
            )
            .instrument(stage_span("geo")),
            self.classifier_stage(activity_type, &plant, evidence.media())
                .instrument(stage_span("classifier")),
            self.satellite_stage(claimed_location).instrument(stage_span("satellite")),
        );
        if activity_type == ActivityType::PlantingPhoto {
            if let Some(report) = geo.detail.as_mut() {
                report.planting_suitability = report.weather.as_ref().map(|w| w.planting_suitability());
            }
        }

        phases.advance(OrchestratorPhase::Scoring);
        let history = self.ledger.claim_history(&plant.owner, now)?;
        let stages = StageResults {
            gesture: gesture.signal.clone(),
            geo: geo.signal.clone(),
            classifier: classifier.signal.clone(),
            satellite: satellite.signal.clone(),
        };
        let score = self.scorer.score(&stages, evidence.quantity, &history);

        phases.advance(OrchestratorPhase::Deciding);
        let detail = self.decision_detail(&score);
        let effects = claim_effects(&geo, &classifier, evidence.media());
        let assessment = Assessment {
            gesture,
            geo,
            classifier,
            satellite,
            score,
        };

        phases.advance(OrchestratorPhase::Recording);
        let claim = ActivityClaim {
            plant: plant.id.clone(),
            activity_type,
            quantity: evidence.quantity,
            claimed_at: now,
            decision: assessment.decision(),
            detail,
            effects,
            gesture_signature: assessment.gesture_signature().map(str::to_owned),
            report: serde_json::to_value(&assessment).unwrap_or_default(),
        };
        let outcome = match ledger_commit_span(plant.id.as_str()).in_scope(|| self.ledger.record(claim)) {
            Ok(outcome) => outcome,
            Err(e) => {
                let e = VerificationError::from(e);
                if e.is_input() {
                    phases.advance(OrchestratorPhase::Failed);
                }
                return Err(e);
            }
        };

        let mint = if outcome.mint_scheduled {
            let metadata = mint_metadata(
                outcome.activity,
                &plant,
                activity_type,
                evidence.quantity,
                claimed_location,
                &assessment,
            );
            self.schedule_mint(metadata)
        } else {
            None
        };
        phases.advance(OrchestratorPhase::Done);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            activity = %outcome.activity,
            decision = assessment.decision().as_str(),
            aggregate = assessment.aggregate(),
            status = ?outcome.status,
            points = outcome.points_awarded,
            elapsed = %sprout_utils::format_duration_ms(elapsed_ms),
            "submission verified"
        );

        Ok(VerificationReport {
            plant: plant.id,
            user: plant.owner,
            activity_type,
            quantity: evidence.quantity,
            claimed_location,
            claimed_at: now,
            captured_at,
            phases,
            assessment,
            activity: outcome.activity,
            status: outcome.status,
            points_earned: outcome.points_awarded,
            milestones: outcome.milestones,
            streak: outcome.streak,
            rejection: outcome.rejection,
            mint,
            elapsed_ms,
        })
    }

    /// Returns the plant and the capture instant that seeds the gesture signature.
    fn admit(
        &self,
        plant_id: &PlantId,
        evidence: &Evidence,
        now: Timestamp,
    ) -> Result<(PlantRecord, Timestamp), VerificationError> {
        evidence.validate()?;
        let captured_at = evidence.capture_time(now, self.params.max_capture_age_secs)?;
        let (plant, _owner) = self.ledger.active_plant(plant_id)?;
        Ok((plant, captured_at))
    }

    fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.params.stage_timeout_ms)
    }

    /// Runs the capture on a blocking thread. If it overruns the window plus
    /// grace it is cancelled, and whatever it counted so far is used.
    async fn gesture_stage(&self, frames: Option<Vec<Frame>>, captured_at: Timestamp) -> StageReport<GestureOutcome> {
        let Some(frames) = frames else {
            return StageReport::missing();
        };
        let started = Instant::now();
        let cancel = CaptureCancel::new();
        let capture = cancel.clone();
        let verifier = Arc::clone(&self.gesture);
        let classifier = Arc::clone(&self.frame_classifier);
        let mut handle = tokio::task::spawn_blocking(move || {
            let mut source = VecFrameSource::new(frames);
            verifier.verify(&mut source, classifier.as_ref(), captured_at, &capture)
        });

        let grace = Duration::from_millis(self.params.gesture_grace_ms);
        let limit = Duration::from_millis(self.params.gesture_window_ms) + grace;
        let joined = match timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                tracing::warn!(limit_ms = limit.as_millis() as u64, "gesture capture overran, cancelling");
                cancel.cancel();
                match timeout(grace, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        return StageReport {
                            signal: StageSignal::degraded("gesture capture timed out"),
                            detail: None,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                        }
                    }
                }
            }
        };

        let (signal, detail) = match joined {
            Ok(Ok(outcome)) => {
                tracing::debug!(
                    count = outcome.gesture_count,
                    required = outcome.required,
                    passed = outcome.passed,
                    cancelled = outcome.cancelled,
                    "gesture check finished"
                );
                (StageSignal::scored(outcome.confidence * 100.0), Some(outcome))
            }
            Ok(Err(e)) => (StageSignal::degraded(e.to_string()), None),
            Err(e) => (StageSignal::degraded(format!("gesture task failed: {e}")), None),
        };
        StageReport {
            signal,
            detail,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// The checker bounds its own weather call, so the distance check and
    /// any new baseline always come back.
    async fn geo_stage(
        &self,
        plant: &PlantRecord,
        claimed: Option<GeoPoint>,
        observed_daylight: Option<bool>,
        now: Timestamp,
    ) -> StageReport<GeoReport> {
        let Some(point) = claimed else {
            return StageReport::missing();
        };
        let started = Instant::now();
        let report = self
            .geo
            .check(&plant.id, point, plant.location_profile.as_ref(), observed_daylight, now)
            .await;
        tracing::debug!(
            distance_m = report.distance_m,
            within = report.within_threshold,
            flags = report.suspicion_flags.len(),
            "geo check finished"
        );
        StageReport {
            signal: StageSignal::scored(report.score),
            detail: Some(report),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn satellite_stage(&self, claimed: Option<GeoPoint>) -> StageReport<SatelliteObservation> {
        let (Some(point), Some(satellite)) = (claimed, &self.satellite) else {
            return StageReport::missing();
        };
        let started = Instant::now();
        let (signal, detail) = match timeout(self.stage_timeout(), satellite.observe(point)).await {
            Ok(Ok(obs)) => {
                tracing::debug!(score = obs.score, source = ?obs.source, "satellite observation received");
                (StageSignal::scored(obs.score), Some(obs))
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "satellite lookup failed, stage degraded");
                (StageSignal::degraded(e.to_string()), None)
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.params.stage_timeout_ms, "satellite lookup timed out");
                (StageSignal::degraded("satellite lookup timed out"), None)
            }
        };
        StageReport {
            signal,
            detail,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn classifier_stage(
        &self,
        activity_type: ActivityType,
        plant: &PlantRecord,
        media: Option<&[u8]>,
    ) -> StageReport<ClassifierDetail> {
        let Some(media) = media else {
            return StageReport::missing();
        };
        let Some(classifier) = &self.classifier else {
            return StageReport {
                signal: StageSignal::degraded("no classifier configured"),
                detail: None,
                elapsed_ms: 0,
            };
        };
        let started = Instant::now();
        let hint = ClassificationHint::for_activity(activity_type)
            .with_species(plant.species.clone())
            .with_fingerprint(plant.fingerprint.clone());

        let (signal, detail) = match timeout(self.stage_timeout(), classifier.classify(media, &hint)).await {
            Ok(Ok(result)) => {
                let verdict = result.verdict(activity_type.expected_label());
                if verdict.plant_mismatch {
                    tracing::warn!(plant = %plant.id, "classifier reports a different plant");
                }
                (StageSignal::scored(verdict.score), Some(ClassifierDetail { result, verdict }))
            }
            Ok(Err(ClassifierError::Unavailable(reason))) => {
                tracing::warn!(reason = %reason, "classifier unavailable, stage degraded");
                (StageSignal::degraded(reason), None)
            }
            Ok(Err(ClassifierError::Rejected(reason))) => {
                tracing::info!(reason = %reason, "classifier rejected the evidence");
                (StageSignal::vetoed(reason), None)
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.params.stage_timeout_ms, "classifier timed out");
                (StageSignal::degraded("classifier timed out"), None)
            }
        };
        StageReport {
            signal,
            detail,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn decision_detail(&self, score: &ScoreBreakdown) -> Option<String> {
        if let Some(stage) = score.vetoed_by {
            let reason = score
                .contributions
                .iter()
                .find_map(|c| match &c.signal {
                    StageSignal::Vetoed { reason } if c.stage == stage => Some(reason.as_str()),
                    _ => None,
                })
                .unwrap_or("evidence unusable");
            return Some(format!("{stage} stage vetoed the claim: {reason}"));
        }
        match score.decision {
            Decision::Approve => None,
            Decision::ManualReview => Some(format!(
                "aggregate confidence {:.1} requires manual review",
                score.aggregate
            )),
            Decision::Reject => Some(format!(
                "aggregate confidence {:.1} is below the review threshold {:.1}",
                score.aggregate, self.params.review_threshold
            )),
        }
    }

    fn schedule_mint(&self, metadata: MintMetadata) -> Option<MintStatus> {
        let scheduler = self.minting.as_ref()?;
        tracing::debug!(activity = %metadata.activity, co2_kg = metadata.co2_offset_kg, "mint scheduled");
        let activity = metadata.activity;
        let handle = scheduler.spawn(metadata);
        let mut tasks = self.mint_tasks.lock().unwrap_or_else(|p| p.into_inner());
        tasks.retain(|(_, t)| !t.is_finished());
        tasks.push((activity, handle));
        Some(MintStatus::Pending { attempts: 0 })
    }

    /// Restart minting for every mint record still pending in the store,
    /// such as those left behind by a restart. Mints this orchestrator is
    /// already running are skipped. Returns the activities rescheduled.
    pub fn retry_pending_mints(&self) -> Result<Vec<ActivityId>, VerificationError> {
        if self.minting.is_none() {
            return Ok(Vec::new());
        }
        let pending = self.ledger.store().pending_mints().map_err(LedgerError::from)?;
        let in_flight: HashSet<ActivityId> = {
            let mut tasks = self.mint_tasks.lock().unwrap_or_else(|p| p.into_inner());
            tasks.retain(|(_, t)| !t.is_finished());
            tasks.iter().map(|(id, _)| *id).collect()
        };

        let mut resumed = Vec::new();
        for record in pending {
            if in_flight.contains(&record.activity) {
                continue;
            }
            match self.stored_mint_metadata(record.activity)? {
                Some(metadata) => {
                    self.schedule_mint(metadata);
                    resumed.push(record.activity);
                }
                None => tracing::warn!(activity = %record.activity, "stored report unreadable, mint left pending"),
            }
        }
        if !resumed.is_empty() {
            tracing::info!(count = resumed.len(), "pending mints rescheduled");
        }
        Ok(resumed)
    }

    /// Rebuild mint metadata from a stored activity and its plant.
    fn stored_mint_metadata(&self, activity: ActivityId) -> Result<Option<MintMetadata>, VerificationError> {
        let store = self.ledger.store();
        let record = store
            .get_activity(activity)
            .map_err(LedgerError::from)?
            .ok_or(LedgerError::ActivityNotFound(activity))?;
        let plant = store.require_plant(&record.plant).map_err(LedgerError::from)?;
        Ok(Assessment::from_stored(&record.report).map(|assessment| {
            mint_metadata(record.id, &plant, record.activity_type, record.quantity, None, &assessment)
        }))
    }

    /// Wait for every mint started so far and return the final statuses of
    /// those still tracked.
    pub async fn drain_mints(&self) -> Vec<MintStatus> {
        let tasks: Vec<_> = std::mem::take(&mut *self.mint_tasks.lock().unwrap_or_else(|p| p.into_inner()));
        let mut statuses = Vec::with_capacity(tasks.len());
        for (_, task) in tasks {
            match task.await {
                Ok(status) => statuses.push(status),
                Err(e) => tracing::warn!(error = %e, "mint task aborted"),
            }
        }
        statuses
    }

    /// Resolve a pending manual review. An approval is minted like any other.
    pub fn resolve_review(
        &self,
        pending: ActivityId,
        resolution: ReviewResolution,
        note: impl Into<String>,
    ) -> Result<RecordOutcome, VerificationError> {
        let outcome = self.ledger.resolve_review(pending, resolution, note)?;
        if outcome.mint_scheduled {
            match self.stored_mint_metadata(outcome.activity)? {
                Some(metadata) => {
                    self.schedule_mint(metadata);
                }
                None => tracing::warn!(activity = %outcome.activity, "stored report unreadable, mint left pending"),
            }
        }
        Ok(outcome)
    }

    /// Totals, transaction history and activities for a user.
    pub fn get_ledger_state(&self, user: &UserId) -> Result<LedgerState, VerificationError> {
        Ok(self.ledger.ledger_state(user)?)
    }
}

/// Plant updates this attempt carries if accepted.
fn claim_effects(
    geo: &StageReport<GeoReport>,
    classifier: &StageReport<ClassifierDetail>,
    media: Option<&[u8]>,
) -> ActivityEffects {
    let confirmed = classifier
        .detail
        .as_ref()
        .filter(|c| c.verdict.label_matched && !c.verdict.plant_mismatch);
    ActivityEffects {
        location_profile: geo.detail.as_ref().and_then(|g| g.created_profile),
        fingerprint: confirmed.and_then(|c| {
            c.result
                .fingerprint()
                .map(str::to_owned)
                .or_else(|| media.map(image_fingerprint))
        }),
        health_score: confirmed.and_then(|c| c.result.health_score()),
    }
}

fn mint_metadata(
    activity: ActivityId,
    plant: &PlantRecord,
    activity_type: ActivityType,
    quantity: u32,
    claimed_location: Option<GeoPoint>,
    assessment: &Assessment,
) -> MintMetadata {
    MintMetadata {
        activity,
        plant: plant.id.clone(),
        user: plant.owner.clone(),
        activity_type,
        species: plant.species.clone(),
        quantity,
        location: claimed_location.or(plant.location_profile.map(|p| p.point)),
        co2_offset_kg: estimate_offset_kg(&plant.species, quantity),
        aggregate_confidence: assessment.aggregate(),
        gesture_signature: assessment.gesture_signature().map(str::to_owned),
    }
}
