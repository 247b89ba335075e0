//! The engine service: the orchestrator plus configuration, metrics and events.

use std::sync::Arc;
use std::time::Duration;

use sprout_classifier::HttpClassifier;
use sprout_geo::{HttpSatelliteClient, OpenWeatherClient};
use sprout_gesture::FrameClassifier;
use sprout_ledger::{LedgerState, RecordOutcome, ReviewResolution};
use sprout_mint::HttpMinter;
use sprout_store::{LedgerStore, PlantRecord, UserRecord};
use sprout_types::{
    ActivityId, ActivityStatus, ActivityType, Clock, GeoPoint, MintStatus, PlantId, UserId,
};
use sprout_verification::{Evidence, Orchestrator, Submission, VerificationReport};

use crate::config::EngineConfig;
use crate::error::NodeError;
use crate::event::{EngineEvent, EventBus};
use crate::metrics::EngineMetrics;

/// A running Sprout engine.
pub struct SproutNode<S: LedgerStore + 'static> {
    pub config: EngineConfig,
    orchestrator: Orchestrator<S>,
    metrics: Option<EngineMetrics>,
    events: EventBus,
}

impl<S: LedgerStore + 'static> SproutNode<S> {
    /// Assemble the engine, wiring the HTTP adapters named in `config`.
    pub fn new(
        config: EngineConfig,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        frame_classifier: Arc<dyn FrameClassifier>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let timeout = Duration::from_millis(config.http_timeout_ms);
        let mut orchestrator = Orchestrator::new(
            store,
            clock,
            config.verification.clone(),
            config.rewards.clone(),
            frame_classifier,
        );

        match &config.classifier_url {
            Some(url) => {
                tracing::info!(url = %url, "using HTTP evidence classifier");
                orchestrator = orchestrator.with_classifier(Arc::new(HttpClassifier::with_timeout(url.clone(), timeout)));
            }
            None => tracing::warn!("no classifier configured, content checks will run degraded"),
        }
        if let (Some(url), Some(key)) = (&config.weather_url, &config.weather_api_key) {
            tracing::info!(url = %url, "using weather lookup");
            orchestrator = orchestrator.with_weather(Arc::new(OpenWeatherClient::with_timeout(
                url.clone(),
                key.clone(),
                timeout,
            )));
        }
        if let Some(url) = &config.satellite_url {
            tracing::info!(url = %url, "using satellite vegetation lookup");
            orchestrator = orchestrator.with_satellite(Arc::new(HttpSatelliteClient::with_timeout(url.clone(), timeout)));
        }
        if let Some(url) = &config.mint_url {
            tracing::info!(url = %url, "minting approvals");
            orchestrator = orchestrator.with_minter(Arc::new(HttpMinter::with_timeout(url.clone(), timeout)));
        }

        Self::with_orchestrator(config, orchestrator)
    }

    /// Wrap an orchestrator assembled by the caller.
    pub fn with_orchestrator(config: EngineConfig, orchestrator: Orchestrator<S>) -> Result<Self, NodeError> {
        let metrics = if config.enable_metrics {
            Some(EngineMetrics::new()?)
        } else {
            None
        };
        Ok(Self {
            config,
            orchestrator,
            metrics,
            events: EventBus::new(),
        })
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&EngineEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn orchestrator(&self) -> &Orchestrator<S> {
        &self.orchestrator
    }

    pub fn metrics(&self) -> Option<&EngineMetrics> {
        self.metrics.as_ref()
    }

    pub fn register_user(&self, id: &str, display_name: Option<String>) -> Result<UserRecord, NodeError> {
        let id = UserId::parse(id)?;
        Ok(self.orchestrator.ledger().register_user(id, display_name)?)
    }

    /// Register a plant. `location` accepts the same formats as a claimed location.
    pub fn register_plant(
        &self,
        owner: &str,
        id: &str,
        species: &str,
        location: Option<&str>,
    ) -> Result<PlantRecord, NodeError> {
        let owner = UserId::parse(owner)?;
        let id = PlantId::parse(id)?;
        let location = location.map(GeoPoint::parse).transpose()?;
        Ok(self
            .orchestrator
            .ledger()
            .register_plant(&owner, id, species, location)?)
    }

    pub async fn submit_activity(
        &self,
        plant: &PlantId,
        activity_type: ActivityType,
        evidence: Evidence,
        claimed_location: Option<GeoPoint>,
    ) -> Result<VerificationReport, NodeError> {
        match self
            .orchestrator
            .submit_activity(plant, activity_type, evidence, claimed_location)
            .await
        {
            Ok(report) => {
                if let Some(m) = &self.metrics {
                    m.observe_report(&report);
                }
                self.publish(&report);
                Ok(report)
            }
            Err(e) => {
                if let (true, Some(m)) = (e.is_input(), &self.metrics) {
                    m.input_errors.inc();
                }
                Err(e.into())
            }
        }
    }

    /// Parse and submit a wire-format submission.
    pub async fn submit(&self, submission: Submission) -> Result<VerificationReport, NodeError> {
        let parsed = submission.plant().and_then(|p| Ok((p, submission.location()?)));
        let (plant, location) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                if let Some(m) = &self.metrics {
                    m.input_errors.inc();
                }
                return Err(e.into());
            }
        };
        self.submit_activity(&plant, submission.activity_type, submission.evidence, location)
            .await
    }

    pub fn resolve_review(
        &self,
        pending: ActivityId,
        resolution: ReviewResolution,
        note: &str,
    ) -> Result<RecordOutcome, NodeError> {
        let outcome = self.orchestrator.resolve_review(pending, resolution, note)?;
        if let Some(record) = self.orchestrator.ledger().store().get_activity(outcome.activity)? {
            self.events.emit(&EngineEvent::ActivityRecorded {
                activity: record.id,
                plant: record.plant.clone(),
                user: record.user.clone(),
                status: record.status,
                points: record.points_earned,
            });
            for m in &outcome.milestones {
                self.events.emit(&EngineEvent::MilestoneReached {
                    plant: record.plant.clone(),
                    user: record.user.clone(),
                    days: m.days,
                    bonus: m.bonus,
                });
            }
            if outcome.mint_scheduled {
                self.events.emit(&EngineEvent::MintScheduled { activity: record.id });
            }
        }
        if let Some(m) = &self.metrics {
            if outcome.status == ActivityStatus::Approved && outcome.points_awarded > 0 {
                m.points_awarded.inc_by(outcome.points_awarded as u64);
            }
            m.milestone_bonuses.inc_by(outcome.milestones.len() as u64);
        }
        Ok(outcome)
    }

    pub fn get_ledger_state(&self, user: &UserId) -> Result<LedgerState, NodeError> {
        Ok(self.orchestrator.get_ledger_state(user)?)
    }

    /// Reschedule mints left pending in the store, e.g. by a previous run.
    pub fn retry_pending_mints(&self) -> Result<Vec<ActivityId>, NodeError> {
        let resumed = self.orchestrator.retry_pending_mints()?;
        for activity in &resumed {
            self.events.emit(&EngineEvent::MintScheduled { activity: *activity });
        }
        Ok(resumed)
    }

    /// Wait for background mints, account for them, and return their statuses.
    pub async fn finish_mints(&self) -> Vec<MintStatus> {
        let statuses = self.orchestrator.drain_mints().await;
        for status in &statuses {
            if let Some(m) = &self.metrics {
                m.observe_mint(status);
            }
            self.events.emit(&EngineEvent::MintFinished { status: status.clone() });
        }
        statuses
    }

    fn publish(&self, report: &VerificationReport) {
        self.events.emit(&EngineEvent::ActivityRecorded {
            activity: report.activity,
            plant: report.plant.clone(),
            user: report.user.clone(),
            status: report.status,
            points: report.points_earned,
        });
        for m in &report.milestones {
            self.events.emit(&EngineEvent::MilestoneReached {
                plant: report.plant.clone(),
                user: report.user.clone(),
                days: m.days,
                bonus: m.bonus,
            });
        }
        if report.status == ActivityStatus::PendingReview {
            self.events.emit(&EngineEvent::ReviewQueued {
                activity: report.activity,
                plant: report.plant.clone(),
            });
        }
        if report.mint.is_some() {
            self.events.emit(&EngineEvent::MintScheduled {
                activity: report.activity,
            });
        }
    }
}
