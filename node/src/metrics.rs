//! Prometheus metrics for the Sprout engine.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`]; callers encode it into the
//! Prometheus text exposition format with [`EngineMetrics::encode`].

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};
use sprout_types::{ActivityStatus, MintStatus};
use sprout_verification::VerificationReport;

use crate::NodeError;

pub struct EngineMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Submissions that passed input validation.
    pub submissions: IntCounter,
    /// Submissions refused with an input error.
    pub input_errors: IntCounter,
    /// Scorer decisions, labelled `approve` / `manual_review` / `reject`.
    pub decisions: IntCounterVec,
    /// Stages that ran degraded, labelled by stage.
    pub degraded_stages: IntCounterVec,
    pub duplicate_rejections: IntCounter,
    pub points_awarded: IntCounter,
    pub milestone_bonuses: IntCounter,
    pub mints_completed: IntCounter,
    pub mint_failures: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// End-to-end verification latency in milliseconds.
    pub verification_latency_ms: Histogram,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let submissions = register_int_counter_with_registry!(
            Opts::new("sprout_submissions_total", "Submissions evaluated by the engine"),
            registry
        )?;
        let input_errors = register_int_counter_with_registry!(
            Opts::new("sprout_input_errors_total", "Submissions refused before evaluation"),
            registry
        )?;
        let decisions = register_int_counter_vec_with_registry!(
            Opts::new("sprout_decisions_total", "Scorer decisions by outcome"),
            &["decision"],
            registry
        )?;
        let degraded_stages = register_int_counter_vec_with_registry!(
            Opts::new("sprout_degraded_stages_total", "Verification stages that ran degraded"),
            &["stage"],
            registry
        )?;
        let duplicate_rejections = register_int_counter_with_registry!(
            Opts::new("sprout_duplicate_rejections_total", "Attempts rejected as same-day duplicates"),
            registry
        )?;
        let points_awarded = register_int_counter_with_registry!(
            Opts::new("sprout_points_awarded_total", "Points written to the ledger"),
            registry
        )?;
        let milestone_bonuses = register_int_counter_with_registry!(
            Opts::new("sprout_milestone_bonuses_total", "Streak milestone bonuses paid"),
            registry
        )?;
        let mints_completed = register_int_counter_with_registry!(
            Opts::new("sprout_mints_completed_total", "Approved activities minted"),
            registry
        )?;
        let mint_failures = register_int_counter_with_registry!(
            Opts::new("sprout_mint_failures_total", "Mints that exhausted their retries"),
            registry
        )?;

        // 1 ms → ~32 s
        let verification_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "sprout_verification_latency_ms",
                "End-to-end verification latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 16)?),
            registry
        )?;

        Ok(Self {
            registry,
            submissions,
            input_errors,
            decisions,
            degraded_stages,
            duplicate_rejections,
            points_awarded,
            milestone_bonuses,
            mints_completed,
            mint_failures,
            verification_latency_ms,
        })
    }

    /// Account for one evaluated submission.
    pub fn observe_report(&self, report: &VerificationReport) {
        self.submissions.inc();
        self.decisions
            .with_label_values(&[report.decision().as_str()])
            .inc();
        for stage in report.assessment.score.degraded_stages() {
            self.degraded_stages.with_label_values(&[stage.as_str()]).inc();
        }
        if report.is_duplicate() {
            self.duplicate_rejections.inc();
        }
        if report.status == ActivityStatus::Approved && report.points_earned > 0 {
            self.points_awarded.inc_by(report.points_earned as u64);
        }
        self.milestone_bonuses.inc_by(report.milestones.len() as u64);
        self.verification_latency_ms.observe(report.elapsed_ms as f64);
    }

    pub fn observe_mint(&self, status: &MintStatus) {
        match status {
            MintStatus::Minted { .. } => self.mints_completed.inc(),
            MintStatus::Failed { .. } => self.mint_failures.inc(),
            MintStatus::Pending { .. } => {}
        }
    }

    /// Prometheus text exposition of every metric.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()).into())
    }
}
