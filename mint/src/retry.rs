//! Background minting with bounded exponential backoff.

use crate::metadata::MintMetadata;
use crate::minter::RecordMinter;
use sprout_store::{LedgerBatch, LedgerStore, MintRecord, StoreError};
use sprout_types::{ActivityId, Clock, MintStatus, VerificationParams};
use sprout_utils::tracing_spans::mint_attempt_span;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Delay after the `attempt`-th failure (1-based): base, 2×base, 4×base, …
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }
}

impl From<&VerificationParams> for RetryPolicy {
    fn from(p: &VerificationParams) -> Self {
        Self {
            max_attempts: p.mint_max_attempts.max(1),
            base_backoff: Duration::from_millis(p.mint_base_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&VerificationParams::default())
    }
}

/// Runs mint calls off the submission path and records their progress.
pub struct MintScheduler<S: LedgerStore> {
    store: Arc<S>,
    minter: Arc<dyn RecordMinter>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl<S: LedgerStore> Clone for MintScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            minter: Arc::clone(&self.minter),
            clock: Arc::clone(&self.clock),
            policy: self.policy,
        }
    }
}

impl<S: LedgerStore + 'static> MintScheduler<S> {
    pub fn new(store: Arc<S>, minter: Arc<dyn RecordMinter>, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            store,
            minter,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Start minting in the background. The handle yields the final status.
    pub fn spawn(&self, metadata: MintMetadata) -> JoinHandle<MintStatus> {
        let this = self.clone();
        tokio::spawn(async move { this.run(metadata).await })
    }

    /// Mint with retries and return the terminal status.
    ///
    /// Each failure is written back as `Pending { attempts }` before sleeping.
    /// A refusal, or running out of attempts, ends in `Failed`.
    pub async fn run(&self, metadata: MintMetadata) -> MintStatus {
        let activity = metadata.activity;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let span = mint_attempt_span(&activity.to_string(), attempt);
            let result = self.minter.mint(&metadata).instrument(span).await;

            match result {
                Ok(receipt) => {
                    tracing::info!(activity = %activity, record_id = %receipt.record_id, attempt, "activity minted");
                    let status = MintStatus::Minted {
                        record_id: receipt.record_id,
                        external_reference: receipt.external_reference,
                    };
                    self.write_status(activity, &status);
                    return status;
                }
                Err(e) if !e.is_retryable() || attempt >= self.policy.max_attempts => {
                    tracing::warn!(activity = %activity, attempt, error = %e, "minting failed permanently");
                    let status = MintStatus::Failed {
                        attempts: attempt,
                        reason: e.to_string(),
                    };
                    self.write_status(activity, &status);
                    return status;
                }
                Err(e) => {
                    let delay = self.policy.backoff(attempt);
                    tracing::debug!(activity = %activity, attempt, error = %e, delay_ms = delay.as_millis() as u64, "mint attempt failed, retrying");
                    self.write_status(activity, &MintStatus::Pending { attempts: attempt });
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn write_status(&self, activity: ActivityId, status: &MintStatus) {
        if let Err(e) = self.try_write_status(activity, status) {
            tracing::warn!(activity = %activity, error = %e, "failed to persist mint status");
        }
    }

    fn try_write_status(&self, activity: ActivityId, status: &MintStatus) -> Result<(), StoreError> {
        let mut batch = self.store.begin_batch()?;
        batch.put_mint(&MintRecord {
            activity,
            status: status.clone(),
            updated_at: self.clock.now(),
        })?;
        batch.commit()
    }
}
