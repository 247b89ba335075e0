//! Flaky minting service.

use async_trait::async_trait;
use sprout_mint::{MintError, MintMetadata, MintReceipt, RecordMinter};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Fails a set number of times, then succeeds (or refuses outright).
#[derive(Debug, Default)]
pub struct NullMinter {
    failures_left: AtomicU32,
    refuse: bool,
    stall: bool,
    calls: AtomicU32,
    minted: Mutex<Vec<MintMetadata>>,
}

impl NullMinter {
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Report the service unreachable `n` times before succeeding.
    pub fn failing_times(n: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(n),
            ..Self::default()
        }
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// Never answers, like a process that dies mid-mint.
    pub fn stalled() -> Self {
        Self {
            stall: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn minted(&self) -> Vec<MintMetadata> {
        self.minted.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RecordMinter for NullMinter {
    async fn mint(&self, metadata: &MintMetadata) -> Result<MintReceipt, MintError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall {
            std::future::pending::<()>().await;
        }
        if self.refuse {
            return Err(MintError::Refused("null minter refuses".into()));
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(MintError::Unreachable("null minter offline".into()));
        }
        if let Ok(mut m) = self.minted.lock() {
            m.push(metadata.clone());
        }
        Ok(MintReceipt {
            record_id: format!("rec-{}", metadata.activity.as_u64()),
            external_reference: format!("null://mint/{}", metadata.activity),
        })
    }
}
