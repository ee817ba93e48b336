use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use super::payment_service::PaymentService;
use crate::core::SettlementLocks;

/// Background job that fails gateway payments whose customer never came back.
///
/// Runs on a tokio interval; each tick marks gateway payments still pending
/// after `ttl` as failed and drops idle lock entries.
pub struct PendingPaymentSweeper {
    payment_service: Arc<PaymentService>,
    locks: Arc<SettlementLocks>,
    every: Duration,
    ttl: chrono::Duration,
}

impl PendingPaymentSweeper {
    pub fn new(
        payment_service: Arc<PaymentService>,
        locks: Arc<SettlementLocks>,
        every: Duration,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            payment_service,
            locks,
            every,
            ttl,
        }
    }

    /// Spawn with `tokio::spawn(sweeper.start())`
    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.every.as_secs(),
            ttl_minutes = self.ttl.num_minutes(),
            "Starting pending payment sweeper"
        );

        let mut ticker = interval(self.every);

        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// One pass; returns how many payments were expired
    pub async fn sweep(&self) -> usize {
        let expired = match self.payment_service.expire_stale(self.ttl).await {
            Ok(count) => {
                if count > 0 {
                    info!(expired_count = count, "Stale gateway payments expired");
                }
                count
            }
            Err(e) => {
                error!(error = %e, "Error expiring stale gateway payments");
                0
            }
        };

        let pruned = self.locks.prune();
        if pruned > 0 {
            tracing::debug!(pruned = pruned, "Pruned idle settlement locks");
        }

        expired
    }
}
