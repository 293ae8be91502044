// Background sync worker.
//
// Purpose
// - Sweep the sync queue on a fixed interval.
//
// Responsibilities
// - Stop when the cancellation token fires, flushing whatever is still pending once more.

use crate::modules::groups::adapters::outbound::gateway::EntityGateway;
use crate::modules::groups::use_cases::sync_changes::queue::SyncQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub struct SyncWorker<TGateway>
where
    TGateway: EntityGateway + 'static,
{
    queue: Arc<SyncQueue<TGateway>>,
    shutdown: CancellationToken,
}

impl<TGateway> SyncWorker<TGateway>
where
    TGateway: EntityGateway + 'static,
{
    pub fn new(queue: Arc<SyncQueue<TGateway>>, shutdown: CancellationToken) -> Self {
        Self { queue, shutdown }
    }

    pub async fn run(self) {
        let period = self.queue.policy().interval.max(Duration::from_millis(1));
        tracing::info!(interval = ?period, "sync worker started");

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // first tick completes immediately

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    if self.queue.pending_count() > 0 {
                        let report = self.queue.force_sync_all().await;
                        tracing::info!(?report, "final flush before shutdown");
                    }
                    break;
                }

                _ = ticker.tick() => {
                    if self.queue.pending_count() == 0 {
                        continue;
                    }
                    let report = self.queue.sweep().await;
                    if report.failed > 0 || report.abandoned > 0 {
                        tracing::warn!(?report, "sync sweep left changes unsynced");
                    } else {
                        tracing::debug!(?report, "sync sweep finished");
                    }
                }
            }
        }

        tracing::info!(pending = self.queue.pending_count(), "sync worker stopped");
    }
}
