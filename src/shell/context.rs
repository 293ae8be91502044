// Sync context: owns one store, its event bus, its sync queue and the background worker.
//
// Responsibilities
// - init: build queue -> bus -> store around the given gateway and notifier, spawn the worker.
// - dispose: cancel the worker and wait for its final flush.
//
// Testing guidance
// - Every test builds its own context; nothing is shared between instances.
// - init must be called from inside a tokio runtime.

use crate::modules::groups::adapters::outbound::gateway::EntityGateway;
use crate::modules::groups::adapters::outbound::notifier::Notifier;
use crate::modules::groups::infrastructure::event_bus::GroupEventBus;
use crate::modules::groups::use_cases::manage_groups::store::GroupStore;
use crate::modules::groups::use_cases::sync_changes::queue::{SyncPolicy, SyncQueue};
use crate::modules::groups::use_cases::sync_changes::worker::SyncWorker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct SyncContext<TGateway, TNotifier>
where
    TGateway: EntityGateway + 'static,
    TNotifier: Notifier + 'static,
{
    store: Arc<GroupStore<TGateway, TNotifier>>,
    queue: Arc<SyncQueue<TGateway>>,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl<TGateway, TNotifier> SyncContext<TGateway, TNotifier>
where
    TGateway: EntityGateway + 'static,
    TNotifier: Notifier + 'static,
{
    pub fn init(
        gateway: Arc<TGateway>,
        notifier: Arc<TNotifier>,
        policy: SyncPolicy,
        history_capacity: usize,
    ) -> Self {
        let queue = Arc::new(SyncQueue::new(gateway.clone(), policy));
        let bus = Arc::new(GroupEventBus::new(queue.clone(), history_capacity));
        let store = Arc::new(GroupStore::new(gateway, bus, notifier));

        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(SyncWorker::new(queue.clone(), shutdown.clone()).run());

        Self {
            store,
            queue,
            shutdown,
            worker,
        }
    }

    pub fn store(&self) -> &Arc<GroupStore<TGateway, TNotifier>> {
        &self.store
    }

    pub fn queue(&self) -> &Arc<SyncQueue<TGateway>> {
        &self.queue
    }

    /// Stops the worker after its last flush. Returns the number of changes still unsynced.
    pub async fn dispose(self) -> usize {
        self.shutdown.cancel();
        if let Err(error) = self.worker.await {
            tracing::error!(%error, "sync worker did not stop cleanly");
        }
        let pending = self.queue.pending_count();
        if pending > 0 {
            tracing::warn!(pending, "disposing with unsynced changes");
        }
        pending
    }
}
