// Sync queue: pending change events and their delivery to the entity gateway.
//
// Purpose
// - Every change event is eventually applied to the backend, without blocking the caller
//   and tolerating transient failures.
//
// Responsibilities
// - Immediate attempt right after an event is queued (`sync_now`), never retried in place.
// - Sweeps retry every pending event serially, in FIFO order, one write in flight at a time.
//   A sweep started while another is running does nothing and reports `skipped`.
// - Success marks the event synced, clears its error and drops it from the queue.
// - Failure records the error on the event and leaves it queued. With `max_attempts` set, an
//   event that used up its attempts is abandoned and dropped from the queue.
// - A queued delete supersedes earlier pending events for the same group.
//
// Notes
// - A failure of an earlier event does not hold back later events for the same group, so a later
//   change can reach the backend before an earlier one finally does.

use crate::modules::groups::adapters::outbound::gateway::{EntityGateway, GatewayError};
use crate::modules::groups::core::events::{ChangeEvent, ChangeKind, SharedChangeEvent};
use crate::modules::groups::core::patch::TeamPayload;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    pub interval: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    pub abandoned: usize,
    /// Changes a delete superseded while their attempt was in flight.
    pub superseded: usize,
    pub skipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Synced,
    Failed,
    Abandoned,
    Superseded,
}

struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SyncQueue<TGateway>
where
    TGateway: EntityGateway + 'static,
{
    gateway: Arc<TGateway>,
    policy: SyncPolicy,
    pending: Mutex<VecDeque<SharedChangeEvent>>,
    syncing: AtomicBool,
}

impl<TGateway> SyncQueue<TGateway>
where
    TGateway: EntityGateway + 'static,
{
    pub fn new(gateway: Arc<TGateway>, policy: SyncPolicy) -> Self {
        Self {
            gateway,
            policy,
            pending: Mutex::new(VecDeque::new()),
            syncing: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> &SyncPolicy {
        &self.policy
    }

    pub fn enqueue(&self, event: SharedChangeEvent) {
        let mut pending = self.pending();
        if event.kind == ChangeKind::Delete {
            pending.retain(|queued| {
                if queued.group_id() != event.group_id() {
                    return true;
                }
                queued.mark_superseded();
                tracing::debug!(
                    event_id = %queued.id,
                    kind = %queued.kind,
                    group_id = queued.group_id(),
                    "pending change superseded by delete"
                );
                false
            });
        }
        pending.push_back(event);
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    pub fn pending_events(&self) -> Vec<SharedChangeEvent> {
        self.pending().iter().cloned().collect()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::SeqCst)
    }

    /// Single delivery attempt. Returns true when the event is synced afterwards.
    pub async fn sync_now(&self, event: &SharedChangeEvent) -> bool {
        if !event.is_pending() {
            return event.is_synced();
        }
        self.attempt(event).await == Outcome::Synced
    }

    pub async fn sweep(&self) -> SweepReport {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("sync sweep already running, skipping");
            return SweepReport {
                skipped: true,
                ..SweepReport::default()
            };
        }
        let _guard = SweepGuard(&self.syncing);

        let mut report = SweepReport::default();
        for event in self.pending_events() {
            if !event.is_pending() {
                continue;
            }
            report.attempted += 1;
            match self.attempt(&event).await {
                Outcome::Synced => report.synced += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Abandoned => report.abandoned += 1,
                Outcome::Superseded => report.superseded += 1,
            }
        }
        report
    }

    /// Same as a timer sweep, on demand.
    pub async fn force_sync_all(&self) -> SweepReport {
        tracing::info!(pending = self.pending_count(), "forcing sync of pending changes");
        self.sweep().await
    }

    async fn attempt(&self, event: &SharedChangeEvent) -> Outcome {
        let attempt = event.begin_attempt();
        let result = self.deliver(event).await;
        let transitioned = match &result {
            Ok(()) => event.mark_synced(),
            Err(error) => event.mark_failed(error.to_string()),
        };
        if !transitioned {
            tracing::debug!(
                event_id = %event.id,
                kind = %event.kind,
                group_id = event.group_id(),
                attempt,
                status = ?event.status(),
                "change left the queue while its attempt was in flight"
            );
            return Outcome::Superseded;
        }

        match result {
            Ok(()) => {
                self.remove(event);
                tracing::debug!(
                    event_id = %event.id,
                    kind = %event.kind,
                    group_id = event.group_id(),
                    attempt,
                    "change synced"
                );
                Outcome::Synced
            }
            Err(error) => {
                if self.policy.max_attempts.is_some_and(|max| attempt >= max) {
                    if !event.mark_abandoned() {
                        return Outcome::Superseded;
                    }
                    self.remove(event);
                    tracing::error!(
                        event_id = %event.id,
                        kind = %event.kind,
                        group_id = event.group_id(),
                        attempt,
                        %error,
                        "change abandoned after exhausting retries"
                    );
                    Outcome::Abandoned
                } else {
                    tracing::warn!(
                        event_id = %event.id,
                        kind = %event.kind,
                        group_id = event.group_id(),
                        attempt,
                        %error,
                        "change sync failed, will retry"
                    );
                    Outcome::Failed
                }
            }
        }
    }

    async fn deliver(&self, event: &ChangeEvent) -> Result<(), GatewayError> {
        match event.kind {
            ChangeKind::Create => Ok(()),
            ChangeKind::Update | ChangeKind::AddSeller | ChangeKind::RemoveSeller => {
                let payload = TeamPayload::from(&event.group.raw);
                self.gateway
                    .update_team(event.group_id(), &payload)
                    .await
                    .map(|_| ())
            }
            ChangeKind::Delete => match self.gateway.delete_team(event.group_id()).await {
                Ok(()) | Err(GatewayError::NotFound(_)) => Ok(()),
                Err(error) => Err(error),
            },
        }
    }

    fn remove(&self, event: &SharedChangeEvent) {
        self.pending().retain(|queued| !Arc::ptr_eq(queued, event));
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<SharedChangeEvent>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
