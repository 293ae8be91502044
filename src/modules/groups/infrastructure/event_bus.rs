// Event bus for group changes.
//
// Purpose
// - Decouple "a group mutation happened" from "it must reach the backend".
//
// Responsibilities
// - emit: build the change event, append it to the bounded history and the pending queue,
//   notify kind listeners then catch-all listeners, then make the immediate sync attempt.
// - Listener failures are logged and never reach other listeners or the emitter.
// - The immediate attempt is awaited, but its failure only stays recorded on the event.

use crate::modules::groups::adapters::outbound::gateway::EntityGateway;
use crate::modules::groups::core::events::{
    ChangeEvent, ChangeKind, ChangeMetadata, SharedChangeEvent,
};
use crate::modules::groups::core::group::Group;
use crate::modules::groups::use_cases::sync_changes::queue::SyncQueue;
use crate::shared::infrastructure::event_bus::history::BoundedHistory;
use crate::shared::infrastructure::event_bus::{ListenerRegistry, Subscription};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

pub struct GroupEventBus<TGateway>
where
    TGateway: EntityGateway + 'static,
{
    listeners: ListenerRegistry<ChangeKind, ChangeEvent>,
    history: Mutex<BoundedHistory<SharedChangeEvent>>,
    queue: Arc<SyncQueue<TGateway>>,
}

impl<TGateway> GroupEventBus<TGateway>
where
    TGateway: EntityGateway + 'static,
{
    pub fn new(queue: Arc<SyncQueue<TGateway>>, history_capacity: usize) -> Self {
        Self {
            listeners: ListenerRegistry::new(),
            history: Mutex::new(BoundedHistory::new(history_capacity)),
            queue,
        }
    }

    pub fn queue(&self) -> &Arc<SyncQueue<TGateway>> {
        &self.queue
    }

    pub fn subscribe<F>(&self, kind: ChangeKind, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.subscribe(kind, listener)
    }

    pub fn subscribe_all<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.listeners.subscribe_all(listener)
    }

    pub fn history(&self) -> Vec<SharedChangeEvent> {
        self.history_guard().to_vec()
    }

    pub async fn emit(
        &self,
        kind: ChangeKind,
        group: Group,
        metadata: Option<ChangeMetadata>,
    ) -> SharedChangeEvent {
        let event = Arc::new(ChangeEvent::new(kind, group, metadata));
        tracing::debug!(event_id = %event.id, %kind, group_id = event.group_id(), "emitting change");

        self.history_guard().push(event.clone());
        self.queue.enqueue(event.clone());
        self.listeners.notify(kind, &event);
        self.queue.sync_now(&event).await;
        event
    }

    fn history_guard(&self) -> MutexGuard<'_, BoundedHistory<SharedChangeEvent>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod group_event_bus_tests {
    use super::*;
    use crate::modules::groups::adapters::outbound::gateway_in_memory::InMemoryEntityGateway;
    use crate::modules::groups::use_cases::sync_changes::queue::SyncPolicy;
    use crate::tests::fixtures::{group_fixture, scenario_directory};
    use rstest::{fixture, rstest};

    type BeforeEachReturn = (Arc<InMemoryEntityGateway>, GroupEventBus<InMemoryEntityGateway>);

    #[fixture]
    fn before_each() -> BeforeEachReturn {
        let gateway = Arc::new(InMemoryEntityGateway::with_directory(scenario_directory()));
        let queue = Arc::new(SyncQueue::new(gateway.clone(), SyncPolicy::default()));
        (gateway, GroupEventBus::new(queue, 3))
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_notify_listeners_before_the_sync_attempt(before_each: BeforeEachReturn) {
        let (_, bus) = before_each;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let kinds = seen.clone();
        bus.subscribe(ChangeKind::Create, move |event| {
            kinds.lock().unwrap().push((event.kind, event.is_synced()));
            Ok(())
        });
        let all = seen.clone();
        bus.subscribe_all(move |event| {
            all.lock().unwrap().push((event.kind, event.is_synced()));
            Ok(())
        });

        let event = bus.emit(ChangeKind::Create, group_fixture(), None).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(ChangeKind::Create, false), (ChangeKind::Create, false)]
        );
        assert!(event.is_synced());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_not_let_a_failing_listener_stop_the_emission(before_each: BeforeEachReturn) {
        let (_, bus) = before_each;
        bus.subscribe_all(|_| Err(anyhow::anyhow!("listener broke")));

        let event = bus.emit(ChangeKind::Create, group_fixture(), None).await;

        assert!(event.is_synced());
        assert_eq!(bus.history().len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_keep_a_failed_event_pending_and_in_history(before_each: BeforeEachReturn) {
        let (gateway, bus) = before_each;
        gateway.set_offline(true);

        let event = bus.emit(ChangeKind::Update, group_fixture(), None).await;

        assert!(!event.is_synced());
        assert_eq!(bus.queue().pending_count(), 1);
        assert!(Arc::ptr_eq(&bus.history()[0], &event));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_bound_the_history_and_keep_the_latest_events(before_each: BeforeEachReturn) {
        let (_, bus) = before_each;
        let mut emitted = Vec::new();
        for _ in 0..5 {
            emitted.push(bus.emit(ChangeKind::Create, group_fixture(), None).await);
        }

        let history = bus.history();
        assert_eq!(history.len(), 3);
        assert!(Arc::ptr_eq(&history[0], &emitted[2]));
        assert!(Arc::ptr_eq(&history[2], &emitted[4]));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_stop_notifying_after_unsubscribe(before_each: BeforeEachReturn) {
        let (_, bus) = before_each;
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let subscription = bus.subscribe(ChangeKind::Delete, move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        bus.emit(ChangeKind::Delete, group_fixture(), None).await;
        subscription.unsubscribe();
        bus.emit(ChangeKind::Delete, group_fixture(), None).await;

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
