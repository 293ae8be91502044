use crate::modules::groups::adapters::outbound::gateway_in_memory::{
    GatewayCall, InMemoryEntityGateway,
};
use crate::modules::groups::adapters::outbound::notifier::{InMemoryNotifier, NotificationLevel};
use crate::modules::groups::core::events::{ChangeKind, SyncStatus};
use crate::modules::groups::core::patch::{GroupPatch, NewGroup};
use crate::modules::groups::use_cases::sync_changes::queue::SyncPolicy;
use crate::shell::context::SyncContext;
use crate::tests::fixtures::scenario_directory;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Context = SyncContext<InMemoryEntityGateway, InMemoryNotifier>;

fn context(
    gateway: Arc<InMemoryEntityGateway>,
    notifier: Arc<InMemoryNotifier>,
    max_attempts: Option<u32>,
) -> Context {
    SyncContext::init(
        gateway,
        notifier,
        SyncPolicy {
            interval: Duration::from_secs(5),
            max_attempts,
        },
        100,
    )
}

#[tokio::test]
async fn manages_groups_end_to_end() {
    let gateway = Arc::new(InMemoryEntityGateway::with_directory(scenario_directory()));
    let notifier = Arc::new(InMemoryNotifier::new());
    let context = context(gateway.clone(), notifier.clone(), None);
    let store = context.store();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    store.bus().subscribe_all(move |event| {
        recorder.lock().unwrap().push(event.kind);
        Ok(())
    });

    store.fetch_all().await.unwrap();
    let created = store
        .create(
            NewGroup::named("Equipe Norte")
                .monthly_quota(1000.0)
                .leader("u-1"),
        )
        .await
        .unwrap();
    store.add_member(&created.id, "s-3").await.unwrap();
    store.remove_member("team-a", "s-1").await.unwrap();
    store
        .update("team-a", GroupPatch::default().monthly_quota(12_000.0))
        .await
        .unwrap();
    store.select(Some("team-b".into()));
    store.delete("team-b").await.unwrap();

    let state = store.snapshot();
    assert_eq!(state.groups.len(), 2);
    assert_eq!(state.selected, None);

    let norte = state.group(&created.id).unwrap();
    assert_eq!(norte.leader.as_deref(), Some("Marta Manager"));
    assert_eq!(norte.member_count, 1);
    assert_eq!(norte.sold_this_month, 500.0);

    let team_a = state.group("team-a").unwrap();
    assert_eq!(team_a.member_count, 1);
    assert_eq!(team_a.monthly_quota, 12_000.0);
    assert_eq!(team_a.raw.sellers, vec!["s-2"]);
    assert_eq!(
        state.available_sellers.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(),
        vec!["s-1"]
    );

    let backend_team_a = gateway.team("team-a").await.unwrap();
    assert_eq!(backend_team_a.sellers, vec!["s-2"]);
    assert_eq!(backend_team_a.monthly_quota, 12_000.0);
    assert!(gateway.team("team-b").await.is_none());

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ChangeKind::Create,
            ChangeKind::AddSeller,
            ChangeKind::RemoveSeller,
            ChangeKind::Update,
            ChangeKind::Delete,
        ]
    );
    assert!(store.history().iter().all(|event| event.is_synced()));
    assert_eq!(store.pending_sync_count(), 0);
    assert!(
        notifier
            .notifications()
            .iter()
            .all(|n| n.level == NotificationLevel::Success)
    );

    assert_eq!(context.dispose().await, 0);
}

#[tokio::test(start_paused = true)]
async fn delivers_a_change_once_the_backend_comes_back() {
    let gateway = Arc::new(InMemoryEntityGateway::with_directory(scenario_directory()));
    let context = context(gateway.clone(), Arc::new(InMemoryNotifier::new()), None);
    let store = context.store();
    store.fetch_all().await.unwrap();

    let mut group = store.group("team-a").unwrap();
    group.remove_member_locally("s-2");
    gateway.set_offline(true);
    let event = store.bus().emit(ChangeKind::RemoveSeller, group, None).await;

    assert_eq!(store.pending_sync_count(), 1);
    assert_eq!(
        event.sync_error().as_deref(),
        Some("backend unavailable: Entity gateway offline")
    );

    tokio::time::sleep(Duration::from_millis(5_100)).await;
    assert_eq!(event.attempts(), 2);
    assert_eq!(store.pending_sync_count(), 1);

    gateway.set_offline(false);
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(event.is_synced());
    assert_eq!(event.sync_error(), None);
    assert_eq!(store.pending_sync_count(), 0);
    assert_eq!(gateway.team("team-a").await.unwrap().sellers, vec!["s-1"]);
    let puts = gateway.count_calls(|call| matches!(call, GatewayCall::UpdateTeam { .. }));
    assert_eq!(puts, 3);

    assert_eq!(context.dispose().await, 0);
}

#[tokio::test(start_paused = true)]
async fn abandons_a_change_after_the_configured_attempts() {
    let gateway = Arc::new(InMemoryEntityGateway::with_directory(scenario_directory()));
    let context = context(gateway.clone(), Arc::new(InMemoryNotifier::new()), Some(2));
    let store = context.store();
    store.fetch_all().await.unwrap();

    gateway.set_offline(true);
    let group = store.group("team-b").unwrap();
    let event = store.bus().emit(ChangeKind::Update, group, None).await;
    assert_eq!(event.status(), SyncStatus::Pending);

    tokio::time::sleep(Duration::from_millis(5_100)).await;

    assert_eq!(event.status(), SyncStatus::Abandoned);
    assert_eq!(event.attempts(), 2);
    assert!(event.sync_error().is_some());
    assert_eq!(store.pending_sync_count(), 0);
    assert_eq!(store.history().len(), 1);

    assert_eq!(context.dispose().await, 0);
}
