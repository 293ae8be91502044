// Group aggregate store.
//
// Purpose
// - Own the in-process snapshot of every group and route each mutation through the same
//   protocol: gateway call, local update, change event, optional reconciling fetch.
//
// Responsibilities
// - fetch_all: read teams, users and sellers together, project them and replace the snapshot.
//   A failed fetch records the error string and keeps the groups already loaded.
// - create / update / add_member / remove_member / delete: call the gateway, apply the result
//   locally, emit the matching change event, notify the user.
// - Mutation failures are notified and returned. Local state is only touched after the gateway
//   accepted the write, so a rejected write leaves the snapshot as it was.
//
// Boundaries
// - Never talks to the sync queue directly; events go through the bus.
// - Holds no lock across an await.

use crate::modules::groups::adapters::outbound::gateway::{EntityGateway, GatewayError};
use crate::modules::groups::adapters::outbound::notifier::{Notification, Notifier};
use crate::modules::groups::core::directory::{Directory, SellerRecord, TeamRecord, UserRecord};
use crate::modules::groups::core::events::{ChangeKind, ChangeMetadata, SharedChangeEvent};
use crate::modules::groups::core::group::Group;
use crate::modules::groups::core::patch::{
    GroupPatch, NewGroup, PatchError, TeamPayload, create_payload, merge_patch, sellers_with,
    sellers_without, with_sellers,
};
use crate::modules::groups::core::projection::{member_from, project};
use crate::modules::groups::infrastructure::event_bus::GroupEventBus;
use crate::modules::groups::use_cases::manage_groups::state::GroupsState;
use crate::modules::groups::use_cases::sync_changes::queue::SweepReport;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("invalid input: {0}")]
    Invalid(#[from] PatchError),
}

/// Users and sellers from the last successful fetch.
#[derive(Debug, Default)]
struct Lookups {
    users: Vec<UserRecord>,
    sellers: Vec<SellerRecord>,
}

pub struct GroupStore<TGateway, TNotifier>
where
    TGateway: EntityGateway + 'static,
    TNotifier: Notifier + 'static,
{
    gateway: Arc<TGateway>,
    bus: Arc<GroupEventBus<TGateway>>,
    notifier: Arc<TNotifier>,
    state: watch::Sender<GroupsState>,
    lookups: Mutex<Lookups>,
}

impl<TGateway, TNotifier> GroupStore<TGateway, TNotifier>
where
    TGateway: EntityGateway + 'static,
    TNotifier: Notifier + 'static,
{
    pub fn new(
        gateway: Arc<TGateway>,
        bus: Arc<GroupEventBus<TGateway>>,
        notifier: Arc<TNotifier>,
    ) -> Self {
        let (state, _) = watch::channel(GroupsState::default());
        Self {
            gateway,
            bus,
            notifier,
            state,
            lookups: Mutex::new(Lookups::default()),
        }
    }

    pub fn bus(&self) -> &Arc<GroupEventBus<TGateway>> {
        &self.bus
    }

    pub fn subscribe(&self) -> watch::Receiver<GroupsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> GroupsState {
        self.state.borrow().clone()
    }

    pub fn group(&self, id: &str) -> Option<Group> {
        self.state.borrow().group(id).cloned()
    }

    pub fn pending_sync_count(&self) -> usize {
        self.bus.queue().pending_count()
    }

    pub fn history(&self) -> Vec<SharedChangeEvent> {
        self.bus.history()
    }

    pub async fn force_sync_all(&self) -> SweepReport {
        self.bus.queue().force_sync_all().await
    }

    pub fn set_editing(&self, id: Option<String>) {
        self.state.send_modify(|state| state.editing = id);
    }

    pub fn select(&self, id: Option<String>) {
        self.state.send_modify(|state| state.selected = id);
    }

    pub async fn fetch_all(&self) -> Result<(), StoreError> {
        self.state.send_modify(|state| state.is_loading = true);

        let fetched = tokio::try_join!(
            self.gateway.list_teams(),
            self.gateway.list_users(),
            self.gateway.list_sellers()
        );

        let (teams, users, sellers) = match fetched {
            Ok(collections) => collections,
            Err(error) => {
                tracing::error!(%error, "failed to load groups");
                self.state.send_modify(|state| {
                    state.is_loading = false;
                    state.error = Some(error.to_string());
                });
                return Err(error.into());
            }
        };

        let directory = Directory {
            teams,
            users,
            sellers,
        };
        let projection = project(&directory);
        tracing::debug!(
            groups = projection.groups.len(),
            available_sellers = projection.available_sellers.len(),
            "groups loaded"
        );

        *self.lookups() = Lookups {
            users: directory.users,
            sellers: directory.sellers,
        };
        self.state.send_modify(|state| {
            state.groups = projection.groups;
            state.leader_candidates = projection.leader_candidates;
            state.available_sellers = projection.available_sellers;
            state.is_loading = false;
            state.error = None;
            state.forget_missing_refs();
        });
        Ok(())
    }

    pub async fn create(&self, input: NewGroup) -> Result<TeamRecord, StoreError> {
        const FAILED: &str = "Failed to create group";

        let payload = create_payload(&input).map_err(|error| self.fail(FAILED, error))?;
        let created = self
            .gateway
            .create_team(&payload)
            .await
            .map_err(|error| self.fail(FAILED, error))?;

        let leader = self.leader_name(created.manager_id.as_deref());
        let preview = Group::new(created.clone(), leader, Vec::new());
        self.state
            .send_modify(|state| state.upsert_group(preview.clone()));
        self.bus.emit(ChangeKind::Create, preview, None).await;
        self.notifier
            .notify(Notification::success("Group created", created.name.clone()));

        self.reconcile().await;
        Ok(created)
    }

    pub async fn update(&self, id: &str, patch: GroupPatch) -> Result<Group, StoreError> {
        const FAILED: &str = "Failed to update group";

        let current = self.require(id).map_err(|error| self.fail(FAILED, error))?;
        let merged = merge_patch(&current.raw, &patch).map_err(|error| self.fail(FAILED, error))?;
        self.gateway
            .update_team(id, &TeamPayload::from(&merged))
            .await
            .map_err(|error| self.fail(FAILED, error))?;

        let leader = self.leader_name(merged.manager_id.as_deref());
        let mut updated = current;
        updated.apply_record(merged, leader);
        self.state
            .send_modify(|state| state.upsert_group(updated.clone()));
        self.bus
            .emit(ChangeKind::Update, updated.clone(), None)
            .await;
        self.notifier
            .notify(Notification::success("Group updated", updated.name.clone()));
        Ok(updated)
    }

    pub async fn add_member(&self, group_id: &str, member_id: &str) -> Result<(), StoreError> {
        const FAILED: &str = "Failed to add member";

        let current = self
            .require(group_id)
            .map_err(|error| self.fail(FAILED, error))?;
        let record = with_sellers(&current.raw, sellers_with(&current.raw, member_id));
        self.gateway
            .update_team(group_id, &TeamPayload::from(&record))
            .await
            .map_err(|error| self.fail(FAILED, error))?;

        let mut snapshot = current.clone();
        snapshot.apply_record(record, current.leader.clone());
        if let Some(seller) = self.seller(member_id) {
            snapshot.add_member_locally(member_from(&seller));
        }
        let sellers = self.lookups().sellers.clone();
        self.state.send_modify(|state| {
            state.upsert_group(snapshot.clone());
            state.recompute_available(&sellers);
        });
        let name = snapshot.name.clone();
        self.bus
            .emit(
                ChangeKind::AddSeller,
                snapshot,
                Some(ChangeMetadata::member(member_id)),
            )
            .await;
        self.notifier
            .notify(Notification::success("Member added", name));

        self.reconcile().await;
        Ok(())
    }

    pub async fn remove_member(&self, group_id: &str, member_id: &str) -> Result<Group, StoreError> {
        const FAILED: &str = "Failed to remove member";

        let current = self
            .require(group_id)
            .map_err(|error| self.fail(FAILED, error))?;
        let record = with_sellers(&current.raw, sellers_without(&current.raw, member_id));
        self.gateway
            .update_team(group_id, &TeamPayload::from(&record))
            .await
            .map_err(|error| self.fail(FAILED, error))?;

        let mut updated = current;
        updated.remove_member_locally(member_id);
        let sellers = self.lookups().sellers.clone();
        self.state.send_modify(|state| {
            state.upsert_group(updated.clone());
            state.recompute_available(&sellers);
        });
        self.bus
            .emit(
                ChangeKind::RemoveSeller,
                updated.clone(),
                Some(ChangeMetadata::member(member_id)),
            )
            .await;
        self.notifier
            .notify(Notification::success("Member removed", updated.name.clone()));
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        const FAILED: &str = "Failed to delete group";

        let current = self.require(id).map_err(|error| self.fail(FAILED, error))?;
        self.gateway
            .delete_team(id)
            .await
            .map_err(|error| self.fail(FAILED, error))?;

        let sellers = self.lookups().sellers.clone();
        self.state.send_modify(|state| {
            state.remove_group(id);
            state.recompute_available(&sellers);
        });
        let name = current.name.clone();
        self.bus.emit(ChangeKind::Delete, current, None).await;
        self.notifier
            .notify(Notification::success("Group deleted", name));
        Ok(())
    }

    async fn reconcile(&self) {
        if let Err(error) = self.fetch_all().await {
            tracing::warn!(%error, "reconciling fetch failed, keeping local snapshot");
        }
    }

    fn require(&self, id: &str) -> Result<Group, StoreError> {
        self.group(id)
            .ok_or_else(|| StoreError::GroupNotFound(id.to_string()))
    }

    fn leader_name(&self, user_id: Option<&str>) -> Option<String> {
        let user_id = user_id?;
        self.lookups()
            .users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| user.name.clone())
    }

    fn seller(&self, seller_id: &str) -> Option<SellerRecord> {
        self.lookups()
            .sellers
            .iter()
            .find(|seller| seller.id == seller_id)
            .cloned()
    }

    fn fail(&self, title: &str, error: impl Into<StoreError>) -> StoreError {
        let error = error.into();
        tracing::error!(%error, "{title}");
        self.notifier
            .notify(Notification::error(title, error.to_string()));
        error
    }

    fn lookups(&self) -> MutexGuard<'_, Lookups> {
        self.lookups.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
