// Change events: one record per mutation intent on a group, tracked until the backend confirms it.
//
// Responsibilities
// - Carry the kind, the group snapshot at emission time, a timestamp, and optional metadata.
// - Hold the mutable sync state that the sync queue updates in place while retrying.
//
// Notes
// - Events are shared between the history buffer and the pending queue, so sync state sits
//   behind a lock and is only changed through the methods below.

use crate::modules::groups::core::group::Group;
use crate::shared::core::primitives::{Timestamp, now_millis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    AddSeller,
    RemoveSeller,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 5] = [
        ChangeKind::Create,
        ChangeKind::Update,
        ChangeKind::Delete,
        ChangeKind::AddSeller,
        ChangeKind::RemoveSeller,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
            ChangeKind::AddSeller => "addSeller",
            ChangeKind::RemoveSeller => "removeSeller",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMetadata {
    pub member_id: Option<String>,
}

impl ChangeMetadata {
    pub fn member(member_id: impl Into<String>) -> Self {
        Self {
            member_id: Some(member_id.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Pending,
    Synced,
    Superseded,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    pub status: SyncStatus,
    pub sync_error: Option<String>,
    pub attempts: u32,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            status: SyncStatus::Pending,
            sync_error: None,
            attempts: 0,
        }
    }
}

#[derive(Debug)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub kind: ChangeKind,
    pub group: Group,
    pub timestamp: Timestamp,
    pub metadata: Option<ChangeMetadata>,
    state: Mutex<SyncState>,
}

pub type SharedChangeEvent = Arc<ChangeEvent>;

impl ChangeEvent {
    pub fn new(kind: ChangeKind, group: Group, metadata: Option<ChangeMetadata>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind,
            group,
            timestamp: now_millis(),
            metadata,
            state: Mutex::new(SyncState::default()),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group.id
    }

    pub fn sync_state(&self) -> SyncState {
        self.state().clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.state().status
    }

    pub fn is_synced(&self) -> bool {
        self.status() == SyncStatus::Synced
    }

    pub fn is_pending(&self) -> bool {
        self.status() == SyncStatus::Pending
    }

    pub fn sync_error(&self) -> Option<String> {
        self.state().sync_error.clone()
    }

    pub fn attempts(&self) -> u32 {
        self.state().attempts
    }

    /// Counts one more delivery attempt and returns the new total.
    pub(crate) fn begin_attempt(&self) -> u32 {
        let mut state = self.state();
        state.attempts += 1;
        state.attempts
    }

    /// Status transitions only ever leave `Pending`. Each returns false when the event
    /// had already left it, leaving the state untouched.
    pub(crate) fn mark_synced(&self) -> bool {
        let mut state = self.state();
        if state.status != SyncStatus::Pending {
            return false;
        }
        state.status = SyncStatus::Synced;
        state.sync_error = None;
        true
    }

    pub(crate) fn mark_failed(&self, error: impl Into<String>) -> bool {
        let mut state = self.state();
        if state.status != SyncStatus::Pending {
            return false;
        }
        state.sync_error = Some(error.into());
        true
    }

    pub(crate) fn mark_abandoned(&self) -> bool {
        self.leave_pending(SyncStatus::Abandoned)
    }

    pub(crate) fn mark_superseded(&self) -> bool {
        self.leave_pending(SyncStatus::Superseded)
    }

    fn leave_pending(&self, status: SyncStatus) -> bool {
        let mut state = self.state();
        if state.status != SyncStatus::Pending {
            return false;
        }
        state.status = status;
        true
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
