// In memory implementation of the EntityGateway port.
//
// Purpose
// - Exercise the store and the sync queue without a backend.
//
// Responsibilities
// - Keep teams, users and sellers in memory and record every call for inspection.
// - Simulate outages: `set_offline` fails every call, `set_reads_offline` fails only the listings,
//   `fail_next_writes` fails the next N writes.

use crate::modules::groups::adapters::outbound::gateway::{EntityGateway, GatewayError};
use crate::modules::groups::core::directory::{Directory, SellerRecord, TeamRecord, UserRecord};
use crate::modules::groups::core::patch::TeamPayload;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    ListTeams,
    ListUsers,
    ListSellers,
    CreateTeam(TeamPayload),
    UpdateTeam { id: String, payload: TeamPayload },
    DeleteTeam(String),
}

#[derive(Default)]
pub struct InMemoryEntityGateway {
    directory: RwLock<Directory>,
    calls: Mutex<Vec<GatewayCall>>,
    is_offline: AtomicBool,
    reads_offline: AtomicBool,
    failing_writes: AtomicU32,
}

impl InMemoryEntityGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(directory: Directory) -> Self {
        Self {
            directory: RwLock::new(directory),
            ..Self::default()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.is_offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_reads_offline(&self, offline: bool) {
        self.reads_offline.store(offline, Ordering::SeqCst);
    }

    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count_calls(&self, matches: impl Fn(&GatewayCall) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub async fn team(&self, id: &str) -> Option<TeamRecord> {
        self.directory
            .read()
            .await
            .teams
            .iter()
            .find(|team| team.id == id)
            .cloned()
    }

    pub async fn insert_team(&self, team: TeamRecord) {
        self.directory.write().await.teams.push(team);
    }

    fn record(&self, call: GatewayCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("Entity gateway offline".into()));
        }
        Ok(())
    }

    fn check_read(&self) -> Result<(), GatewayError> {
        self.check_online()?;
        if self.reads_offline.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("Entity gateway reads unavailable".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), GatewayError> {
        self.check_online()?;
        let consumed = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
        if consumed.is_ok() {
            return Err(GatewayError::Unavailable("Entity gateway rejected the write".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EntityGateway for InMemoryEntityGateway {
    async fn list_teams(&self) -> Result<Vec<TeamRecord>, GatewayError> {
        self.record(GatewayCall::ListTeams);
        self.check_read()?;
        Ok(self.directory.read().await.teams.clone())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, GatewayError> {
        self.record(GatewayCall::ListUsers);
        self.check_read()?;
        Ok(self.directory.read().await.users.clone())
    }

    async fn list_sellers(&self) -> Result<Vec<SellerRecord>, GatewayError> {
        self.record(GatewayCall::ListSellers);
        self.check_read()?;
        Ok(self.directory.read().await.sellers.clone())
    }

    async fn create_team(&self, payload: &TeamPayload) -> Result<TeamRecord, GatewayError> {
        self.record(GatewayCall::CreateTeam(payload.clone()));
        self.check_write()?;
        let team = payload.clone().into_record(format!("team-{}", Uuid::now_v7()));
        self.directory.write().await.teams.push(team.clone());
        Ok(team)
    }

    async fn update_team(&self, id: &str, payload: &TeamPayload) -> Result<TeamRecord, GatewayError> {
        self.record(GatewayCall::UpdateTeam {
            id: id.to_string(),
            payload: payload.clone(),
        });
        self.check_write()?;
        let mut directory = self.directory.write().await;
        let team = directory
            .teams
            .iter_mut()
            .find(|team| team.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("team {id}")))?;
        *team = payload.clone().into_record(id);
        Ok(team.clone())
    }

    async fn delete_team(&self, id: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::DeleteTeam(id.to_string()));
        self.check_write()?;
        let mut directory = self.directory.write().await;
        let before = directory.teams.len();
        directory.teams.retain(|team| team.id != id);
        if directory.teams.len() == before {
            return Err(GatewayError::NotFound(format!("team {id}")));
        }
        Ok(())
    }
}
