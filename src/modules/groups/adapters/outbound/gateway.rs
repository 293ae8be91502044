// Port to the remote entity backend (teams, users, sellers).
//
// Purpose
// - Describe the calls the groups core needs, without committing to a transport.
//
// Testing guidance
// - Use InMemoryEntityGateway; it can go offline or fail the next N writes on demand.

use crate::modules::groups::core::directory::{SellerRecord, TeamRecord, UserRecord};
use crate::modules::groups::core::patch::TeamPayload;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait EntityGateway: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<TeamRecord>, GatewayError>;
    async fn list_users(&self) -> Result<Vec<UserRecord>, GatewayError>;
    async fn list_sellers(&self) -> Result<Vec<SellerRecord>, GatewayError>;
    async fn create_team(&self, payload: &TeamPayload) -> Result<TeamRecord, GatewayError>;
    /// Full replacement: `payload.sellers` is the complete membership list.
    async fn update_team(&self, id: &str, payload: &TeamPayload) -> Result<TeamRecord, GatewayError>;
    async fn delete_team(&self, id: &str) -> Result<(), GatewayError>;
}
