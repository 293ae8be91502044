// HTTP implementation of the EntityGateway port over the REST backend.
//
// Responsibilities
// - Bulk reads: GET /teams, /users, /sellers with page=0 and a large page size. Both a bare
//   JSON array and a `{ "content": [...] }` page envelope are accepted.
// - Writes: POST /teams, PUT /teams/{id}, DELETE /teams/{id} with JSON bodies.
// - Map loosely shaped user and seller payloads to typed records. User roles are resolved here,
//   once, and nowhere else.
//
// Errors
// - 404 becomes GatewayError::NotFound, any other non-2xx becomes GatewayError::Status.

use crate::modules::groups::adapters::outbound::gateway::{EntityGateway, GatewayError};
use crate::modules::groups::core::directory::{SellerRecord, TeamRecord, UserRecord, UserRole};
use crate::modules::groups::core::group::MemberStatus;
use crate::modules::groups::core::patch::TeamPayload;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Deserialize)]
#[serde(untagged)]
enum Page<T> {
    Envelope { content: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Page<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Page::Envelope { content } => content,
            Page::Bare(items) => items,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupRefDto {
    Name(String),
    Named { name: String },
}

impl GroupRefDto {
    fn name(&self) -> &str {
        match self {
            GroupRefDto::Name(name) => name,
            GroupRefDto::Named { name } => name,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    id: String,
    #[serde(alias = "fullName")]
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    groups: Vec<GroupRefDto>,
}

impl From<UserDto> for UserRecord {
    fn from(dto: UserDto) -> Self {
        let role = UserRole::resolve(dto.role.as_deref(), dto.groups.iter().map(GroupRefDto::name));
        Self {
            id: dto.id,
            name: dto.name,
            email: dto.email,
            role,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SellerDto {
    id: String,
    name: String,
    #[serde(default, alias = "sales")]
    monthly_sales: f64,
    #[serde(default)]
    status: Option<String>,
}

fn member_status(status: Option<&str>) -> MemberStatus {
    match status.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("active") | None => MemberStatus::Active,
        Some("on-leave" | "on_leave" | "vacation") => MemberStatus::OnLeave,
        Some(_) => MemberStatus::Inactive,
    }
}

impl From<SellerDto> for SellerRecord {
    fn from(dto: SellerDto) -> Self {
        Self {
            status: member_status(dto.status.as_deref()),
            id: dto.id,
            name: dto.name,
            sales: dto.monthly_sales,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpEntityGateway {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl HttpEntityGateway {
    pub fn new(base_url: &str, page_size: u32, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .query(&[("page", 0), ("size", self.page_size)])
            .send()
            .await?;
        let body = Self::body(response).await?;
        let page: Page<T> = serde_json::from_slice(&body)?;
        Ok(page.into_items())
    }

    async fn body(response: Response) -> Result<Vec<u8>, GatewayError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            let url = response.url().to_string();
            return Err(GatewayError::NotFound(url));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl EntityGateway for HttpEntityGateway {
    async fn list_teams(&self) -> Result<Vec<TeamRecord>, GatewayError> {
        self.read_all("teams").await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, GatewayError> {
        let users: Vec<UserDto> = self.read_all("users").await?;
        Ok(users.into_iter().map(UserRecord::from).collect())
    }

    async fn list_sellers(&self) -> Result<Vec<SellerRecord>, GatewayError> {
        let sellers: Vec<SellerDto> = self.read_all("sellers").await?;
        Ok(sellers.into_iter().map(SellerRecord::from).collect())
    }

    async fn create_team(&self, payload: &TeamPayload) -> Result<TeamRecord, GatewayError> {
        let response = self.client.post(self.url("teams")).json(payload).send().await?;
        let body = Self::body(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn update_team(&self, id: &str, payload: &TeamPayload) -> Result<TeamRecord, GatewayError> {
        let response = self
            .client
            .put(self.url(&format!("teams/{id}")))
            .json(payload)
            .send()
            .await?;
        let body = Self::body(response).await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(payload.clone().into_record(id));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn delete_team(&self, id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url(&format!("teams/{id}")))
            .send()
            .await?;
        Self::body(response).await?;
        Ok(())
    }
}
