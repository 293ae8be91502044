// Building request payloads for the team endpoints.
//
// Responsibilities
// - Turn a NewGroup into a create payload: slug code from the name, quota 0, no manager, no sellers.
// - Merge a GroupPatch over the last-known record. Every field the patch leaves out is read
//   from the record, never left empty.
// - Always carry the complete seller id list: the backend replaces membership wholesale.

use crate::modules::groups::core::directory::TeamRecord;
use crate::modules::groups::core::group::GroupStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("group name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewGroup {
    pub name: String,
    pub description: Option<String>,
    pub monthly_quota: Option<f64>,
    pub leader_user_id: Option<String>,
    pub status: Option<GroupStatus>,
}

impl NewGroup {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn monthly_quota(mut self, quota: f64) -> Self {
        self.monthly_quota = Some(quota);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn leader(mut self, user_id: impl Into<String>) -> Self {
        self.leader_user_id = Some(user_id.into());
        self
    }

    pub fn status(mut self, status: GroupStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Partial change to a group. `leader_user_id: Some(None)` clears the leader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub monthly_quota: Option<f64>,
    pub leader_user_id: Option<Option<String>>,
    pub status: Option<GroupStatus>,
}

impl GroupPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn monthly_quota(mut self, quota: f64) -> Self {
        self.monthly_quota = Some(quota);
        self
    }

    pub fn leader(mut self, user_id: Option<String>) -> Self {
        self.leader_user_id = Some(user_id);
        self
    }

    pub fn status(mut self, status: GroupStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Body of POST /teams and PUT /teams/{id}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPayload {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub monthly_quota: f64,
    pub manager_id: Option<String>,
    pub active: bool,
    pub sellers: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&TeamRecord> for TeamPayload {
    fn from(record: &TeamRecord) -> Self {
        Self {
            name: record.name.clone(),
            code: record.code.clone(),
            description: record.description.clone(),
            monthly_quota: record.monthly_quota,
            manager_id: record.manager_id.clone(),
            active: record.active,
            sellers: record.sellers.clone(),
            extra: record.extra.clone(),
        }
    }
}

impl TeamPayload {
    pub fn into_record(self, id: impl Into<String>) -> TeamRecord {
        TeamRecord {
            id: id.into(),
            name: self.name,
            code: self.code,
            description: self.description,
            monthly_quota: self.monthly_quota,
            manager_id: self.manager_id,
            active: self.active,
            sellers: self.sellers,
            extra: self.extra,
        }
    }
}

pub fn create_payload(input: &NewGroup) -> Result<TeamPayload, PatchError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(PatchError::EmptyName);
    }
    Ok(TeamPayload {
        name: name.to_string(),
        code: slugify(name),
        description: input.description.clone(),
        monthly_quota: input.monthly_quota.unwrap_or(0.0),
        manager_id: input.leader_user_id.clone(),
        active: input.status.map(GroupStatus::is_active).unwrap_or(true),
        sellers: Vec::new(),
        extra: Map::new(),
    })
}

pub fn merge_patch(record: &TeamRecord, patch: &GroupPatch) -> Result<TeamRecord, PatchError> {
    let name = match &patch.name {
        Some(name) if name.trim().is_empty() => return Err(PatchError::EmptyName),
        Some(name) => name.trim().to_string(),
        None => record.name.clone(),
    };
    Ok(TeamRecord {
        id: record.id.clone(),
        name,
        code: record.code.clone(),
        description: patch
            .description
            .clone()
            .or_else(|| record.description.clone()),
        monthly_quota: patch.monthly_quota.unwrap_or(record.monthly_quota),
        manager_id: patch
            .leader_user_id
            .clone()
            .unwrap_or_else(|| record.manager_id.clone()),
        active: patch
            .status
            .map(GroupStatus::is_active)
            .unwrap_or(record.active),
        sellers: record.sellers.clone(),
        extra: record.extra.clone(),
    })
}

pub fn with_sellers(record: &TeamRecord, sellers: Vec<String>) -> TeamRecord {
    TeamRecord {
        sellers,
        ..record.clone()
    }
}

/// Membership list after adding `seller_id`, without duplicates.
pub fn sellers_with(record: &TeamRecord, seller_id: &str) -> Vec<String> {
    let mut sellers = record.sellers.clone();
    if !record.has_seller(seller_id) {
        sellers.push(seller_id.to_string());
    }
    sellers
}

/// Membership list after removing `seller_id`.
pub fn sellers_without(record: &TeamRecord, seller_id: &str) -> Vec<String> {
    record
        .sellers
        .iter()
        .filter(|id| id.as_str() != seller_id)
        .cloned()
        .collect()
}

pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(char::to_lowercase).map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}
