// Upstream records the group aggregate is derived from: teams, users, sellers.
//
// Purpose
// - Hold the last-known server representation of each record in a typed shape.
//
// Responsibilities
// - TeamRecord keeps fields it does not understand in `extra`, so a partial local
//   update never drops server-only data when it is sent back.
// - UserRole is resolved once, at the gateway mapping boundary, from loosely shaped
//   role strings and group memberships.
//
// Boundaries
// - No input or output here.

use crate::modules::groups::core::group::MemberStatus;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub monthly_quota: f64,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub sellers: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TeamRecord {
    pub fn has_seller(&self, seller_id: &str) -> bool {
        self.sellers.iter().any(|id| id == seller_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Seller,
    Other,
}

impl UserRole {
    /// Resolves the role from the free-text role field first, then from the
    /// names of the groups the user belongs to. The strongest match wins.
    pub fn resolve<'a>(role: Option<&str>, groups: impl IntoIterator<Item = &'a str>) -> Self {
        let mut resolved = role.map(Self::from_label).unwrap_or(UserRole::Other);
        for group in groups {
            let candidate = Self::from_label(group);
            if candidate.rank() > resolved.rank() {
                resolved = candidate;
            }
        }
        resolved
    }

    pub fn can_lead(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }

    fn from_label(label: &str) -> Self {
        let label = label
            .trim()
            .trim_start_matches("ROLE_")
            .trim_start_matches("role_")
            .to_lowercase();
        match label.as_str() {
            "admin" | "administrator" | "administrador" => UserRole::Admin,
            "manager" | "managers" | "gerente" | "gerentes" | "gestor" | "supervisor"
            | "lider" | "leader" => UserRole::Manager,
            "seller" | "sellers" | "vendedor" | "vendedores" | "sales" => UserRole::Seller,
            _ => UserRole::Other,
        }
    }

    fn rank(self) -> u8 {
        match self {
            UserRole::Admin => 3,
            UserRole::Manager => 2,
            UserRole::Seller => 1,
            UserRole::Other => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerRecord {
    pub id: String,
    pub name: String,
    pub sales: f64,
    pub status: MemberStatus,
}

/// The three upstream collections as loaded in one `fetch_all`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directory {
    pub teams: Vec<TeamRecord>,
    pub users: Vec<UserRecord>,
    pub sellers: Vec<SellerRecord>,
}
