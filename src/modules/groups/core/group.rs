// Group is the aggregate root: a named team of sellers with a leader and a monthly quota.
//
// Invariants
// - member_count == members.len()
// - sold_this_month == sum of members' sales
// - raw.sellers is the source of truth for membership when building the next update request;
//   members must only ever contain sellers listed there.
//
// Boundaries
// - Pure data and local transitions. No input or output.

use crate::modules::groups::core::directory::TeamRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupStatus {
    Active,
    Inactive,
}

impl GroupStatus {
    pub fn from_active(active: bool) -> Self {
        if active {
            GroupStatus::Active
        } else {
            GroupStatus::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == GroupStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberStatus {
    Active,
    Inactive,
    OnLeave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub sales: f64,
    pub status: MemberStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub leader_user_id: Option<String>,
    pub leader: Option<String>,
    pub member_count: usize,
    pub monthly_quota: f64,
    pub sold_this_month: f64,
    pub status: GroupStatus,
    pub description: String,
    pub members: Vec<Member>,
    pub raw: TeamRecord,
}

impl Group {
    pub fn new(raw: TeamRecord, leader: Option<String>, members: Vec<Member>) -> Self {
        let mut group = Self {
            id: raw.id.clone(),
            name: String::new(),
            leader_user_id: None,
            leader: None,
            member_count: 0,
            monthly_quota: 0.0,
            sold_this_month: 0.0,
            status: GroupStatus::Active,
            description: String::new(),
            members,
            raw: raw.clone(),
        };
        group.apply_record(raw, leader);
        group.recompute_derived();
        group
    }

    /// Copies scalar fields from a server-shaped record. Membership is left alone
    /// apart from dropping members the record no longer lists.
    pub fn apply_record(&mut self, record: TeamRecord, leader: Option<String>) {
        self.name = record.name.clone();
        self.description = record.description.clone().unwrap_or_default();
        self.monthly_quota = record.monthly_quota;
        self.leader_user_id = record.manager_id.clone();
        self.leader = leader;
        self.status = GroupStatus::from_active(record.active);
        self.members.retain(|member| record.has_seller(&member.id));
        self.raw = record;
        self.recompute_derived();
    }

    pub fn recompute_derived(&mut self) {
        self.member_count = self.members.len();
        self.sold_this_month = self.members.iter().map(|member| member.sales).sum();
    }

    pub fn has_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|member| member.id == member_id)
    }

    /// Adds the member to both views of membership. Returns false when already present.
    pub fn add_member_locally(&mut self, member: Member) -> bool {
        let added_to_raw = if self.raw.has_seller(&member.id) {
            false
        } else {
            self.raw.sellers.push(member.id.clone());
            true
        };
        let added = if self.has_member(&member.id) {
            false
        } else {
            self.members.push(member);
            true
        };
        self.recompute_derived();
        added || added_to_raw
    }

    /// Removes the member from both views of membership. Returns false when it was absent.
    pub fn remove_member_locally(&mut self, member_id: &str) -> bool {
        let before = (self.members.len(), self.raw.sellers.len());
        self.members.retain(|member| member.id != member_id);
        self.raw.sellers.retain(|id| id != member_id);
        self.recompute_derived();
        before != (self.members.len(), self.raw.sellers.len())
    }
}
