// Derives the group snapshot from the three upstream collections.
//
// Purpose
// - group <- team; leader name <- users by manager id; members <- sellers listed in the team.
// - Side projections: leader candidates and sellers not assigned to any team, both sorted by name.
//
// Boundaries
// - Pure functions, no input or output.

use crate::modules::groups::core::directory::{Directory, SellerRecord, TeamRecord, UserRecord};
use crate::modules::groups::core::group::{Group, Member};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    pub groups: Vec<Group>,
    pub leader_candidates: Vec<UserRecord>,
    pub available_sellers: Vec<SellerRecord>,
}

pub fn project(directory: &Directory) -> Projection {
    let users: HashMap<&str, &UserRecord> = directory
        .users
        .iter()
        .map(|user| (user.id.as_str(), user))
        .collect();
    let sellers: HashMap<&str, &SellerRecord> = directory
        .sellers
        .iter()
        .map(|seller| (seller.id.as_str(), seller))
        .collect();

    let groups = directory
        .teams
        .iter()
        .map(|team| build_group(team, &users, &sellers))
        .collect();

    Projection {
        groups,
        leader_candidates: leader_candidates(&directory.users),
        available_sellers: available_sellers(&directory.sellers, &directory.teams),
    }
}

pub fn build_group(
    team: &TeamRecord,
    users: &HashMap<&str, &UserRecord>,
    sellers: &HashMap<&str, &SellerRecord>,
) -> Group {
    let leader = team
        .manager_id
        .as_deref()
        .and_then(|id| users.get(id))
        .map(|user| user.name.clone());

    let mut seen = HashSet::new();
    let members = team
        .sellers
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .filter_map(|id| sellers.get(id.as_str()))
        .map(|seller| member_from(seller))
        .collect();

    Group::new(team.clone(), leader, members)
}

pub fn member_from(seller: &SellerRecord) -> Member {
    Member {
        id: seller.id.clone(),
        name: seller.name.clone(),
        sales: seller.sales,
        status: seller.status,
    }
}

pub fn leader_candidates(users: &[UserRecord]) -> Vec<UserRecord> {
    let mut candidates: Vec<UserRecord> = users
        .iter()
        .filter(|user| user.role.can_lead())
        .cloned()
        .collect();
    candidates.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    candidates
}

pub fn available_sellers<'a>(
    sellers: &[SellerRecord],
    teams: impl IntoIterator<Item = &'a TeamRecord>,
) -> Vec<SellerRecord> {
    let assigned: HashSet<&str> = teams
        .into_iter()
        .flat_map(|team| team.sellers.iter().map(String::as_str))
        .collect();
    let mut available: Vec<SellerRecord> = sellers
        .iter()
        .filter(|seller| !assigned.contains(seller.id.as_str()))
        .cloned()
        .collect();
    available.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    available
}
