// Observable snapshot of the groups screen.
//
// Invariants
// - `editing` and `selected` only ever reference ids present in `groups`, or are None.
// - `available_sellers` lists sellers that no group's membership ids reference.

use crate::modules::groups::core::directory::{SellerRecord, UserRecord};
use crate::modules::groups::core::group::Group;
use crate::modules::groups::core::projection::available_sellers;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupsState {
    pub groups: Vec<Group>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub editing: Option<String>,
    pub selected: Option<String>,
    pub leader_candidates: Vec<UserRecord>,
    pub available_sellers: Vec<SellerRecord>,
}

impl GroupsState {
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    pub fn editing_group(&self) -> Option<&Group> {
        self.editing.as_deref().and_then(|id| self.group(id))
    }

    pub fn selected_group(&self) -> Option<&Group> {
        self.selected.as_deref().and_then(|id| self.group(id))
    }

    /// Replaces the group with the same id, or appends it.
    pub fn upsert_group(&mut self, group: Group) {
        match self.groups.iter_mut().find(|current| current.id == group.id) {
            Some(current) => *current = group,
            None => self.groups.push(group),
        }
    }

    pub fn remove_group(&mut self, id: &str) -> Option<Group> {
        let position = self.groups.iter().position(|group| group.id == id)?;
        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Some(self.groups.remove(position))
    }

    /// Drops editing/selected references to groups that no longer exist.
    pub fn forget_missing_refs(&mut self) {
        if self.editing_group().is_none() {
            self.editing = None;
        }
        if self.selected_group().is_none() {
            self.selected = None;
        }
    }

    pub fn recompute_available(&mut self, sellers: &[SellerRecord]) {
        self.available_sellers = available_sellers(sellers, self.groups.iter().map(|group| &group.raw));
    }
}
