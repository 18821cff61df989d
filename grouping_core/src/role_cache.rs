//! Memoized per-member role state with change detection.

use std::collections::HashMap;

use bevy::prelude::Resource;

use crate::roles::{AssignedRole, Role};
use crate::roster::MemberId;

/// Last-known resolved role and last-known authority-assigned role per
/// member. The two signal sources are diffed independently so an event that
/// changes neither input never triggers re-resolution downstream.
#[derive(Resource, Debug, Default)]
pub struct RoleCache {
    resolved: HashMap<MemberId, Role>,
    assigned: HashMap<MemberId, AssignedRole>,
}

impl RoleCache {
    /// Store the freshly resolved role. Returns `true` when the role
    /// actually changed, which is what triggers re-bucketing.
    pub fn update_role(&mut self, member: MemberId, role: Role) -> bool {
        match self.resolved.insert(member, role) {
            Some(previous) => previous != role,
            None => true,
        }
    }

    /// Store the externally assigned role. Returns `true` on change.
    pub fn update_assigned(&mut self, member: MemberId, assigned: AssignedRole) -> bool {
        match self.assigned.insert(member, assigned) {
            Some(previous) => previous != assigned,
            None => assigned != AssignedRole::None,
        }
    }

    pub fn role_of(&self, member: MemberId) -> Option<Role> {
        self.resolved.get(&member).copied()
    }

    pub fn assigned_of(&self, member: MemberId) -> AssignedRole {
        self.assigned.get(&member).copied().unwrap_or_default()
    }

    /// Drop all cached state for a departing member.
    pub fn purge(&mut self, member: MemberId) {
        self.resolved.remove(&member);
        self.assigned.remove(&member);
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_reports_change() {
        let mut cache = RoleCache::default();
        assert!(cache.update_role(MemberId(1), Role::Melee));
        assert_eq!(cache.role_of(MemberId(1)), Some(Role::Melee));
    }

    #[test]
    fn same_role_twice_is_a_no_op() {
        let mut cache = RoleCache::default();
        assert!(cache.update_role(MemberId(1), Role::Tank));
        assert!(!cache.update_role(MemberId(1), Role::Tank));
        assert!(cache.update_role(MemberId(1), Role::Healer));
    }

    #[test]
    fn assigned_role_diffed_independently() {
        let mut cache = RoleCache::default();
        // The implicit initial state is None, so storing None is not a change.
        assert!(!cache.update_assigned(MemberId(2), AssignedRole::None));
        assert!(cache.update_assigned(MemberId(2), AssignedRole::Tank));
        assert!(!cache.update_assigned(MemberId(2), AssignedRole::Tank));
        assert_eq!(cache.assigned_of(MemberId(2)), AssignedRole::Tank);
    }

    #[test]
    fn purge_forgets_both_signals() {
        let mut cache = RoleCache::default();
        cache.update_role(MemberId(3), Role::Ranged);
        cache.update_assigned(MemberId(3), AssignedRole::Healer);
        cache.purge(MemberId(3));
        assert_eq!(cache.role_of(MemberId(3)), None);
        assert_eq!(cache.assigned_of(MemberId(3)), AssignedRole::None);
        assert!(cache.is_empty());
    }
}
