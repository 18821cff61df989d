//! Per-role membership buckets with sorted display-name sequences.

use std::collections::HashSet;

use bevy::prelude::Resource;

use crate::roles::{Role, ALL_ROLES, ROLE_COUNT};
use crate::roster::MemberId;

/// One role bucket: the member-id set and the derived name sequence kept in
/// ascending lexical order.
#[derive(Debug, Default, Clone)]
pub struct Bucket {
    members: HashSet<MemberId>,
    names: Vec<String>,
}

impl Bucket {
    fn insert(&mut self, member: MemberId, name: &str) {
        if self.members.insert(member) {
            let at = insertion_point(&self.names, name);
            self.names.insert(at, name.to_string());
        }
    }

    fn remove(&mut self, member: MemberId, name: &str) {
        if self.members.remove(&member) {
            if let Some(at) = self.names.iter().position(|n| n == name) {
                self.names.remove(at);
            }
        }
    }

    pub fn contains(&self, member: MemberId) -> bool {
        self.members.contains(&member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Rightmost-insertion binary search: returns the position `p` such that all
/// entries before `p` compare `< name` and all entries at or after `p`
/// compare `>= name`. Duplicate names are handled stably.
fn insertion_point(names: &[String], name: &str) -> usize {
    let mut lo = 0;
    let mut hi = names.len();
    while lo < hi {
        let mid = (lo + hi) / 2;
        if names[mid].as_str() < name {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

/// Owner of the five role buckets. A member id belongs to at most one bucket
/// at any time; re-bucketing moves it atomically.
#[derive(Resource, Debug, Default)]
pub struct MembershipIndex {
    buckets: [Bucket; ROLE_COUNT],
}

impl MembershipIndex {
    pub fn bucket(&self, role: Role) -> &Bucket {
        &self.buckets[role.index()]
    }

    /// Move a member between buckets. `old` is `None` on first assignment;
    /// removal from a bucket the member is not in is a no-op.
    pub fn rebucket(&mut self, member: MemberId, name: &str, old: Option<Role>, new: Role) {
        if old == Some(new) {
            return;
        }
        if let Some(old) = old {
            self.buckets[old.index()].remove(member, name);
        }
        self.buckets[new.index()].insert(member, name);
    }

    /// Remove a member entirely (roster departure).
    pub fn remove(&mut self, member: MemberId, name: &str, role: Option<Role>) {
        if let Some(role) = role {
            self.buckets[role.index()].remove(member, name);
        }
    }

    /// Re-sort one bucket's name sequence from scratch. Used when a display
    /// name resolves late or on a full roster resync; the member set is the
    /// source of truth and the sequence is rebuilt, not diffed.
    pub fn rebuild<'a>(
        &mut self,
        role: Role,
        resolve_name: impl Fn(MemberId) -> Option<&'a str>,
    ) {
        let bucket = &mut self.buckets[role.index()];
        let mut names: Vec<String> = bucket
            .members
            .iter()
            .filter_map(|&m| resolve_name(m).map(str::to_string))
            .collect();
        names.sort_unstable();
        bucket.names = names;
    }

    /// Comma-joined ordered names for a role; empty string for an empty
    /// bucket, no trailing separator.
    pub fn name_list(&self, role: Role) -> String {
        self.buckets[role.index()].names().join(",")
    }

    pub fn total_members(&self) -> usize {
        ALL_ROLES.iter().map(|&r| self.bucket(r).len()).sum()
    }
}
