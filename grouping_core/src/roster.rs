//! Roster state: the members currently observed in the group.

use std::collections::HashMap;
use std::fmt;

use bevy::prelude::Resource;

use crate::roles::{Class, SpecId};

/// Stable unique identifier for a roster member (GUID-equivalent).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cached attributes for one member. Populated opportunistically as signals
/// arrive; purged when the member leaves.
#[derive(Debug, Clone)]
pub struct MemberState {
    pub name: String,
    pub class: Option<Class>,
    pub spec: Option<SpecId>,
    pub pet: bool,
    pub connected: bool,
}

impl MemberState {
    pub fn new(name: String, pet: bool) -> Self {
        Self {
            name,
            class: None,
            spec: None,
            pet,
            connected: true,
        }
    }
}

/// Live roster plus the group-level facts the layout projector consumes.
#[derive(Resource, Debug)]
pub struct Roster {
    members: HashMap<MemberId, MemberState>,
    /// Observed group size as reported by the roster provider. Tracked
    /// separately from the member map so party frames for not-yet-observed
    /// units still count toward column math.
    pub party_size: u32,
    /// Player cap of the current instance, when inside one.
    pub instance_cap: Option<u32>,
    /// True while the environment disallows inspection requests.
    pub lockdown: bool,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            members: HashMap::new(),
            party_size: 0,
            instance_cap: None,
            lockdown: false,
        }
    }
}

impl Roster {
    pub fn insert(&mut self, member: MemberId, state: MemberState) {
        self.members.insert(member, state);
    }

    pub fn remove(&mut self, member: MemberId) -> Option<MemberState> {
        self.members.remove(&member)
    }

    pub fn get(&self, member: MemberId) -> Option<&MemberState> {
        self.members.get(&member)
    }

    pub fn get_mut(&mut self, member: MemberId) -> Option<&mut MemberState> {
        self.members.get_mut(&member)
    }

    pub fn contains(&self, member: MemberId) -> bool {
        self.members.contains_key(&member)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, &MemberState)> {
        self.members.iter().map(|(&id, state)| (id, state))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Player count that participates in column math: the lesser of the
    /// instance cap and the observed size inside instances, the lesser of
    /// the raid cap and the observed size outside.
    pub fn active_players(&self, raid_size_cap: u32) -> u32 {
        let observed = self.party_size.max(self.members.len() as u32);
        match self.instance_cap {
            Some(cap) => observed.min(cap),
            None => observed.min(raid_size_cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_players_respects_instance_cap() {
        let mut roster = Roster::default();
        roster.party_size = 30;
        roster.instance_cap = Some(25);
        assert_eq!(roster.active_players(40), 25);

        roster.instance_cap = None;
        assert_eq!(roster.active_players(40), 30);
        assert_eq!(roster.active_players(20), 20);
    }

    #[test]
    fn observed_members_count_when_size_fact_lags() {
        let mut roster = Roster::default();
        roster.insert(MemberId(1), MemberState::new("Ana".into(), false));
        roster.insert(MemberId(2), MemberState::new("Bo".into(), false));
        assert_eq!(roster.active_players(40), 2);
    }
}
