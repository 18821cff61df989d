//! Layout projection: role buckets → positional layout groups.

use bevy::prelude::Resource;
use serde::Serialize;

use crate::buckets::MembershipIndex;
use crate::grouping_config::{GroupingConfig, UNITS_PER_COLUMN};
use crate::roles::Role;
use crate::roster::Roster;

/// One positional layout group consumed by the external layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutGroup {
    /// Ordered slot, 1..4 (5 for the optional pet group).
    pub slot: u8,
    pub role: Role,
    /// Comma-joined ordered display names; empty when the bucket is empty.
    pub name_list: String,
}

/// The registered layout descriptor: ordered groups plus shared defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutDescriptor {
    pub groups: Vec<LayoutGroup>,
    pub units_per_column: u32,
    pub max_columns: u32,
}

/// Last projected descriptor; the comparison point for reload suppression.
#[derive(Resource, Debug, Default)]
pub struct LayoutState {
    current: Option<LayoutDescriptor>,
}

impl LayoutState {
    /// Recompute the descriptor from the buckets and configuration. Returns
    /// `true` only when the projected content actually differs from the
    /// previous projection; redundant reloads must be suppressed.
    pub fn project(
        &mut self,
        index: &MembershipIndex,
        roster: &Roster,
        config: &GroupingConfig,
    ) -> bool {
        let mut groups = Vec::with_capacity(config.slot_count());
        for slot in 0..4usize {
            let role = config.slot_role(slot);
            groups.push(LayoutGroup {
                slot: slot as u8 + 1,
                role,
                name_list: index.name_list(role),
            });
        }
        if config.pet_group {
            groups.push(LayoutGroup {
                slot: 5,
                role: Role::Pet,
                name_list: index.name_list(Role::Pet),
            });
        }

        let active = roster.active_players(config.raid_size_cap);
        let descriptor = LayoutDescriptor {
            groups,
            units_per_column: UNITS_PER_COLUMN,
            max_columns: active.div_ceil(UNITS_PER_COLUMN),
        };

        if self.current.as_ref() == Some(&descriptor) {
            return false;
        }
        self.current = Some(descriptor);
        true
    }

    pub fn descriptor(&self) -> Option<&LayoutDescriptor> {
        self.current.as_ref()
    }
}
