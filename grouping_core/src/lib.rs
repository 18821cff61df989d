//! Core crate for the role-grid grouping engine.
//!
//! Classifies roster members into five mutually exclusive roles and keeps a
//! sorted name list per role, re-derived incrementally as signals arrive.
//! [`build_grouping_app`] wires the headless [`App`] whose chained `Update`
//! systems (drain → schedule → resolve → project) perform all mutation.

mod buckets;
pub mod grouping_config;
mod inspect;
mod layout;
pub mod metrics;
mod role_cache;
mod roles;
mod roster;
mod signals;
mod systems;

use std::sync::Arc;

use bevy::prelude::*;

pub use buckets::{Bucket, MembershipIndex};
pub use grouping_config::{
    load_grouping_config_from_env, GroupingConfig, GroupingConfigError, GroupingConfigHandle,
    UNITS_PER_COLUMN,
};
pub use inspect::{PendingInspections, RETRY_INTERVAL};
pub use layout::{LayoutDescriptor, LayoutGroup, LayoutState};
pub use metrics::GroupingMetrics;
pub use role_cache::RoleCache;
pub use roles::{
    class_default_role, resolve_role, spec_role, AssignedRole, Class, ResolveView, Role, SpecId,
    ALL_ROLES, ROLE_COUNT,
};
pub use roster::{MemberId, MemberState, Roster};
pub use signals::{GroupingHandle, HostEvent, RosterSignal};
pub use systems::DirtyRoster;

/// Construct a headless [`App`] with the grouping pipeline and return the
/// host-side channel handle. Configuration comes from the environment
/// (`GROUPING_CONFIG_PATH`) with builtin defaults as fallback.
pub fn build_grouping_app() -> (App, GroupingHandle) {
    build_grouping_app_with_config(load_grouping_config_from_env())
}

/// Construct the app with an explicit configuration.
pub fn build_grouping_app_with_config(config: Arc<GroupingConfig>) -> (App, GroupingHandle) {
    let mut app = App::new();
    let (feed, sink, handle) = signals::grouping_channels();

    app.insert_resource(GroupingConfigHandle::new(config))
        .insert_resource(feed)
        .insert_resource(sink)
        .insert_resource(Roster::default())
        .insert_resource(RoleCache::default())
        .insert_resource(MembershipIndex::default())
        .insert_resource(PendingInspections::default())
        .insert_resource(DirtyRoster::default())
        .insert_resource(LayoutState::default())
        .insert_resource(GroupingMetrics::default())
        .add_plugins(MinimalPlugins)
        .add_systems(
            Update,
            (
                systems::drain_signals,
                systems::schedule_inspections,
                systems::resolve_roles,
                systems::project_layout,
            )
                .chain(),
        );

    (app, handle)
}

/// Process all queued signals and re-derive the layout once.
pub fn pump(app: &mut App) {
    app.update();
}
