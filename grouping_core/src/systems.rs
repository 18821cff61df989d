//! Update pipeline: drain host signals, schedule inspections, resolve roles,
//! project the layout. The systems run chained on a single logical thread;
//! every mutation of the core's state happens inside this pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use bevy::prelude::{Res, ResMut, Resource, Time};

use crate::buckets::MembershipIndex;
use crate::grouping_config::GroupingConfigHandle;
use crate::inspect::PendingInspections;
use crate::layout::LayoutState;
use crate::metrics::GroupingMetrics;
use crate::role_cache::RoleCache;
use crate::roles::{resolve_role, ResolveView, ALL_ROLES};
use crate::roster::{MemberId, MemberState, Roster};
use crate::signals::{HostEvent, HostSink, RosterSignal, SignalFeed};

/// Members whose role inputs changed since the last resolution pass.
#[derive(Resource, Debug, Default)]
pub struct DirtyRoster {
    pub members: HashSet<MemberId>,
    /// When set, every member is re-resolved and every bucket's name
    /// sequence is rebuilt from its member set.
    pub resync: bool,
}

/// Apply a display-name change: store the new name and rebuild the member's
/// bucket from its member set. No-op when the name is unchanged or the
/// member is unknown.
fn apply_rename(
    member: MemberId,
    name: String,
    roster: &mut Roster,
    cache: &RoleCache,
    index: &mut MembershipIndex,
) {
    let role = cache.role_of(member);
    let renamed = match roster.get_mut(member) {
        Some(state) if state.name != name => {
            state.name = name;
            true
        }
        _ => false,
    };
    if renamed {
        if let Some(role) = role {
            index.rebuild(role, |m| roster.get(m).map(|s| s.name.as_str()));
        }
    }
}

fn request_inspection(
    member: MemberId,
    pending: &mut PendingInspections,
    sink: &HostSink,
    metrics: &mut GroupingMetrics,
) {
    sink.emit(HostEvent::InspectRequest { member });
    pending.note_attempt(member);
    metrics.inspect_requests += 1;
}

/// Drain the inbound signal channel and apply each notification to the
/// roster, caches, and pending set.
#[allow(clippy::too_many_arguments)]
pub fn drain_signals(
    feed: Res<SignalFeed>,
    sink: Res<HostSink>,
    mut roster: ResMut<Roster>,
    mut cache: ResMut<RoleCache>,
    mut index: ResMut<MembershipIndex>,
    mut pending: ResMut<PendingInspections>,
    mut dirty: ResMut<DirtyRoster>,
    mut config: ResMut<GroupingConfigHandle>,
    mut metrics: ResMut<GroupingMetrics>,
) {
    while let Ok(signal) = feed.0.try_recv() {
        match signal {
            RosterSignal::Joined { member, name, pet } => {
                tracing::debug!(target: "role_grid::roster", %member, %name, pet, "roster.joined");
                if roster.contains(member) {
                    // Re-observing a known id must not reset cached
                    // attributes; at most the display name changed.
                    apply_rename(member, name, &mut roster, &cache, &mut index);
                    continue;
                }
                roster.insert(member, MemberState::new(name, pet));
                dirty.members.insert(member);
                // Pets resolve without specialization data.
                if !pet && pending.enqueue(member) && !pending.is_suspended() {
                    request_inspection(member, &mut pending, &sink, &mut metrics);
                }
            }
            RosterSignal::Left { member } => {
                tracing::debug!(target: "role_grid::roster", %member, "roster.left");
                pending.cancel(member);
                dirty.members.remove(&member);
                if let Some(state) = roster.remove(member) {
                    index.remove(member, &state.name, cache.role_of(member));
                }
                cache.purge(member);
            }
            RosterSignal::NameResolved { member, name } => {
                apply_rename(member, name, &mut roster, &cache, &mut index);
            }
            RosterSignal::ClassKnown { member, class } => {
                if let Some(state) = roster.get_mut(member) {
                    if state.class.is_none() {
                        state.class = Some(class);
                        dirty.members.insert(member);
                    }
                }
            }
            RosterSignal::SpecInfo { member, spec } => {
                if !roster.contains(member) || !pending.is_pending(member) {
                    tracing::debug!(target: "role_grid::inspect", %member, "spec_info.stale_discarded");
                    continue;
                }
                // A response with no usable data leaves the member pending
                // for the next retry pass.
                let Some(spec) = spec else { continue };
                pending.complete(member);
                if let Some(state) = roster.get_mut(member) {
                    state.spec = Some(spec);
                }
                dirty.members.insert(member);
            }
            RosterSignal::SpecInvalidated { member } => {
                let inspectable = roster.get(member).map(|s| !s.pet).unwrap_or(false);
                if inspectable && pending.enqueue(member) && !pending.is_suspended() {
                    request_inspection(member, &mut pending, &sink, &mut metrics);
                }
            }
            RosterSignal::Assigned { member, role } => {
                if roster.contains(member) && cache.update_assigned(member, role) {
                    dirty.members.insert(member);
                }
            }
            RosterSignal::ConnectionChanged { member, connected } => {
                let needs_inspection = match roster.get_mut(member) {
                    Some(state) => {
                        state.connected = connected;
                        connected && !state.pet && state.spec.is_none()
                    }
                    None => false,
                };
                if needs_inspection && pending.enqueue(member) && !pending.is_suspended() {
                    request_inspection(member, &mut pending, &sink, &mut metrics);
                }
            }
            RosterSignal::Lockdown { active } => {
                tracing::debug!(target: "role_grid::inspect", active, "lockdown");
                roster.lockdown = active;
                if active {
                    pending.suspend();
                } else if pending.resume() {
                    // Re-process everything still pending now that requests
                    // are allowed again.
                    for member in pending.members() {
                        request_inspection(member, &mut pending, &sink, &mut metrics);
                    }
                }
            }
            RosterSignal::PartySize {
                members,
                instance_cap,
            } => {
                roster.party_size = members;
                roster.instance_cap = instance_cap;
            }
            RosterSignal::Resync => {
                dirty.resync = true;
            }
            RosterSignal::ConfigUpdated(new_config) => {
                tracing::info!(target: "role_grid::config", "grouping_config.replaced");
                config.replace(Arc::new(new_config));
                // The projector diffs the recomputed descriptor against the
                // previous one, so an edit with identical content stays
                // suppressed.
                dirty.resync = true;
            }
        }
    }
}

/// Tick the retry timer; on each firing, prune unreachable members and
/// re-issue requests for the rest.
pub fn schedule_inspections(
    time: Res<Time>,
    roster: Res<Roster>,
    sink: Res<HostSink>,
    mut pending: ResMut<PendingInspections>,
    mut metrics: ResMut<GroupingMetrics>,
) {
    if !pending.tick(time.delta()) {
        return;
    }

    let pruned = pending.prune(|member| {
        roster
            .get(member)
            .map(|state| state.connected)
            .unwrap_or(false)
    });
    if !pruned.is_empty() {
        metrics.pruned += pruned.len() as u64;
        tracing::debug!(target: "role_grid::inspect", count = pruned.len(), "pending.pruned");
    }

    for member in pending.members() {
        request_inspection(member, &mut pending, &sink, &mut metrics);
    }
}

/// Re-resolve roles for dirty members and re-bucket on transition.
pub fn resolve_roles(
    roster: Res<Roster>,
    config: Res<GroupingConfigHandle>,
    mut dirty: ResMut<DirtyRoster>,
    mut cache: ResMut<RoleCache>,
    mut index: ResMut<MembershipIndex>,
    mut metrics: ResMut<GroupingMetrics>,
) {
    if dirty.members.is_empty() && !dirty.resync {
        return;
    }
    let config = config.get();
    let resync = dirty.resync;
    dirty.resync = false;

    let targets: Vec<MemberId> = if resync {
        dirty.members.clear();
        roster.iter().map(|(member, _)| member).collect()
    } else {
        dirty.members.drain().collect()
    };

    for member in targets {
        let Some(state) = roster.get(member) else {
            continue;
        };
        let view = ResolveView {
            pet: state.pet,
            class: state.class,
            spec: state.spec,
            assigned: cache.assigned_of(member),
        };
        let role = resolve_role(&view, &config);
        metrics.resolves += 1;

        let old = cache.role_of(member);
        if cache.update_role(member, role) {
            index.rebucket(member, &state.name, old, role);
            metrics.role_transitions += 1;
            tracing::debug!(target: "role_grid::resolve", %member, %role, "role.transition");
        }
    }

    if resync {
        for role in ALL_ROLES {
            index.rebuild(role, |m| roster.get(m).map(|s| s.name.as_str()));
        }
    }
}

/// Project buckets into the layout descriptor; notify the host only when
/// the projected content actually changed.
pub fn project_layout(
    index: Res<MembershipIndex>,
    roster: Res<Roster>,
    config: Res<GroupingConfigHandle>,
    sink: Res<HostSink>,
    mut layout: ResMut<LayoutState>,
    mut metrics: ResMut<GroupingMetrics>,
) {
    if layout.project(&index, &roster, &config.get()) {
        metrics.layout_reloads += 1;
        if let Some(descriptor) = layout.descriptor() {
            tracing::info!(
                target: "role_grid::layout",
                groups = descriptor.groups.len(),
                max_columns = descriptor.max_columns,
                "layout.changed"
            );
            sink.emit(HostEvent::LayoutChanged(descriptor.clone()));
        }
    } else {
        metrics.suppressed_reloads += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping_config::GroupingConfig;
    use crate::inspect::RETRY_INTERVAL;
    use crate::roles::{Class, Role, SpecId};
    use crate::signals::{grouping_channels, GroupingHandle};
    use bevy::prelude::{Time, World};
    use bevy_ecs::system::RunSystemOnce;

    fn test_world() -> (World, GroupingHandle) {
        let mut world = World::default();
        let (feed, sink, handle) = grouping_channels();
        world.insert_resource(feed);
        world.insert_resource(sink);
        world.insert_resource(Roster::default());
        world.insert_resource(RoleCache::default());
        world.insert_resource(MembershipIndex::default());
        world.insert_resource(PendingInspections::default());
        world.insert_resource(DirtyRoster::default());
        world.insert_resource(LayoutState::default());
        world.insert_resource(GroupingMetrics::default());
        world.insert_resource(GroupingConfigHandle::new(Arc::new(GroupingConfig::default())));
        (world, handle)
    }

    #[test]
    fn stale_spec_info_is_discarded() {
        let (mut world, handle) = test_world();
        handle
            .signals
            .send(RosterSignal::SpecInfo {
                member: MemberId(99),
                spec: Some(SpecId(73)),
            })
            .unwrap();
        world.run_system_once(drain_signals);
        assert!(world.resource::<Roster>().is_empty());
        assert!(world.resource::<PendingInspections>().is_empty());
    }

    #[test]
    fn departure_purges_all_bookkeeping() {
        let (mut world, handle) = test_world();
        handle
            .signals
            .send(RosterSignal::Joined {
                member: MemberId(1),
                name: "Ana".into(),
                pet: false,
            })
            .unwrap();
        world.run_system_once(drain_signals);
        world.run_system_once(resolve_roles);
        assert_eq!(world.resource::<MembershipIndex>().total_members(), 1);
        assert!(world.resource::<PendingInspections>().is_pending(MemberId(1)));

        handle
            .signals
            .send(RosterSignal::Left { member: MemberId(1) })
            .unwrap();
        world.run_system_once(drain_signals);

        assert!(world.resource::<Roster>().is_empty());
        assert!(world.resource::<RoleCache>().is_empty());
        assert!(world.resource::<PendingInspections>().is_empty());
        assert!(!world.resource::<PendingInspections>().timer_active());
        assert_eq!(world.resource::<MembershipIndex>().total_members(), 0);
    }

    #[test]
    fn spec_info_without_data_keeps_member_pending() {
        let (mut world, handle) = test_world();
        handle
            .signals
            .send(RosterSignal::Joined {
                member: MemberId(2),
                name: "Bo".into(),
                pet: false,
            })
            .unwrap();
        handle
            .signals
            .send(RosterSignal::SpecInfo {
                member: MemberId(2),
                spec: None,
            })
            .unwrap();
        world.run_system_once(drain_signals);
        assert!(world.resource::<PendingInspections>().is_pending(MemberId(2)));
    }

    #[test]
    fn retry_pass_reissues_requests_and_prunes_disconnected() {
        let (mut world, handle) = test_world();
        for (id, name) in [(1u64, "Ana"), (2, "Bo")] {
            handle
                .signals
                .send(RosterSignal::Joined {
                    member: MemberId(id),
                    name: name.into(),
                    pet: false,
                })
                .unwrap();
        }
        handle
            .signals
            .send(RosterSignal::ConnectionChanged {
                member: MemberId(2),
                connected: false,
            })
            .unwrap();
        world.run_system_once(drain_signals);
        // Discard the initial requests issued at enqueue time.
        while handle.events.try_recv().is_ok() {}

        let mut time = Time::<()>::default();
        time.advance_by(RETRY_INTERVAL);
        world.insert_resource(time);
        world.run_system_once(schedule_inspections);

        let mut reissued = Vec::new();
        while let Ok(event) = handle.events.try_recv() {
            if let HostEvent::InspectRequest { member } = event {
                reissued.push(member);
            }
        }
        assert_eq!(reissued, vec![MemberId(1)]);

        let pending = world.resource::<PendingInspections>();
        assert!(pending.is_pending(MemberId(1)));
        assert!(!pending.is_pending(MemberId(2)));
        assert_eq!(world.resource::<GroupingMetrics>().pruned, 1);
    }

    #[test]
    fn duplicate_join_keeps_attributes_and_renames() {
        let (mut world, handle) = test_world();
        handle
            .signals
            .send(RosterSignal::Joined {
                member: MemberId(1),
                name: "Solvei".into(),
                pet: false,
            })
            .unwrap();
        handle
            .signals
            .send(RosterSignal::ClassKnown {
                member: MemberId(1),
                class: Class::Warrior,
            })
            .unwrap();
        handle
            .signals
            .send(RosterSignal::SpecInfo {
                member: MemberId(1),
                spec: Some(SpecId(73)),
            })
            .unwrap();
        world.run_system_once(drain_signals);
        world.run_system_once(resolve_roles);
        assert_eq!(
            world.resource::<MembershipIndex>().name_list(Role::Tank),
            "Solvei"
        );

        // The roster provider reports the same id again under a corrected
        // name.
        handle
            .signals
            .send(RosterSignal::Joined {
                member: MemberId(1),
                name: "Solveig".into(),
                pet: false,
            })
            .unwrap();
        world.run_system_once(drain_signals);

        let roster = world.resource::<Roster>();
        let state = roster.get(MemberId(1)).unwrap();
        assert_eq!(state.class, Some(Class::Warrior));
        assert_eq!(state.spec, Some(SpecId(73)));

        let index = world.resource::<MembershipIndex>();
        assert_eq!(index.name_list(Role::Tank), "Solveig");
        assert_eq!(index.total_members(), 1);
        assert!(world.resource::<PendingInspections>().is_empty());
    }

    #[test]
    fn rename_rebuilds_the_buckets_name_sequence() {
        let (mut world, handle) = test_world();
        for (id, name) in [(1u64, "Unknown"), (2, "Bea")] {
            handle
                .signals
                .send(RosterSignal::Joined {
                    member: MemberId(id),
                    name: name.into(),
                    pet: false,
                })
                .unwrap();
        }
        world.run_system_once(drain_signals);
        world.run_system_once(resolve_roles);

        handle
            .signals
            .send(RosterSignal::NameResolved {
                member: MemberId(1),
                name: "Ann".into(),
            })
            .unwrap();
        world.run_system_once(drain_signals);

        let index = world.resource::<MembershipIndex>();
        assert_eq!(index.name_list(Role::Ranged), "Ann,Bea");
    }
}
