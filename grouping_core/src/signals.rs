//! Channel boundary between the grouping core and its host.
//!
//! Collaborators (roster provider, attribute provider, role authority,
//! configuration store) push [`RosterSignal`] values into the inbound
//! channel; the core drains it once per update. Outbound, the core emits
//! [`HostEvent`] values: inspection requests for the attribute provider and
//! layout descriptors for the layout engine.

use bevy::prelude::Resource;
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::grouping_config::GroupingConfig;
use crate::layout::LayoutDescriptor;
use crate::roles::{AssignedRole, Class, SpecId};
use crate::roster::MemberId;

/// Inbound notifications from the external collaborators.
#[derive(Debug, Clone)]
pub enum RosterSignal {
    /// A member was observed joining the roster.
    Joined {
        member: MemberId,
        name: String,
        pet: bool,
    },
    /// A member left the roster. Cancels any pending inspection.
    Left { member: MemberId },
    /// Late display-name resolution for an already-known member.
    NameResolved { member: MemberId, name: String },
    /// Class became known (immutable once set).
    ClassKnown { member: MemberId, class: Class },
    /// Inspection completed; `None` when the provider reported no usable
    /// specialization. Stale responses are discarded by the core.
    SpecInfo {
        member: MemberId,
        spec: Option<SpecId>,
    },
    /// A specialization-relevant change invalidated the cached data; the
    /// member re-enters the pending set.
    SpecInvalidated { member: MemberId },
    /// External authority (re)assigned a coarse role.
    Assigned {
        member: MemberId,
        role: AssignedRole,
    },
    /// Connection status changed; disconnected members are pruned from the
    /// pending set on the next retry pass.
    ConnectionChanged { member: MemberId, connected: bool },
    /// Inspection lockdown toggled (combat analog).
    Lockdown { active: bool },
    /// Group-size and instance-capacity facts.
    PartySize {
        members: u32,
        instance_cap: Option<u32>,
    },
    /// Full roster resync: rebuild every bucket's name sequence.
    Resync,
    /// User edited the configuration; triggers full recomputation.
    ConfigUpdated(GroupingConfig),
}

/// Outbound events consumed by the host.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// Ask the attribute provider to inspect a member. May be emitted
    /// repeatedly for the same member until data arrives.
    InspectRequest { member: MemberId },
    /// The projected layout actually changed; the layout engine should
    /// reload from the attached descriptor.
    LayoutChanged(LayoutDescriptor),
}

/// World-side receiving end of the inbound signal channel.
#[derive(Resource)]
pub struct SignalFeed(pub Receiver<RosterSignal>);

/// World-side sending end of the outbound event channel.
#[derive(Resource)]
pub struct HostSink(pub Sender<HostEvent>);

impl HostSink {
    /// Send without surfacing errors: a host that dropped its receiver just
    /// stops observing events.
    pub fn emit(&self, event: HostEvent) {
        if self.0.send(event).is_err() {
            tracing::debug!(target: "role_grid::signals", "host_event.dropped=receiver_gone");
        }
    }
}

/// Host-side endpoints, returned from [`crate::build_grouping_app`].
pub struct GroupingHandle {
    pub signals: Sender<RosterSignal>,
    pub events: Receiver<HostEvent>,
}

/// Create the paired channel resources and the host handle.
pub fn grouping_channels() -> (SignalFeed, HostSink, GroupingHandle) {
    let (signal_tx, signal_rx) = unbounded();
    let (event_tx, event_rx) = unbounded();
    (
        SignalFeed(signal_rx),
        HostSink(event_tx),
        GroupingHandle {
            signals: signal_tx,
            events: event_rx,
        },
    )
}
