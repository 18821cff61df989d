//! Counters describing the core's activity, for host diagnostics.

use bevy::prelude::Resource;

#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct GroupingMetrics {
    /// Role resolutions performed.
    pub resolves: u64,
    /// Resolutions that changed the stored role (re-buckets).
    pub role_transitions: u64,
    /// Inspection requests emitted, initial and retried.
    pub inspect_requests: u64,
    /// Pending entries dropped because the member became unreachable.
    pub pruned: u64,
    /// Layout reloads signalled to the host.
    pub layout_reloads: u64,
    /// Projections that produced no change and were suppressed.
    pub suppressed_reloads: u64,
}
