//! Inspection queue: bookkeeping for members awaiting asynchronous
//! specialization data.
//!
//! Per-member state machine: unknown → pending → resolved, with re-entry to
//! pending when a specialization-relevant change invalidates cached data.
//! The retry timer exists only while the pending set is non-empty and the
//! scheduler is not suspended, so an idle core schedules no periodic work.

use std::collections::HashMap;
use std::time::Duration;

use bevy::prelude::{Resource, Timer, TimerMode};

use crate::roster::MemberId;

/// Cadence of the retry pass while members are pending.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Default)]
pub struct PendingEntry {
    /// Requests issued so far, for diagnostics. Retries are unbounded in
    /// time; entries leave the set on success, departure, or prune.
    pub attempts: u32,
}

/// The pending inspection set and its lazily created retry timer.
#[derive(Resource, Debug, Default)]
pub struct PendingInspections {
    pending: HashMap<MemberId, PendingEntry>,
    timer: Option<Timer>,
    suspended: bool,
}

impl PendingInspections {
    /// Add a member to the pending set. Returns `true` when the member was
    /// not already pending; the caller issues the initial request.
    pub fn enqueue(&mut self, member: MemberId) -> bool {
        let newly = self
            .pending
            .insert(member, PendingEntry::default())
            .is_none();
        if newly {
            self.ensure_timer();
        }
        newly
    }

    /// Specialization data arrived. Returns `true` when the member was
    /// actually pending; stale completions report `false` and are discarded
    /// by the caller.
    pub fn complete(&mut self, member: MemberId) -> bool {
        let was_pending = self.pending.remove(&member).is_some();
        if self.pending.is_empty() {
            self.timer = None;
        }
        was_pending
    }

    /// Cancel bookkeeping for a departing member.
    pub fn cancel(&mut self, member: MemberId) {
        self.complete(member);
    }

    /// Pause request issuing and the retry timer (lockdown).
    pub fn suspend(&mut self) {
        self.suspended = true;
        self.timer = None;
    }

    /// Lift the suspension. Returns `true` when pending members remain and
    /// need an immediate re-processing pass.
    pub fn resume(&mut self) -> bool {
        self.suspended = false;
        self.ensure_timer();
        !self.pending.is_empty()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_pending(&self, member: MemberId) -> bool {
        self.pending.contains_key(&member)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// True while the repeating retry timer is scheduled.
    pub fn timer_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Advance the retry timer. Returns `true` when a retry pass should run.
    pub fn tick(&mut self, delta: Duration) -> bool {
        if self.suspended {
            return false;
        }
        match self.timer.as_mut() {
            Some(timer) => timer.tick(delta).just_finished(),
            None => false,
        }
    }

    /// Record one more attempt for a still-pending member.
    pub fn note_attempt(&mut self, member: MemberId) {
        if let Some(entry) = self.pending.get_mut(&member) {
            entry.attempts += 1;
        }
    }

    /// Drop pending entries rejected by `keep` (departed or unreachable
    /// members). Returns the pruned ids.
    pub fn prune(&mut self, keep: impl Fn(MemberId) -> bool) -> Vec<MemberId> {
        let pruned: Vec<MemberId> = self
            .pending
            .keys()
            .copied()
            .filter(|&m| !keep(m))
            .collect();
        for member in &pruned {
            self.pending.remove(member);
        }
        if self.pending.is_empty() {
            self.timer = None;
        }
        pruned
    }

    pub fn members(&self) -> Vec<MemberId> {
        self.pending.keys().copied().collect()
    }

    fn ensure_timer(&mut self) {
        if !self.suspended && !self.pending.is_empty() && self.timer.is_none() {
            self.timer = Some(Timer::new(RETRY_INTERVAL, TimerMode::Repeating));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_starts_lazily_and_stops_when_empty() {
        let mut queue = PendingInspections::default();
        assert!(!queue.timer_active());

        assert!(queue.enqueue(MemberId(1)));
        assert!(queue.timer_active());
        assert!(!queue.enqueue(MemberId(1)));

        assert!(queue.complete(MemberId(1)));
        assert!(!queue.timer_active());
        assert!(queue.is_empty());
    }

    #[test]
    fn stale_completion_reports_false() {
        let mut queue = PendingInspections::default();
        assert!(!queue.complete(MemberId(42)));
    }

    #[test]
    fn tick_fires_at_the_retry_interval() {
        let mut queue = PendingInspections::default();
        queue.enqueue(MemberId(1));
        assert!(!queue.tick(Duration::from_millis(100)));
        assert!(queue.tick(Duration::from_millis(150)));
        // Repeating timer fires again a full interval later.
        assert!(!queue.tick(Duration::from_millis(100)));
        assert!(queue.tick(Duration::from_millis(150)));
    }

    #[test]
    fn suspension_pauses_ticks_and_resume_restarts() {
        let mut queue = PendingInspections::default();
        queue.enqueue(MemberId(1));
        queue.suspend();
        assert!(!queue.timer_active());
        assert!(!queue.tick(Duration::from_secs(10)));

        assert!(queue.resume());
        assert!(queue.timer_active());
        assert!(queue.tick(RETRY_INTERVAL));
    }

    #[test]
    fn resume_with_nothing_pending_schedules_no_timer() {
        let mut queue = PendingInspections::default();
        queue.suspend();
        assert!(!queue.resume());
        assert!(!queue.timer_active());
    }

    #[test]
    fn prune_drops_rejected_members_and_stops_timer() {
        let mut queue = PendingInspections::default();
        queue.enqueue(MemberId(1));
        queue.enqueue(MemberId(2));
        let pruned = queue.prune(|m| m == MemberId(2));
        assert_eq!(pruned, vec![MemberId(1)]);
        assert!(queue.is_pending(MemberId(2)));
        assert!(queue.timer_active());

        let pruned = queue.prune(|_| false);
        assert_eq!(pruned, vec![MemberId(2)]);
        assert!(!queue.timer_active());
    }
}
