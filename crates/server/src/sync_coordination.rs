// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync-plan participant coordination (§6.1 `start-sync-task`, §5 "Coordination
//! wait for sync-plan participants"). Callers accumulate into a pending set
//! keyed by plan; once `required_approvers` distinct identities have joined
//! within `wait_timeout` of the first, the batch is ready to start.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use behemoth_core::{Clock, PlanId};
use parking_lot::RwLock;

/// Default participant count required to start a sync-plan batch (§5).
pub const DEFAULT_REQUIRED_APPROVERS: usize = 2;
/// Default coordination window (§5).
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(3600);

struct Pending {
    users: Vec<String>,
    started_at: Instant,
}

/// Outcome of one participant joining the pending set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approval {
    /// Enough distinct participants have joined; the batch may start.
    Ready { users: Vec<String> },
    /// Still waiting on more participants.
    Pending { ttl: Duration, participants: usize, users: Vec<String>, wait_timeout: Duration },
}

pub struct SyncCoordinator<C: Clock> {
    clock: C,
    required_approvers: usize,
    wait_timeout: Duration,
    pending: RwLock<HashMap<PlanId, Pending>>,
}

impl<C: Clock> SyncCoordinator<C> {
    pub fn new(clock: C, required_approvers: usize, wait_timeout: Duration) -> Self {
        Self { clock, required_approvers, wait_timeout, pending: RwLock::new(HashMap::new()) }
    }

    /// Join `identity` into `plan_id`'s pending set, per §6.1. A set whose
    /// window has elapsed since its first join is reset rather than topped
    /// up, matching "otherwise the pending set TTL resets on each new
    /// approval" (§5) — a stale window never silently accumulates with a
    /// fresh one.
    pub fn join(&self, plan_id: PlanId, identity: String) -> Approval {
        let now = self.clock.now();
        let mut pending = self.pending.write();
        let entry = pending.entry(plan_id.clone()).or_insert_with(|| Pending { users: Vec::new(), started_at: now });

        if now.duration_since(entry.started_at) > self.wait_timeout {
            entry.users.clear();
            entry.started_at = now;
        }
        if !entry.users.contains(&identity) {
            entry.users.push(identity);
        }

        if entry.users.len() >= self.required_approvers {
            let users = entry.users.clone();
            pending.remove(&plan_id);
            Approval::Ready { users }
        } else {
            Approval::Pending {
                ttl: self.wait_timeout.saturating_sub(now.duration_since(entry.started_at)),
                participants: entry.users.len(),
                users: entry.users.clone(),
                wait_timeout: self.wait_timeout,
            }
        }
    }
}

#[cfg(test)]
#[path = "sync_coordination_tests.rs"]
mod tests;
