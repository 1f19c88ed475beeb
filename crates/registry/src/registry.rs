// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Registry (§3, §4.1) — tracks which workers are known, picks one
//! for an execution by label affinity, and quarantines workers that fail a
//! liveness check.
//!
//! Grounded on the original system's `WorkerPool`: workers are bucketed by
//! label, selection picks the closest label bucket by string similarity
//! (here `strsim::jaro_winkler`, see §9), and a worker found unreachable at
//! selection time is quarantined and skipped in favor of the next-best
//! candidate (§4.1's liveness loop) rather than failing the whole acquire on
//! one bad worker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use behemoth_core::{Clock, Execution, ExecutionId, Worker, WorkerId};
use parking_lot::RwLock;

use crate::connectivity::ConnectivityProbe;
use crate::error::RegistryError;

/// How long a worker that failed a liveness check stays quarantined before
/// it is eligible for selection again (§3).
pub const DIRTY_TTL: Duration = Duration::from_secs(24 * 3600);

#[derive(Default)]
struct Inner {
    by_label: HashMap<String, HashMap<WorkerId, Worker>>,
    default_bucket: HashMap<WorkerId, Worker>,
    running: HashMap<ExecutionId, WorkerId>,
    dirty: HashMap<WorkerId, Instant>,
}

impl Inner {
    fn remove_from_buckets(&mut self, worker: &Worker) {
        if worker.labels().is_empty() {
            self.default_bucket.remove(&worker.id);
        } else {
            for label in worker.labels() {
                if let Some(bucket) = self.by_label.get_mut(label) {
                    bucket.remove(&worker.id);
                }
            }
        }
    }

    fn insert_into_buckets(&mut self, worker: Worker) {
        if worker.labels().is_empty() {
            self.default_bucket.insert(worker.id.clone(), worker);
        } else {
            for label in &worker.labels {
                self.by_label.entry(label.clone()).or_default().insert(worker.id.clone(), worker.clone());
            }
        }
    }

    /// Drop quarantine entries older than [`DIRTY_TTL`], making those
    /// workers eligible for selection again.
    fn prune_expired_dirty(&mut self, now: Instant) {
        self.dirty.retain(|_, marked_at| now.duration_since(*marked_at) < DIRTY_TTL);
    }

    /// Pick one worker closest to `label_hint`, falling back to the
    /// unlabeled default bucket. Does not remove the worker from its bucket.
    fn select(&mut self, label_hint: Option<&str>, now: Instant) -> Option<Worker> {
        self.prune_expired_dirty(now);

        let candidate = match label_hint {
            None => None,
            Some(hint) => {
                let mut best: Option<(f64, String)> = None;
                for label in self.by_label.keys() {
                    let ratio = strsim::jaro_winkler(hint, label);
                    let is_better = match &best {
                        None => true,
                        Some((b, _)) => ratio > *b,
                    };
                    if is_better {
                        best = Some((ratio, label.clone()));
                    }
                }
                best.and_then(|(_, label)| {
                    self.by_label
                        .get(&label)
                        .and_then(|bucket| bucket.values().find(|w| !self.dirty.contains_key(&w.id)))
                        .cloned()
                })
            }
        };

        candidate.or_else(|| {
            self.default_bucket.values().find(|w| !self.dirty.contains_key(&w.id)).cloned()
        })
    }
}

/// Registry of known workers, scoped to a single tenant's view by the
/// caller (tenants never share worker pools, §3).
pub struct WorkerRegistry<C: Clock> {
    clock: C,
    probe: Arc<dyn ConnectivityProbe>,
    inner: RwLock<Inner>,
}

impl<C: Clock> WorkerRegistry<C> {
    pub fn new(clock: C, probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self { clock, probe, inner: RwLock::new(Inner::default()) }
    }

    pub fn add_worker(&self, worker: Worker) {
        let labels = worker.labels().to_vec();
        tracing::debug!(worker = %worker.id, labels = ?labels, "add worker");
        self.inner.write().insert_into_buckets(worker);
    }

    pub fn remove_worker(&self, worker: &Worker) {
        self.inner.write().remove_from_buckets(worker);
    }

    pub fn worker_count(&self) -> usize {
        let inner = self.inner.read();
        inner.default_bucket.len()
            + inner.by_label.values().map(|b| b.len()).sum::<usize>()
    }

    /// Select and validate a worker for `execution`, per §3/§4.1.
    ///
    /// A worker found unreachable is logged, quarantined, and skipped: the
    /// loop selects the next-best remaining candidate instead of failing
    /// the whole acquire on one bad worker (§4.1 "on failure, log, discard
    /// that worker, and loop"). Only once selection has no candidate left
    /// does this surface [`RegistryError::NoWorkerAvailable`] to the caller.
    pub async fn acquire(&self, execution: &Execution) -> Result<Worker, RegistryError> {
        let label_hint = execution.worker_label_hint.as_deref();

        loop {
            let now = self.clock.now();
            let candidate = {
                let mut inner = self.inner.write();
                let worker = inner.select(label_hint, now);
                if let Some(worker) = &worker {
                    inner.remove_from_buckets(worker);
                }
                worker
            };

            let worker = candidate.ok_or(RegistryError::NoWorkerAvailable)?;

            if self.probe.is_reachable(&worker).await {
                let mut inner = self.inner.write();
                inner.insert_into_buckets(worker.clone());
                inner.running.insert(execution.id.clone(), worker.id.clone());
                return Ok(worker);
            }

            tracing::warn!(worker = %worker.id, "worker failed liveness probe, quarantining and trying next candidate");
            let mut inner = self.inner.write();
            inner.dirty.insert(worker.id.clone(), now);
            // Stays a known worker, just excluded from selection while dirty
            // (see `select`'s dirty filter) so it's retried once the
            // quarantine expires instead of being forgotten.
            inner.insert_into_buckets(worker.clone());
        }
    }

    pub fn release(&self, execution_id: &ExecutionId) {
        self.inner.write().running.remove(execution_id);
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
