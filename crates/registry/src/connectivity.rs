// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness check seam (§3 `test_connectivity`). The real implementation
//! lives in `behemoth-agent` over the secure shell; kept as a trait here so
//! the registry can be tested without opening a socket.

use async_trait::async_trait;
use behemoth_core::Worker;

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_reachable(&self, worker: &Worker) -> bool;
}

/// Test double that reports a fixed, optionally per-worker, answer.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeProbe {
    unreachable: parking_lot::Mutex<std::collections::HashSet<behemoth_core::WorkerId>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeProbe {
    pub fn all_reachable() -> Self {
        Self { unreachable: parking_lot::Mutex::new(std::collections::HashSet::new()) }
    }

    pub fn mark_unreachable(&self, id: behemoth_core::WorkerId) {
        self.unreachable.lock().insert(id);
    }

    pub fn clear_unreachable(&self) {
        self.unreachable.lock().clear();
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn is_reachable(&self, worker: &Worker) -> bool {
        !self.unreachable.lock().contains(&worker.id)
    }
}
