// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker entity (§3) — a remote host that hosts the agent.

use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a worker host.
    pub struct WorkerId("wkr-");
}

/// Base platform a worker runs, used to pick the agent binary (§4.3, §6.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPlatform {
    Linux,
    Mac,
    Windows,
}

crate::simple_display! {
    WorkerPlatform {
        Linux => "linux",
        Mac => "mac",
        Windows => "windows",
    }
}

/// A remote host that can execute a plan's commands via the agent protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub tenant_id: TenantId,
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Account reference used to authenticate the secure-shell session.
    /// Resolution of credentials from this reference is an external
    /// collaborator (§1 Non-goals); here it is just an opaque string.
    pub account_ref: String,
    pub platform: WorkerPlatform,
    /// Labels this worker advertises (§4.1 label-affinity selection).
    pub labels: Vec<String>,
    /// Environment variables injected at agent invocation (§3, §6.2 `envs`).
    pub env: HashMap<String, String>,
}

crate::builder! {
    pub struct WorkerBuilder => Worker {
        into {
            name: String = "worker-1",
            host: String = "10.0.0.1",
            account_ref: String = "acct-1",
        }
        set {
            tenant_id: TenantId = TenantId::new("default"),
            port: u16 = 22,
            platform: WorkerPlatform = WorkerPlatform::Linux,
            labels: Vec<String> = Vec::new(),
            env: HashMap<String, String> = HashMap::new(),
        }
        computed {
            id: WorkerId = WorkerId::new(),
        }
    }
}

impl Worker {
    /// Labels this worker belongs to, or an empty slice for the default bucket.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
