// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-side settings resolved from `behemothd`'s `BehemothConfig` (§1
//! ambient stack). Kept as a plain struct with a `Default` impl, matching
//! the teacher's small per-module `Config` types.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::sync_coordination::{DEFAULT_REQUIRED_APPROVERS, DEFAULT_WAIT_TIMEOUT};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory the Status Stream's per-task log files live under (§4.8).
    pub log_dir: PathBuf,
    /// Participant count required to start a sync-plan batch (§5, §6.1).
    pub required_approvers: usize,
    /// Coordination window for sync-plan participants (§5).
    pub coordination_wait_timeout: Duration,
    /// Control-plane base URL the agent calls back to (§6.2 `host`).
    pub control_plane_host: String,
    pub org_id: String,
    /// Whether command bundles are AES-encrypted with `token[:32]` (§4.3, §6.2).
    pub encrypt_bundle: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            log_dir: PathBuf::from("/var/lib/behemoth/tasks"),
            required_approvers: DEFAULT_REQUIRED_APPROVERS,
            coordination_wait_timeout: DEFAULT_WAIT_TIMEOUT,
            control_plane_host: "http://localhost:8080".to_string(),
            org_id: "default".to_string(),
            encrypt_bundle: true,
        }
    }
}
