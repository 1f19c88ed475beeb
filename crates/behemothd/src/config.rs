// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `behemothd`'s on-disk configuration (§1 ambient stack) and the fixed
//! topology it bootstraps the Control API with. Plan/Environment/Playback
//! management has no HTTP surface of its own (§1 Non-goals: persistence
//! schema/migrations beyond the two `CommandStore` backends are out of
//! scope), so this is the only way those entities enter a running server.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use behemoth_core::{Environment, Playback, Plan, Worker};
use serde::Deserialize;

/// Environment variable naming the config file path; falls back to
/// `/etc/behemoth/config.toml` when unset, matching the env-var-driven
/// resolution the rest of the stack uses for its own paths.
pub const CONFIG_PATH_VAR: &str = "BEHEMOTHD_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BehemothConfig {
    pub bind_addr: SocketAddr,
    /// Directory the Status Stream's per-task log files and uploaded blobs
    /// live under (§4.8, §6.1).
    pub log_dir: PathBuf,
    pub command_store: CommandStoreConfig,
    /// Secure-shell connect timeout (§5); overrides `behemoth_agent`'s
    /// default when set.
    pub ssh_connect_timeout_secs: u64,
    /// Participant count required to start a sync-plan batch (§5, §6.1).
    pub required_approvers: usize,
    /// Coordination window for sync-plan participants (§5).
    pub coordination_wait_timeout_secs: u64,
    /// Control-plane base URL the agent calls back to (§6.2 `host`).
    pub control_plane_host: String,
    pub org_id: String,
    /// Whether command bundles are AES-encrypted with `token[:32]` (§4.3, §6.2).
    pub encrypt_bundle: bool,
    /// Path to the local agent binary uploaded to workers (§4.3 step 1).
    pub local_binary_path: PathBuf,
    /// `account_ref` -> secure-shell credentials (§1 Non-goals: credential
    /// storage is an external collaborator; this is the minimal stand-in a
    /// real deployment replaces with its own vault lookup).
    pub credentials: HashMap<String, CredentialConfig>,
    /// The single statically configured invocation envelope applied to
    /// every execution (§1 Non-goals: dialect/target-connection resolution
    /// has no fields in the domain model to drive it from).
    pub envelope: EnvelopeConfig,
    pub topology: Topology,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum CommandStoreConfig {
    Memory,
    JsonFile { path: PathBuf },
}

impl Default for CommandStoreConfig {
    fn default() -> Self {
        CommandStoreConfig::Memory
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    pub cmd_type: EnvelopeCommandType,
    pub script: String,
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub db_name: Option<String>,
    pub privileged: Option<bool>,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            cmd_type: EnvelopeCommandType::Script,
            script: "script".to_string(),
            address: "127.0.0.1".to_string(),
            port: 22,
            username: String::new(),
            password: String::new(),
            db_name: None,
            privileged: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeCommandType {
    Mysql,
    Oracle,
    Script,
    LocalScript,
}

/// Entities bootstrapped into the server at startup (§1 Non-goals). Every
/// type here already round-trips through `serde`, so the config file
/// carries them verbatim rather than through a parallel DTO layer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Topology {
    pub workers: Vec<Worker>,
    pub environments: Vec<Environment>,
    pub plans: Vec<Plan>,
    pub playbacks: Vec<Playback>,
}

impl Default for BehemothConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            log_dir: PathBuf::from("/var/lib/behemoth/tasks"),
            command_store: CommandStoreConfig::default(),
            ssh_connect_timeout_secs: behemoth_agent::DEFAULT_CONNECT_TIMEOUT.as_secs(),
            required_approvers: behemoth_server::sync_coordination::DEFAULT_REQUIRED_APPROVERS,
            coordination_wait_timeout_secs: behemoth_server::sync_coordination::DEFAULT_WAIT_TIMEOUT.as_secs(),
            control_plane_host: "http://localhost:8080".to_string(),
            org_id: "default".to_string(),
            encrypt_bundle: true,
            local_binary_path: PathBuf::from("/usr/local/bin/behemoth-agent"),
            credentials: HashMap::new(),
            envelope: EnvelopeConfig::default(),
            topology: Topology::default(),
        }
    }
}

impl BehemothConfig {
    /// Load from `path`, or fall back to defaults (no topology, no
    /// workers) when the file does not exist — useful for a first run
    /// against a dev environment seeded entirely by hand.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Resolve the config path from [`CONFIG_PATH_VAR`] and load it.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "/etc/behemoth/config.toml".to_string());
        Self::load(path)
    }

    pub fn coordination_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.coordination_wait_timeout_secs)
    }

    pub fn ssh_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_connect_timeout_secs)
    }
}

impl From<EnvelopeCommandType> for behemoth_agent::CommandType {
    fn from(value: EnvelopeCommandType) -> Self {
        match value {
            EnvelopeCommandType::Mysql => behemoth_agent::CommandType::Mysql,
            EnvelopeCommandType::Oracle => behemoth_agent::CommandType::Oracle,
            EnvelopeCommandType::Script => behemoth_agent::CommandType::Script,
            EnvelopeCommandType::LocalScript => behemoth_agent::CommandType::LocalScript,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
