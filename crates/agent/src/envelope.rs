// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent Invocation Envelope (§6.2): the base64-encoded JSON object passed
//! to the remote binary via `--command`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use crate::error::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    Mysql,
    Oracle,
    Script,
    LocalScript,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthParams {
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
}

/// The envelope passed to `<remote-binary> --command <base64>` (§6.2).
#[derive(Debug, Clone, Serialize)]
pub struct AgentEnvelope {
    pub host: String,
    pub token: String,
    pub task_id: String,
    pub org_id: String,
    pub cmd_type: CommandType,
    pub script: String,
    pub cmd_set_filepath: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd_file: Option<String>,
    pub auth: AuthParams,
    pub encrypted_data: bool,
    pub envs: String,
}

impl AgentEnvelope {
    /// Base64-encode the envelope's JSON form, as passed on the remote
    /// binary's command line.
    pub fn to_base64(&self) -> Result<String, AgentError> {
        let json = serde_json::to_vec(self)?;
        Ok(BASE64.encode(json))
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
