// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command bundle materialization (§4.3 step 2): the execution's remaining
//! (non-success) commands as a newline-delimited JSON file, optionally
//! AES-CBC encrypted before upload.

use behemoth_core::{Command, CommandStatus, ExecutionId};
use serde::Serialize;

use crate::crypto;
use crate::error::AgentError;

#[derive(Serialize)]
struct BundledCommand<'a> {
    id: &'a str,
    sequence: u32,
    body: &'a str,
}

/// Build the JSONL bundle body for every command not already `succeeded`.
pub fn build(commands: &[Command]) -> Vec<u8> {
    let mut out = Vec::new();
    for command in commands.iter().filter(|c| c.status != CommandStatus::Succeeded) {
        let line = BundledCommand {
            id: command.id.as_str(),
            sequence: command.sequence,
            body: &command.body,
        };
        serde_json::to_writer(&mut out, &line).expect("BundledCommand serializes infallibly");
        out.push(b'\n');
    }
    out
}

/// Build the bundle and, if `token` is `Some`, encrypt it with the first
/// 32 bytes of the token (§4.3 step 2, §6.2 `encrypted_data`).
pub fn build_and_encrypt(
    commands: &[Command],
    token: Option<&str>,
) -> Result<(Vec<u8>, bool), AgentError> {
    let plain = build(commands);
    match token {
        Some(token) => Ok((crypto::encrypt(token, &plain)?, true)),
        None => Ok((plain, false)),
    }
}

/// Remote path for a bundle, per §6.3: `/tmp/behemoth/commands/{id}/{id}.bs`.
pub fn remote_bundle_path(execution_id: &ExecutionId) -> String {
    format!("/tmp/behemoth/commands/{execution_id}/{execution_id}.bs")
}

/// Remote path for a file-execution's single input blob, uploaded
/// alongside the bundle (§4.3 step 2).
pub fn remote_input_blob_path(execution_id: &ExecutionId) -> String {
    format!("/tmp/behemoth/commands/{execution_id}/{execution_id}.input")
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
