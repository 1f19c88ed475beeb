// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote Agent Driver (§4.3): prepare and invoke the agent on one worker
//! for one execution, all over one reused [`SecureShell`] session.

use behemoth_core::{Command, ExecutionId, WorkerPlatform};
use sha2::{Digest, Sha256};

use crate::bundle;
use crate::envelope::AgentEnvelope;
use crate::error::AgentError;
use crate::platform::{self, profile_for};
use crate::shell::SecureShell;

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to a String cannot fail");
    }
    out
}

/// Stateless driver over a caller-supplied [`SecureShell`]; one instance
/// per execution, matching the dispatcher's one-session-per-worker-call
/// contract (§4.3, §5).
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentDriver;

impl AgentDriver {
    pub fn new() -> Self {
        Self
    }

    /// §4.3 step 1: compare local and remote checksums; upload and chmod
    /// the binary only when they differ or the remote is absent.
    pub async fn ensure_binary(
        &self,
        shell: &dyn SecureShell,
        platform: WorkerPlatform,
        local_binary: &[u8],
    ) -> Result<(), AgentError> {
        let profile = profile_for(platform);
        let local_checksum = sha256_hex(local_binary);

        let checksum_output = shell.exec(&profile.remote_checksum_command()).await?;
        let remote_checksum = platform::parse_remote_checksum(&checksum_output.stdout);

        let up_to_date = checksum_output.succeeded()
            && remote_checksum.as_deref() == Some(local_checksum.as_str());

        if !up_to_date {
            let remote_path = profile.remote_binary_path();
            shell.upload(&remote_path, local_binary.to_vec(), 0o755).await?;
            shell.exec(&format!("chmod +x \"{remote_path}\"")).await?;
        }

        Ok(())
    }

    /// §4.3 step 2: bundle the execution's remaining commands, optionally
    /// encrypt, upload to `/tmp/behemoth/commands/{id}/{id}.bs` mode 0400.
    /// Returns `(remote_path, encrypted)`.
    pub async fn ensure_command_bundle(
        &self,
        shell: &dyn SecureShell,
        execution_id: &ExecutionId,
        commands: &[Command],
        token: Option<&str>,
    ) -> Result<(String, bool), AgentError> {
        let (bytes, encrypted) = bundle::build_and_encrypt(commands, token)?;
        let remote_path = bundle::remote_bundle_path(execution_id);
        shell.upload(&remote_path, bytes, 0o400).await?;
        Ok((remote_path, encrypted))
    }

    /// §4.3 step 2: for file-category executions, upload the single input
    /// blob alongside the bundle.
    pub async fn ensure_input_blob(
        &self,
        shell: &dyn SecureShell,
        execution_id: &ExecutionId,
        blob: &[u8],
    ) -> Result<String, AgentError> {
        let remote_path = bundle::remote_input_blob_path(execution_id);
        shell.upload(&remote_path, blob.to_vec(), 0o400).await?;
        Ok(remote_path)
    }

    /// §4.3 step 3: base64-encode the envelope and invoke the remote
    /// binary. Non-empty stderr is a fatal agent error; the agent returns
    /// control immediately, so there is no wait for command completion.
    pub async fn invoke(
        &self,
        shell: &dyn SecureShell,
        platform: WorkerPlatform,
        envelope: &AgentEnvelope,
    ) -> Result<(), AgentError> {
        let profile = profile_for(platform);
        let encoded = envelope.to_base64()?;
        let command = format!("{} --command {encoded} --with_env", profile.remote_binary_path());

        let output = shell.exec(&command).await?;
        if !output.stderr.trim().is_empty() {
            return Err(AgentError::AgentStderr(output.stderr));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
