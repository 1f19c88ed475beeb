// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Pool (§4.3) — the dispatcher's `worker_pool.work(execution,
//! users)` step: acquire a worker, provision and invoke the agent over one
//! reused secure-shell session, never waiting for command completion.

use std::sync::Arc;

use behemoth_agent::{AgentDriver, AgentEnvelope, AuthParams, CommandType, ShellFactory};
use behemoth_core::{Clock, Command, Execution, ExecutionId};
use behemoth_registry::WorkerRegistry;

use crate::error::DispatchError;

/// The dialect-specific pieces of the invocation envelope (§6.2) the
/// dispatcher doesn't know how to build itself — which database family,
/// what script, what credentials. Resolving these from the execution's
/// bound asset/account is an external collaborator (§1 Non-goals: "we do
/// not specify the database dialects being run against target assets"),
/// so the caller supplies them per call.
pub struct EnvelopeInputs {
    pub cmd_type: CommandType,
    pub script: String,
    pub auth: AuthParams,
    pub envs: String,
}

/// Everything [`WorkerPool::work`] needs beyond the execution itself.
pub struct WorkRequest<'a> {
    pub commands: &'a [Command],
    pub input_blob: Option<&'a [u8]>,
    pub envelope: EnvelopeInputs,
    /// First 32 chars of this become the bundle's AES key when
    /// `encrypt_bundle` is set (§4.3 step 2).
    pub bearer_token: Option<String>,
    pub encrypt_bundle: bool,
    pub control_plane_host: String,
    pub org_id: String,
}

/// Binds the Worker Registry, Remote Agent Driver, and local agent binary
/// together into the one call the dispatcher makes per execution (§4.2.e).
pub struct WorkerPool<C: Clock> {
    registry: Arc<WorkerRegistry<C>>,
    shells: Arc<dyn ShellFactory>,
    local_binary: Vec<u8>,
    driver: AgentDriver,
}

impl<C: Clock> WorkerPool<C> {
    pub fn new(registry: Arc<WorkerRegistry<C>>, shells: Arc<dyn ShellFactory>, local_binary: Vec<u8>) -> Self {
        Self { registry, shells, local_binary, driver: AgentDriver::new() }
    }

    /// §4.3 steps 1-3: acquire a worker, ensure the agent binary and
    /// command bundle are in place, and invoke. Returns once the agent has
    /// been invoked; command completion arrives later via the Callback
    /// Endpoint (§4.6).
    pub async fn work(
        &self,
        execution: &Execution,
        request: WorkRequest<'_>,
    ) -> Result<(), DispatchError> {
        let worker = self.registry.acquire(execution).await?;
        // Dropped on every exit path (including via `?` below), so the
        // worker always returns to the registry once this call is done.
        let _release_on_drop = ReleaseGuard { registry: &self.registry, execution_id: &execution.id };

        let shell = self.shells.connect(&worker).await?;

        self.driver.ensure_binary(shell.as_ref(), worker.platform, &self.local_binary).await?;

        let (bundle_path, encrypted) = self
            .driver
            .ensure_command_bundle(
                shell.as_ref(),
                &execution.id,
                request.commands,
                request.bearer_token.as_deref().filter(|_| request.encrypt_bundle),
            )
            .await?;

        if let Some(blob) = request.input_blob {
            self.driver.ensure_input_blob(shell.as_ref(), &execution.id, blob).await?;
        }

        let envelope = AgentEnvelope {
            host: request.control_plane_host,
            token: request.bearer_token.unwrap_or_default(),
            task_id: execution.id.to_string(),
            org_id: request.org_id,
            cmd_type: request.envelope.cmd_type,
            script: request.envelope.script,
            cmd_set_filepath: bundle_path,
            cmd_file: None,
            auth: request.envelope.auth,
            encrypted_data: encrypted,
            envs: request.envelope.envs,
        };

        self.driver.invoke(shell.as_ref(), worker.platform, &envelope).await?;
        Ok(())
    }
}

/// Releases the worker back to the registry's `running` bookkeeping when
/// `work` returns, success or failure alike.
struct ReleaseGuard<'a, C: Clock> {
    registry: &'a WorkerRegistry<C>,
    execution_id: &'a ExecutionId,
}

impl<C: Clock> Drop for ReleaseGuard<'_, C> {
    fn drop(&mut self) {
        self.registry.release(self.execution_id);
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
