// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch Dispatcher (§4.2) — serially walks one plan's executions through
//! the state machine, resolving late-bound targets for sync plans and
//! stopping the batch on the first pause or failure.

use std::sync::Arc;

use behemoth_core::{
    Environment, Execution, ExecutionCategory, ExecutionId, ExecutionStatus, Plan,
};
use behemoth_store::{CommandFilter, CommandStore, ExecutionStore};

use crate::error::DispatchError;
use crate::status::StatusSink;
use crate::worker_pool::{EnvelopeInputs, WorkRequest, WorkerPool};

/// Inputs the dispatcher can't derive from the domain model itself (§1
/// Non-goals: dialect/credential resolution is an external collaborator).
/// Supplied once per batch and invoked per execution.
pub struct BatchRequest<'a> {
    pub plan: &'a Plan,
    pub environment: Option<&'a Environment>,
    pub execution_ids: &'a [ExecutionId],
    pub approving_users: &'a [String],
    pub envelope_for: &'a dyn Fn(&Execution) -> EnvelopeInputs,
    pub input_blob_for: &'a dyn Fn(&Execution) -> Option<Vec<u8>>,
    pub bearer_token: Option<String>,
    pub encrypt_bundle: bool,
    pub control_plane_host: String,
    pub org_id: String,
}

pub struct BatchDispatcher<C: behemoth_core::Clock> {
    executions: Arc<dyn ExecutionStore>,
    commands: Arc<dyn CommandStore>,
    worker_pool: WorkerPool<C>,
    status: Arc<dyn StatusSink>,
}

impl<C: behemoth_core::Clock> BatchDispatcher<C> {
    pub fn new(
        executions: Arc<dyn ExecutionStore>,
        commands: Arc<dyn CommandStore>,
        worker_pool: WorkerPool<C>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self { executions, commands, worker_pool, status }
    }

    /// Keep only the most recently saved version per command id (the
    /// Command Store is append-only, §4.5) and drop the ones already
    /// `Succeeded`, or a stale `Pending` copy would keep a long-finished
    /// command "remaining" forever.
    fn remaining_commands(&self, execution_id: &ExecutionId) -> Result<Vec<behemoth_core::Command>, DispatchError> {
        let commands = self
            .commands
            .query(&CommandFilter::for_execution(execution_id.clone()))
            .map_err(|_| DispatchError::ExecutionNotFound(execution_id.clone()))?;
        Ok(behemoth_store::latest_by_id(commands)
            .into_iter()
            .filter(|c| c.status != behemoth_core::CommandStatus::Succeeded)
            .collect())
    }

    /// §4.2's five-step algorithm, over the batch named by `request.execution_ids`.
    pub async fn dispatch_batch(&self, request: BatchRequest<'_>) -> Result<(), DispatchError> {
        let mut executions: Vec<Execution> = request
            .execution_ids
            .iter()
            .map(|id| self.executions.get(id).ok_or_else(|| DispatchError::ExecutionNotFound(id.clone())))
            .collect::<Result<_, _>>()?;

        // Step 1: drop executions already finished or in flight.
        let runnable: Vec<usize> = executions
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                !matches!(e.status, ExecutionStatus::Succeeded | ExecutionStatus::Dispatched | ExecutionStatus::Running)
            })
            .map(|(i, _)| i)
            .collect();
        if runnable.is_empty() {
            return Err(DispatchError::AlreadyRunningOrFinished);
        }

        // Step 2/3: this crate holds no ephemeral per-task progress-tip
        // cache (that's UI sugar, not part of the durable data model); the
        // status stream announcement is the observable part of both steps.
        let task_id = request.plan.id.to_string();
        self.status.info(&task_id, format!("task executors: {}", request.approving_users.join(", ")));

        for (position, &i) in runnable.iter().enumerate() {
            // Step a: a persisted failure on the immediately preceding
            // execution (set by this call or an earlier, re-entrant one)
            // halts the batch before touching this execution at all.
            if i > 0 && executions[i - 1].status == ExecutionStatus::Failed {
                break;
            }

            // Step b: a pause-category execution that opens the batch is
            // pre-consented at the boundary.
            if position == 0 && executions[i].category == ExecutionCategory::Pause {
                executions[i].transition_to(ExecutionStatus::Succeeded, "pause step is first in batch");
                self.executions.save(executions[i].clone())?;
                self.status.info(&task_id, format!("{}: leading pause step treated as pre-consented", executions[i].name));
                continue;
            }

            // Step c.
            if executions[i].status != ExecutionStatus::Succeeded {
                executions[i].transition_to(ExecutionStatus::Dispatched, "claimed by dispatcher");
                self.executions.save(executions[i].clone())?;
            }

            // Step d: sync-plan late binding.
            if request.plan.is_sync() && executions[i].needs_late_binding() {
                match request.environment {
                    Some(env) => {
                        if let Err(e) = executions[i].bind_targets(env) {
                            executions[i].transition_to(ExecutionStatus::Failed, e.to_string());
                            self.executions.save(executions[i].clone())?;
                            self.status.error(&task_id, e.to_string());
                            break;
                        }
                        self.executions.save(executions[i].clone())?;
                    }
                    None => {
                        executions[i].transition_to(ExecutionStatus::Failed, "sync plan has no environment to bind against");
                        self.executions.save(executions[i].clone())?;
                        self.status.error(&task_id, "sync plan has no environment to bind against");
                        break;
                    }
                }
            }

            let remaining = self.remaining_commands(&executions[i].id)?;

            // Tie-break: a non-leading pause-category execution with any
            // command always halts the batch cooperatively, carrying that
            // command's input as context, without ever invoking a worker.
            let outcome = if position != 0 && executions[i].category == ExecutionCategory::Pause && !remaining.is_empty() {
                Err(DispatchError::Pause { reason: format!("command: {}", remaining[0].body) })
            } else if remaining.is_empty() {
                self.status.warn(&task_id, format!("{}: no commands remaining, skipping", executions[i].name));
                continue;
            } else {
                let input_blob = (request.input_blob_for)(&executions[i]);
                let envelope = (request.envelope_for)(&executions[i]);
                let work_request = WorkRequest {
                    commands: &remaining,
                    input_blob: input_blob.as_deref(),
                    envelope,
                    bearer_token: request.bearer_token.clone(),
                    encrypt_bundle: request.encrypt_bundle,
                    control_plane_host: request.control_plane_host.clone(),
                    org_id: request.org_id.clone(),
                };
                self.worker_pool.work(&executions[i], work_request).await
            };

            match outcome {
                Ok(()) => {}
                Err(DispatchError::Pause { reason }) => {
                    executions[i].transition_to(ExecutionStatus::Paused, &reason);
                    self.executions.save(executions[i].clone())?;
                    self.status.warn(&task_id, &reason);
                    break;
                }
                Err(err) => {
                    executions[i].transition_to(ExecutionStatus::Failed, err.to_string());
                    self.executions.save(executions[i].clone())?;
                    self.status.error(&task_id, err.to_string());
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
