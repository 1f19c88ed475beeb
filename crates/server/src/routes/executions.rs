// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /executions/:id/operate_task` and the Callback Endpoint,
//! `PATCH /executions/:id/callback` (§4.6, §6.1).

use axum::extract::{Path, State};
use axum::Json;
use behemoth_core::{Clock, CommandId, ExecutionCategory, ExecutionId, ExecutionStatus};
use behemoth_store::{CommandFilter, CommandStore, ExecutionStore};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::routes::plans::dispatch_plan;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperateAction {
    Start,
    Pause,
    Success,
}

#[derive(Debug, Deserialize)]
pub struct OperateTaskRequest {
    pub action: OperateAction,
    /// Bearer token authorizing callbacks for a freshly dispatched batch
    /// (§6.2 `token`); minting one is an identity/auth concern out of scope
    /// here (§1 Non-goals), so a real deployment supplies it.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

#[derive(Serialize)]
pub struct OperateTaskResponse {
    pub status: String,
}

/// Transitions the execution per §4.4 and kicks or halts the dispatcher
/// (§6.1).
pub async fn operate_task<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(execution_id): Path<String>,
    Json(body): Json<OperateTaskRequest>,
) -> Result<Json<OperateTaskResponse>, ApiError> {
    let execution_id = ExecutionId::from_string(execution_id);
    let mut execution =
        state.executions.get(&execution_id).ok_or_else(|| ApiError::ExecutionNotFound(execution_id.to_string()))?;

    match body.action {
        OperateAction::Pause => {
            execution.transition_to(ExecutionStatus::Paused, "operator pause");
            state.executions.save(execution.clone())?;
        }
        OperateAction::Success => {
            execution.transition_to(ExecutionStatus::Succeeded, "operator marked success");
            state.executions.save(execution.clone())?;
            record_playback_if_configured(&state, &execution);
        }
        OperateAction::Start => {
            // A paused execution is resumed by re-dispatching it alone: the
            // dispatcher's own claim step performs `Paused -> Dispatched`
            // (§4.2 step c). Pre-transitioning it here would make the
            // dispatcher see it as already dispatched and reject the batch.
            let plan = state.plan(&execution.plan_id).ok_or_else(|| ApiError::PlanNotFound(execution.plan_id.to_string()))?;
            let environment = state.environment(&plan.environment_id);
            dispatch_plan(&state, &plan, environment.as_ref(), &[execution_id.clone()], &[]).await?;
            execution = state.executions.get(&execution_id).ok_or_else(|| ApiError::ExecutionNotFound(execution_id.to_string()))?;
        }
    }

    Ok(Json(OperateTaskResponse { status: execution.status.to_string() }))
}

/// Files a deploy execution's output into its plan's playback (§4.7) once
/// it reaches a terminal success; sync plans and plans with no playback
/// attached have nothing to record.
fn record_playback_if_configured<C: Clock>(state: &AppState<C>, execution: &behemoth_core::Execution) {
    let Some(plan) = state.plan(&execution.plan_id) else { return };
    if plan.is_sync() {
        return;
    }
    let Some(playback_id) = plan.playback_id.clone() else { return };
    let Some(playback) = state.playback_entity(&playback_id) else { return };

    let commands = state.commands.query(&CommandFilter::for_execution(execution.id.clone())).unwrap_or_default();
    let output = commands.iter().filter_map(|c| c.output.clone()).collect::<Vec<_>>().join("\n");

    let (asset_name, account_name) = (
        execution.asset_hint.clone().unwrap_or_default(),
        execution.account_hint.clone().unwrap_or_default(),
    );

    behemoth_store::record_completed_execution(
        state.playback.as_ref(),
        &state.clock,
        &playback,
        &plan.name,
        execution,
        &asset_name,
        &account_name,
        plan.playback_strategy,
        output,
    );
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Success,
    Failed,
}

/// The three callback kinds an agent reports against a dispatched
/// execution (§4.4, §4.6). The original system routes these through
/// `getattr(self, f'_type_for_{type_}')`; here it's a tagged enum instead
/// (§9 REDESIGN FLAGS) so the three payload shapes and their handling live
/// next to each other instead of behind a runtime attribute lookup.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionCallback {
    /// The agent reports the execution itself has finished (`generic.py`'s
    /// `_type_for_status`): drives `executing -> success`/`failed` directly,
    /// independent of any single command's outcome.
    Status { status: CallbackStatus, #[serde(default)] reason: String },
    /// The agent reports one command's outcome (`_type_for_command`).
    Command { command_id: String, status: CallbackStatus, output: String },
    /// A liveness ping with no side effect (`_type_for_status`'s sibling
    /// `_type_for_health`), sent every few seconds while a task runs.
    Health {},
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExecutionCallbackResponse {
    Command {
        #[serde(rename = "continue")]
        should_continue: bool,
        detail: String,
    },
    Ack {
        detail: String,
    },
}

/// The Callback Endpoint (§4.4, §4.6): the agent's single channel for
/// reporting execution-level status, per-command outcomes, and liveness.
/// Replays are safe: re-saving a command, re-pausing an already-paused
/// execution, or re-succeeding an already-succeeded one is a no-op as far
/// as the caller can observe.
pub async fn execution_callback<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(execution_id): Path<String>,
    Json(body): Json<ExecutionCallback>,
) -> Result<Json<ExecutionCallbackResponse>, ApiError> {
    let execution_id = ExecutionId::from_string(execution_id);

    match body {
        ExecutionCallback::Status { status, reason } => {
            status_callback(&state, &execution_id, status, reason)?;
            Ok(Json(ExecutionCallbackResponse::Ack { detail: "ok".to_string() }))
        }
        ExecutionCallback::Health {} => Ok(Json(ExecutionCallbackResponse::Ack { detail: "ok".to_string() })),
        ExecutionCallback::Command { command_id, status, output } => {
            let (should_continue, detail) = command_callback(&state, &execution_id, command_id, status, output)?;
            Ok(Json(ExecutionCallbackResponse::Command { should_continue, detail }))
        }
    }
}

/// `executing -> success`/`failed` driven by the agent's own report of the
/// execution's outcome (§4.4), not by any one command finishing. On success
/// this is what makes invariant #4's auto-promotion into the playback
/// reachable without an operator's manual `operate_task` override.
fn status_callback<C: Clock + 'static>(
    state: &AppState<C>,
    execution_id: &ExecutionId,
    status: CallbackStatus,
    reason: String,
) -> Result<(), ApiError> {
    let mut execution =
        state.executions.get(execution_id).ok_or_else(|| ApiError::ExecutionNotFound(execution_id.to_string()))?;

    if !matches!(execution.status, ExecutionStatus::Dispatched | ExecutionStatus::Running) {
        return Ok(());
    }

    let task_id = execution.plan_id.to_string();
    match status {
        CallbackStatus::Success => {
            // `executing -> success` has no direct edge from `Dispatched`
            // (§6.1's state machine runs the agent's callback through
            // `running` first); a `Dispatched` execution whose agent
            // reports success never sent an explicit "running" status in
            // between, so fold that step in here.
            if execution.status == ExecutionStatus::Dispatched {
                execution.transition_to(ExecutionStatus::Running, "agent reported success");
            }
            execution.transition_to(ExecutionStatus::Succeeded, "agent reported success");
            state.executions.save(execution.clone())?;
            state.status.info(&task_id, "agent reported success");
            record_playback_if_configured(state, &execution);
        }
        CallbackStatus::Failed => {
            let why = if reason.is_empty() { "agent reported failure".to_string() } else { reason };
            execution.transition_to(ExecutionStatus::Failed, &why);
            state.executions.save(execution)?;
            state.status.error(&task_id, &why);
        }
    }
    Ok(())
}

/// Records one command's outcome and, on failure, pauses the execution for
/// human adjudication at command granularity rather than failing the whole
/// batch outright.
fn command_callback<C: Clock + 'static>(
    state: &AppState<C>,
    execution_id: &ExecutionId,
    command_id: String,
    status: CallbackStatus,
    output: String,
) -> Result<(bool, String), ApiError> {
    let mut execution =
        state.executions.get(execution_id).ok_or_else(|| ApiError::ExecutionNotFound(execution_id.to_string()))?;

    if !matches!(execution.status, ExecutionStatus::Dispatched | ExecutionStatus::Running) {
        return Ok((false, "task not running".to_string()));
    }

    let parsed_command_id = CommandId::from_string(&command_id);
    let mut commands = state.commands.query(&CommandFilter::for_execution(execution_id.clone()))?;
    let position = commands
        .iter()
        .position(|c| c.id == parsed_command_id)
        .ok_or_else(|| ApiError::CommandNotFound(command_id.clone()))?;
    let mut command = commands.remove(position);

    let mut output = output;
    if execution.category == ExecutionCategory::File {
        output = store_output_blob(state, execution_id, &parsed_command_id, &output)?;
    }

    let task_id = execution.plan_id.to_string();
    let should_continue = match status {
        CallbackStatus::Success => {
            command.record_success(&output);
            state.commands.save(&command)?;
            state.status.info(&task_id, format!("Command input: {}", command.body));
            state.status.info(&task_id, format!("Command output: {output}"));
            true
        }
        CallbackStatus::Failed => {
            command.record_failure(&output);
            state.commands.save(&command)?;
            execution.transition_to(ExecutionStatus::Paused, "see command output");
            state.executions.save(execution)?;
            state.status.warn(&task_id, "see command output");
            false
        }
    };

    Ok((should_continue, "ok".to_string()))
}

/// File-category executions persist raw output as a blob keyed by
/// `(execution-id, command-id)` and replace it with the stored path (§4.6,
/// §3 Command invariants).
fn store_output_blob<C: Clock>(
    state: &AppState<C>,
    execution_id: &ExecutionId,
    command_id: &CommandId,
    output: &str,
) -> Result<String, ApiError> {
    let path = state.config.log_dir.join("blobs").join(execution_id.to_string()).join(format!("{command_id}.output"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
    }
    std::fs::write(&path, output).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
    Ok(path.to_string_lossy().to_string())
}

#[cfg(test)]
#[path = "executions_tests.rs"]
mod tests;
