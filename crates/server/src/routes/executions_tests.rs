// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use behemoth_agent::FakeShellFactory;
use behemoth_core::{Command, Execution, ExecutionStatus, FakeClock, Plan, PlaybackStrategy};
use behemoth_dispatch::BatchDispatcher;
use behemoth_registry::{FakeProbe, WorkerRegistry};
use behemoth_store::{CommandFilter, CommandStore, ExecutionStore, InMemoryCommandStore, InMemoryExecutionStore, InMemoryPlaybackStore};

use super::*;

fn test_state() -> AppState<FakeClock> {
    let clock = FakeClock::new();
    let registry = Arc::new(WorkerRegistry::new(clock.clone(), Arc::new(FakeProbe::all_reachable())));
    let factory = Arc::new(FakeShellFactory::new(Arc::new(behemoth_agent::FakeShell::new())));
    let worker_pool = behemoth_dispatch::WorkerPool::new(registry.clone(), factory, Vec::new());
    let executions = Arc::new(InMemoryExecutionStore::new());
    let commands = Arc::new(InMemoryCommandStore::new(clock.clone()));
    let dir = std::env::temp_dir().join("behemoth-executions-route-tests");
    let status = Arc::new(FileStatusSink::new(dir));
    let coordinator = Arc::new(SyncCoordinator::new(clock.clone(), 2, std::time::Duration::from_secs(3600)));
    let dispatcher = Arc::new(BatchDispatcher::new(executions.clone(), commands.clone(), worker_pool, status.clone()));
    let envelope_resolver = Arc::new(crate::envelope_resolver::fake::FixedEnvelopeResolver::new());

    AppState::new(
        executions,
        commands,
        Arc::new(InMemoryPlaybackStore::new()),
        registry,
        dispatcher,
        status,
        coordinator,
        envelope_resolver,
        clock,
        ServerConfig::default(),
    )
}

#[tokio::test]
async fn pause_action_transitions_a_dispatched_execution_to_paused() {
    let state = test_state();
    let plan = Plan::builder().build();
    let execution = Execution::builder().plan_id(plan.id.clone()).status(ExecutionStatus::Dispatched).build();
    state.register_plan(plan);
    state.executions.save(execution.clone()).unwrap();

    let body = OperateTaskRequest { action: OperateAction::Pause, bearer_token: None };
    let response = operate_task(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();
    assert_eq!(response.0.status, "paused");
    assert_eq!(state.executions.get(&execution.id).unwrap().status, ExecutionStatus::Paused);
}

#[tokio::test]
async fn success_action_records_a_playback_execution_for_an_auto_promote_deploy_plan() {
    let state = test_state();
    let playback = behemoth_core::Playback::builder().build();
    let plan = Plan::builder().playback_strategy(PlaybackStrategy::AutoPromote).playback_id(playback.id.clone()).build();
    let execution = Execution::builder().plan_id(plan.id.clone()).status(ExecutionStatus::Running).build();

    state.register_plan(plan.clone());
    state.register_playback(playback.clone());
    state.executions.save(execution.clone()).unwrap();

    let body = OperateTaskRequest { action: OperateAction::Success, bearer_token: None };
    let response = operate_task(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();
    assert_eq!(response.0.status, "succeeded");

    let recordings = state.playback.executions_for_version(
        state.playback.get_or_create_monthly_version(playback.id.clone(), &behemoth_store::monthly_label(state.clock.epoch_ms())).id,
    );
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].execution_id, execution.id);
}

#[tokio::test]
async fn start_action_dispatches_a_pending_execution() {
    let state = test_state();
    let environment = behemoth_core::Environment::builder().build();
    let plan = Plan::builder().environment_id(environment.id.clone()).build();
    let execution = Execution::builder().plan_id(plan.id.clone()).status(ExecutionStatus::Pending).build();
    let command = Command::builder().execution_id(execution.id.clone()).body("SELECT 1;").build();

    state.register_environment(environment);
    state.register_plan(plan.clone());
    state.executions.save(execution.clone()).unwrap();
    state.commands.save(&command).unwrap();

    let body = OperateTaskRequest { action: OperateAction::Start, bearer_token: None };
    let response = operate_task(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();
    assert_eq!(response.0.status, "dispatched");
}

#[tokio::test]
async fn operate_task_on_an_unknown_execution_is_not_found() {
    let state = test_state();
    let body = OperateTaskRequest { action: OperateAction::Pause, bearer_token: None };
    let err = operate_task(State(state), Path(behemoth_core::ExecutionId::new().to_string()), Json(body)).await.unwrap_err();
    assert!(matches!(err, ApiError::ExecutionNotFound(_)));
}

#[tokio::test]
async fn a_successful_callback_records_output_and_continues() {
    let state = test_state();
    let execution = Execution::builder().status(ExecutionStatus::Dispatched).build();
    let command = Command::builder().execution_id(execution.id.clone()).body("SELECT 1;").build();
    state.executions.save(execution.clone()).unwrap();
    state.commands.save(&command).unwrap();

    let body = ExecutionCallback::Command {
        command_id: command.id.to_string(),
        status: CallbackStatus::Success,
        output: "1 row".to_string(),
    };
    let response = execution_callback(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();
    assert_eq!(
        response.0,
        ExecutionCallbackResponse::Command { should_continue: true, detail: "ok".to_string() }
    );

    let saved = state.commands.query(&CommandFilter::for_execution(execution.id.clone())).unwrap();
    assert_eq!(saved[0].output.as_deref(), Some("1 row"));
}

#[tokio::test]
async fn a_failed_callback_pauses_the_execution_instead_of_failing_it() {
    let state = test_state();
    let execution = Execution::builder().status(ExecutionStatus::Dispatched).build();
    let command = Command::builder().execution_id(execution.id.clone()).body("SELECT 1;").build();
    state.executions.save(execution.clone()).unwrap();
    state.commands.save(&command).unwrap();

    let body = ExecutionCallback::Command {
        command_id: command.id.to_string(),
        status: CallbackStatus::Failed,
        output: "syntax error".to_string(),
    };
    let response = execution_callback(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();
    assert_eq!(
        response.0,
        ExecutionCallbackResponse::Command { should_continue: false, detail: "ok".to_string() }
    );
    assert_eq!(state.executions.get(&execution.id).unwrap().status, ExecutionStatus::Paused);
}

#[tokio::test]
async fn a_callback_for_a_non_running_execution_is_a_no_op_not_an_error() {
    let state = test_state();
    let execution = Execution::builder().status(ExecutionStatus::Succeeded).build();
    state.executions.save(execution.clone()).unwrap();

    let body = ExecutionCallback::Command {
        command_id: behemoth_core::CommandId::new().to_string(),
        status: CallbackStatus::Success,
        output: "ignored".to_string(),
    };
    let response = execution_callback(State(state), Path(execution.id.to_string()), Json(body)).await.unwrap();
    assert_eq!(
        response.0,
        ExecutionCallbackResponse::Command { should_continue: false, detail: "task not running".to_string() }
    );
}

#[tokio::test]
async fn a_file_category_execution_stores_callback_output_as_a_blob() {
    let state = test_state();
    let execution = Execution::builder().status(ExecutionStatus::Dispatched).category(behemoth_core::ExecutionCategory::File).build();
    let command = Command::builder().execution_id(execution.id.clone()).body("upload").build();
    state.executions.save(execution.clone()).unwrap();
    state.commands.save(&command).unwrap();

    let body = ExecutionCallback::Command {
        command_id: command.id.to_string(),
        status: CallbackStatus::Success,
        output: "raw file output".to_string(),
    };
    execution_callback(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();

    let saved = state.commands.query(&CommandFilter::for_execution(execution.id.clone())).unwrap();
    let stored_path = saved[0].output.clone().unwrap();
    assert!(std::path::Path::new(&stored_path).exists());
    assert_eq!(std::fs::read_to_string(stored_path).unwrap(), "raw file output");
}

#[tokio::test]
async fn a_status_success_callback_auto_promotes_into_an_auto_promote_playback() {
    let state = test_state();
    let playback = behemoth_core::Playback::builder().build();
    let plan = Plan::builder().playback_strategy(PlaybackStrategy::AutoPromote).playback_id(playback.id.clone()).build();
    let execution = Execution::builder().plan_id(plan.id.clone()).status(ExecutionStatus::Running).build();
    state.register_plan(plan.clone());
    state.register_playback(playback.clone());
    state.executions.save(execution.clone()).unwrap();

    let body = ExecutionCallback::Status { status: CallbackStatus::Success, reason: String::new() };
    let response = execution_callback(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();
    assert_eq!(response.0, ExecutionCallbackResponse::Ack { detail: "ok".to_string() });
    assert_eq!(state.executions.get(&execution.id).unwrap().status, ExecutionStatus::Succeeded);

    let recordings = state.playback.executions_for_version(
        state.playback.get_or_create_monthly_version(playback.id.clone(), &behemoth_store::monthly_label(state.clock.epoch_ms())).id,
    );
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].execution_id, execution.id);
}

#[tokio::test]
async fn a_status_failed_callback_fails_the_execution_with_the_given_reason() {
    let state = test_state();
    let execution = Execution::builder().status(ExecutionStatus::Running).build();
    state.executions.save(execution.clone()).unwrap();

    let body = ExecutionCallback::Status { status: CallbackStatus::Failed, reason: "agent process died".to_string() };
    execution_callback(State(state.clone()), Path(execution.id.to_string()), Json(body)).await.unwrap();

    let saved = state.executions.get(&execution.id).unwrap();
    assert_eq!(saved.status, ExecutionStatus::Failed);
    assert_eq!(saved.reason.as_deref(), Some("agent process died"));
}

#[tokio::test]
async fn a_health_callback_is_an_ack_with_no_side_effect() {
    let state = test_state();
    let execution = Execution::builder().status(ExecutionStatus::Running).build();
    state.executions.save(execution.clone()).unwrap();

    let response =
        execution_callback(State(state.clone()), Path(execution.id.to_string()), Json(ExecutionCallback::Health {})).await.unwrap();
    assert_eq!(response.0, ExecutionCallbackResponse::Ack { detail: "ok".to_string() });
    assert_eq!(state.executions.get(&execution.id).unwrap().status, ExecutionStatus::Running);
}
