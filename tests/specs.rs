// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios that span registry, store, agent, and dispatch the
//! way a running deployment does: dispatch, simulate the agent's callback,
//! and re-dispatch the way the Control API's routes do (a whole plan at
//! once for `start-sync-task`, one execution id at a time for
//! `operate_task`), rather than exercising a single `dispatch_batch` call
//! in isolation — each crate's own test suite already covers that level.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use behemoth_agent::{AuthParams, CommandType, FakeShell, FakeShellFactory};
use behemoth_core::{
    Account, Asset, Command, Environment, Execution, ExecutionCategory, ExecutionStatus,
    FakeClock, Plan, PlanCategory, Playback, PlaybackStrategy, Worker, WorkerPlatform,
};
use behemoth_dispatch::{
    BatchDispatcher, BatchRequest, DispatchError, EnvelopeInputs, RecordingStatusSink, Severity,
    WorkerPool,
};
use behemoth_registry::{FakeProbe, WorkerRegistry, DIRTY_TTL};
use behemoth_server::routes::executions::{
    execution_callback, CallbackStatus, ExecutionCallback, ExecutionCallbackResponse,
};
use behemoth_server::{AppState, FileStatusSink, ServerConfig, SyncCoordinator};
use behemoth_store::{
    materialize_sync_plan, CommandFilter, CommandStore, ExecutionStore, InMemoryCommandStore,
    InMemoryExecutionStore, InMemoryPlaybackStore, PlaybackStore,
};

fn envelope_inputs() -> EnvelopeInputs {
    EnvelopeInputs {
        cmd_type: CommandType::Script,
        script: "script".to_string(),
        auth: AuthParams {
            address: "10.0.0.5".to_string(),
            port: 3306,
            username: "svc".to_string(),
            password: "secret".to_string(),
            db_name: None,
            privileged: None,
        },
        envs: String::new(),
    }
}

/// Everything one end-to-end scenario needs, wired the way `behemothd`
/// wires it at startup, minus the HTTP surface.
struct Harness {
    dispatcher: BatchDispatcher<FakeClock>,
    executions: Arc<InMemoryExecutionStore>,
    commands: Arc<InMemoryCommandStore<FakeClock>>,
    registry: Arc<WorkerRegistry<FakeClock>>,
    probe: Arc<FakeProbe>,
    status: Arc<RecordingStatusSink>,
    clock: FakeClock,
}

fn harness_with_workers(workers: Vec<Worker>) -> Harness {
    let clock = FakeClock::new();
    let probe = Arc::new(FakeProbe::all_reachable());
    let registry = Arc::new(WorkerRegistry::new(clock.clone(), probe.clone()));
    for worker in workers {
        registry.add_worker(worker);
    }
    let shell = Arc::new(FakeShell::new());
    let factory = Arc::new(FakeShellFactory::new(shell));
    let worker_pool = WorkerPool::new(registry.clone(), factory, b"agent-binary".to_vec());

    let executions = Arc::new(InMemoryExecutionStore::new());
    let commands = Arc::new(InMemoryCommandStore::new(clock.clone()));
    let status = Arc::new(RecordingStatusSink::new());
    let dispatcher = BatchDispatcher::new(executions.clone(), commands.clone(), worker_pool, status.clone());

    Harness { dispatcher, executions, commands, registry, probe, status, clock }
}

/// Wires a Control API [`AppState`] over the same execution/command stores
/// the harness's dispatcher already uses, so a scenario can drive the real
/// Callback Endpoint instead of hand-transitioning status (§6.1, §4.6).
fn app_state(h: &Harness, playback: Arc<dyn PlaybackStore>) -> AppState<FakeClock> {
    let factory = Arc::new(FakeShellFactory::new(Arc::new(FakeShell::new())));
    let worker_pool = WorkerPool::new(h.registry.clone(), factory, b"agent-binary".to_vec());
    let dispatcher = Arc::new(BatchDispatcher::new(h.executions.clone(), h.commands.clone(), worker_pool, h.status.clone()));
    let status = Arc::new(FileStatusSink::new(std::env::temp_dir().join("behemoth-specs-status")));
    let coordinator = Arc::new(SyncCoordinator::new(h.clock.clone(), 1, std::time::Duration::from_secs(3600)));
    let envelope_resolver = Arc::new(behemoth_server::envelope_resolver::fake::FixedEnvelopeResolver::new());

    AppState::new(
        h.executions.clone(),
        h.commands.clone(),
        playback,
        h.registry.clone(),
        dispatcher,
        status,
        coordinator,
        envelope_resolver,
        h.clock.clone(),
        ServerConfig::default(),
    )
}

fn request<'a>(
    plan: &'a Plan,
    ids: &'a [behemoth_core::ExecutionId],
    envelope_for: &'a dyn Fn(&Execution) -> EnvelopeInputs,
) -> BatchRequest<'a> {
    BatchRequest {
        plan,
        environment: None,
        execution_ids: ids,
        approving_users: &["deployer@example.com".to_string()],
        envelope_for,
        input_blob_for: &|_: &Execution| None,
        bearer_token: Some("a-bearer-token-that-is-long-enough".to_string()),
        encrypt_bundle: false,
        control_plane_host: "https://control.example".to_string(),
        org_id: "default".to_string(),
    }
}

/// Drives the real Callback Endpoint (§4.6, §4.4): the agent reports the
/// command's outcome, then reports the execution itself as done. This is
/// what makes invariant #4 (auto-promote into the playback on agent
/// success) and scenario 1's "one PlaybackExecution row appended" reachable
/// through the product's own callback path, not a hand-rolled transition.
async fn simulate_success_callback(
    state: &AppState<FakeClock>,
    execution_id: &behemoth_core::ExecutionId,
    command_id: &behemoth_core::CommandId,
    output: &str,
) {
    let command_body = ExecutionCallback::Command {
        command_id: command_id.to_string(),
        status: CallbackStatus::Success,
        output: output.to_string(),
    };
    let response =
        execution_callback(State(state.clone()), Path(execution_id.to_string()), Json(command_body)).await.unwrap();
    assert_eq!(response.0, ExecutionCallbackResponse::Command { should_continue: true, detail: "ok".to_string() });

    let status_body = ExecutionCallback::Status { status: CallbackStatus::Success, reason: String::new() };
    execution_callback(State(state.clone()), Path(execution_id.to_string()), Json(status_body)).await.unwrap();
}

#[tokio::test]
async fn happy_path_deploy_batch_dispatches_every_step_then_the_agent_reports_success() {
    let worker = Worker::builder().platform(WorkerPlatform::Linux).build();
    let h = harness_with_workers(vec![worker]);
    let plan = Plan::builder().category(PlanCategory::Deploy).build();

    let first = Execution::builder().plan_id(plan.id.clone()).sequence(0).build();
    let second = Execution::builder().plan_id(plan.id.clone()).sequence(1).build();
    let first_cmd = Command::builder().execution_id(first.id.clone()).body("echo one").build();
    let second_cmd = Command::builder().execution_id(second.id.clone()).body("echo two").build();
    h.executions.save(first.clone()).unwrap();
    h.executions.save(second.clone()).unwrap();
    h.commands.save(&first_cmd).unwrap();
    h.commands.save(&second_cmd).unwrap();

    let ids = [first.id.clone(), second.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();

    // One call to start-sync-task-style dispatch claims the whole batch;
    // the dispatcher never waits on a worker to finish before moving on.
    h.dispatcher.dispatch_batch(request(&plan, &ids, &envelope_for)).await.unwrap();
    assert_eq!(h.executions.get(&first.id).unwrap().status, ExecutionStatus::Dispatched);
    assert_eq!(h.executions.get(&second.id).unwrap().status, ExecutionStatus::Dispatched);

    // Re-submitting the same, already-dispatched batch is rejected rather
    // than silently re-invoking the agent a second time.
    let err = h.dispatcher.dispatch_batch(request(&plan, &ids, &envelope_for)).await.unwrap_err();
    assert!(matches!(err, DispatchError::AlreadyRunningOrFinished));

    // The agent calls back once each command finishes, through the real
    // Callback Endpoint — not a hand-rolled transition.
    let state = app_state(&h, Arc::new(InMemoryPlaybackStore::new()));
    state.register_plan(plan.clone());
    simulate_success_callback(&state, &first.id, &first_cmd.id, "1 row affected").await;
    simulate_success_callback(&state, &second.id, &second_cmd.id, "1 row affected").await;
    assert_eq!(h.executions.get(&first.id).unwrap().status, ExecutionStatus::Succeeded);
    assert_eq!(h.executions.get(&second.id).unwrap().status, ExecutionStatus::Succeeded);
}

#[tokio::test]
async fn a_failing_execution_halts_the_rest_of_the_batch_without_touching_it() {
    // No worker is ever reachable, so the first execution's agent
    // invocation fails synchronously and the loop must stop right there.
    let worker = Worker::builder().platform(WorkerPlatform::Linux).build();
    let worker_id = worker.id.clone();
    let h = harness_with_workers(vec![worker]);
    h.probe.mark_unreachable(worker_id);

    let plan = Plan::builder().category(PlanCategory::Deploy).build();
    let first = Execution::builder().plan_id(plan.id.clone()).sequence(0).build();
    let second = Execution::builder().plan_id(plan.id.clone()).sequence(1).build();
    h.executions.save(first.clone()).unwrap();
    h.executions.save(second.clone()).unwrap();
    h.commands.save(&Command::builder().execution_id(first.id.clone()).build()).unwrap();
    h.commands.save(&Command::builder().execution_id(second.id.clone()).build()).unwrap();

    let ids = [first.id.clone(), second.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();
    h.dispatcher.dispatch_batch(request(&plan, &ids, &envelope_for)).await.unwrap();

    let first_saved = h.executions.get(&first.id).unwrap();
    assert_eq!(first_saved.status, ExecutionStatus::Failed);
    assert!(first_saved.reason.is_some());
    assert_eq!(
        h.executions.get(&second.id).unwrap().status,
        ExecutionStatus::Pending,
        "the batch stops at the first failure; later steps are untouched"
    );
    assert!(h.status.lines_for(&plan.id.to_string()).iter().any(|(sev, _)| *sev == Severity::Error));
}

#[tokio::test]
async fn an_operator_pause_halts_the_batch_then_a_direct_success_override_continues_it() {
    let worker = Worker::builder().platform(WorkerPlatform::Linux).build();
    let h = harness_with_workers(vec![worker]);
    let plan = Plan::builder().category(PlanCategory::Deploy).build();

    let first = Execution::builder().plan_id(plan.id.clone()).sequence(0).build();
    let pause = Execution::builder().plan_id(plan.id.clone()).category(ExecutionCategory::Pause).sequence(1).build();
    let trailing = Execution::builder().plan_id(plan.id.clone()).sequence(2).build();
    h.executions.save(first.clone()).unwrap();
    h.executions.save(pause.clone()).unwrap();
    h.executions.save(trailing.clone()).unwrap();
    h.commands.save(&Command::builder().execution_id(first.id.clone()).build()).unwrap();
    let pause_cmd = Command::builder().execution_id(pause.id.clone()).body("confirm rollout to prod").build();
    h.commands.save(&pause_cmd).unwrap();
    h.commands.save(&Command::builder().execution_id(trailing.id.clone()).build()).unwrap();

    let ids = [first.id.clone(), pause.id.clone(), trailing.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();

    h.dispatcher.dispatch_batch(request(&plan, &ids, &envelope_for)).await.unwrap();
    assert_eq!(h.executions.get(&first.id).unwrap().status, ExecutionStatus::Dispatched);
    assert_eq!(h.executions.get(&pause.id).unwrap().status, ExecutionStatus::Paused);
    assert_eq!(h.executions.get(&trailing.id).unwrap().status, ExecutionStatus::Pending);

    // Operator reviews the pause's command out of band (§4.6) and closes
    // the gate directly (§6.1 `operate_task`'s `success` action), without
    // re-running its command through the dispatcher.
    let mut acked = pause_cmd.clone();
    acked.record_success("operator approved");
    h.commands.save(&acked).unwrap();
    let mut resolved = h.executions.get(&pause.id).unwrap();
    assert!(resolved.transition_to(ExecutionStatus::Succeeded, "operator marked success"));
    h.executions.save(resolved).unwrap();

    let trailing_ids = [trailing.id.clone()];
    h.dispatcher.dispatch_batch(request(&plan, &trailing_ids, &envelope_for)).await.unwrap();
    assert_eq!(h.executions.get(&trailing.id).unwrap().status, ExecutionStatus::Dispatched);
}

#[tokio::test]
async fn a_sync_plan_late_binds_its_execution_against_the_environment() {
    let worker = Worker::builder().platform(WorkerPlatform::Linux).build();
    let h = harness_with_workers(vec![worker]);
    let plan = Plan::builder().category(PlanCategory::Sync).build();

    let environment = Environment {
        id: behemoth_core::EnvironmentId::new(),
        tenant_id: behemoth_core::TenantId::new("default"),
        name: "prod".to_string(),
        assets: vec![Asset {
            id: behemoth_core::AssetId::new(),
            name: "prod-mysql".to_string(),
            accounts: vec![Account { id: behemoth_core::AccountId::new(), username: "svc".to_string() }],
        }],
    };

    let execution = Execution::builder()
        .plan_id(plan.id.clone())
        .asset_hint("prod-mysql")
        .account_hint("svc")
        .version("2026.07.1")
        .build();
    h.executions.save(execution.clone()).unwrap();
    let cmd = Command::builder().execution_id(execution.id.clone()).body("select 1").build();
    h.commands.save(&cmd).unwrap();

    let ids = [execution.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();
    let mut req = request(&plan, &ids, &envelope_for);
    req.environment = Some(&environment);
    h.dispatcher.dispatch_batch(req).await.unwrap();

    let bound = h.executions.get(&execution.id).unwrap();
    assert_eq!(bound.status, ExecutionStatus::Dispatched);
    assert!(bound.asset_id.is_some());
    assert!(bound.account_id.is_some());
}

#[tokio::test]
async fn a_completed_deploy_execution_is_recorded_then_a_sync_plan_materializes_it_with_reindexed_commands() {
    let worker = Worker::builder().platform(WorkerPlatform::Linux).build();
    let h = harness_with_workers(vec![worker]);
    let deploy_plan = Plan::builder().category(PlanCategory::Deploy).build();
    let playback = Playback::builder().plan_id(deploy_plan.id.clone()).build();
    let deploy_plan =
        Plan { playback_strategy: PlaybackStrategy::AutoPromote, playback_id: Some(playback.id.clone()), ..deploy_plan };

    let execution = Execution::builder()
        .plan_id(deploy_plan.id.clone())
        .asset_hint("prod-mysql")
        .account_hint("svc")
        .version("2026.07.1")
        .build();
    h.executions.save(execution.clone()).unwrap();
    let first_cmd = Command::builder().execution_id(execution.id.clone()).body("select 1").build();
    let second_cmd = Command::builder().execution_id(execution.id.clone()).sequence(1).body("select 2").build();
    h.commands.save(&first_cmd).unwrap();
    h.commands.save(&second_cmd).unwrap();

    let ids = [execution.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();
    h.dispatcher.dispatch_batch(request(&deploy_plan, &ids, &envelope_for)).await.unwrap();

    // The agent reports through the real Callback Endpoint; success records
    // the execution into the playback (§4.7 "On execution terminal success").
    let playback_store: Arc<dyn PlaybackStore> = Arc::new(InMemoryPlaybackStore::new());
    let state = app_state(&h, playback_store.clone());
    state.register_plan(deploy_plan.clone());
    state.register_playback(playback.clone());
    simulate_success_callback(&state, &execution.id, &first_cmd.id, "1 row").await;
    simulate_success_callback(&state, &execution.id, &second_cmd.id, "1 row").await;
    assert_eq!(h.executions.get(&execution.id).unwrap().status, ExecutionStatus::Succeeded);

    let label = behemoth_store::monthly_label(h.clock.epoch_ms());
    let monthly_version = playback_store.get_or_create_monthly_version(playback.id.clone(), &label);
    assert_eq!(playback_store.executions_for_version(monthly_version.id).len(), 1);

    // A sync plan pointed at the same playback materializes a fresh
    // execution from the recording (§4.7 "On sync-plan creation").
    let sync_plan = Plan::builder().category(PlanCategory::Sync).playback_id(playback.id.clone()).build();
    let materialized =
        materialize_sync_plan(playback_store.as_ref(), h.executions.as_ref(), h.commands.as_ref(), &sync_plan).unwrap();
    assert_eq!(materialized.len(), 1);
    let clone = &materialized[0];
    assert_eq!(clone.plan_id, sync_plan.id);
    assert_eq!(clone.version, "2026.07.1");
    assert_eq!(clone.asset_hint.as_deref(), Some("prod-mysql"));
    assert_eq!(clone.account_hint.as_deref(), Some("svc"));
    assert_eq!(clone.status, ExecutionStatus::Pending);

    let cloned_commands = behemoth_store::latest_by_id(
        h.commands.query(&CommandFilter::for_execution(clone.id.clone())).unwrap(),
    );
    let mut sequences: Vec<u32> = cloned_commands.iter().map(|c| c.sequence).collect();
    sequences.sort_unstable();
    assert_eq!(sequences, vec![0, 1]);

    // Materializing the same sync plan again is a no-op (§4.7 idempotency).
    let again =
        materialize_sync_plan(playback_store.as_ref(), h.executions.as_ref(), h.commands.as_ref(), &sync_plan).unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn no_worker_available_fails_the_execution_without_ever_reaching_a_shell() {
    let h = harness_with_workers(vec![]);
    let plan = Plan::builder().category(PlanCategory::Deploy).build();
    let execution = Execution::builder().plan_id(plan.id.clone()).build();
    h.executions.save(execution.clone()).unwrap();
    h.commands.save(&Command::builder().execution_id(execution.id.clone()).build()).unwrap();

    let ids = [execution.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();
    h.dispatcher.dispatch_batch(request(&plan, &ids, &envelope_for)).await.unwrap();

    let saved = h.executions.get(&execution.id).unwrap();
    assert_eq!(saved.status, ExecutionStatus::Failed);
    assert!(saved.reason.as_deref().unwrap_or_default().contains("valid worker"));
}

#[tokio::test]
async fn a_worker_that_dies_between_refresh_and_select_is_quarantined_then_recovers() {
    let worker = Worker::builder().platform(WorkerPlatform::Linux).build();
    let worker_id = worker.id.clone();
    let h = harness_with_workers(vec![worker]);
    h.probe.mark_unreachable(worker_id);

    let plan = Plan::builder().category(PlanCategory::Deploy).build();
    let first = Execution::builder().plan_id(plan.id.clone()).sequence(0).build();
    h.executions.save(first.clone()).unwrap();
    h.commands.save(&Command::builder().execution_id(first.id.clone()).build()).unwrap();

    let ids = [first.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();
    h.dispatcher.dispatch_batch(request(&plan, &ids, &envelope_for)).await.unwrap();

    let saved = h.executions.get(&first.id).unwrap();
    assert_eq!(saved.status, ExecutionStatus::Failed, "the only worker was unreachable at select time");
    assert_eq!(h.registry.worker_count(), 1, "the worker stays known, just quarantined");

    // The worker comes back and the quarantine window elapses.
    h.probe.clear_unreachable();
    h.clock.advance(DIRTY_TTL + std::time::Duration::from_secs(1));

    let second = Execution::builder().plan_id(plan.id.clone()).sequence(1).build();
    h.executions.save(second.clone()).unwrap();
    h.commands.save(&Command::builder().execution_id(second.id.clone()).build()).unwrap();
    let second_ids = [second.id.clone()];
    h.dispatcher.dispatch_batch(request(&plan, &second_ids, &envelope_for)).await.unwrap();
    assert_eq!(h.executions.get(&second.id).unwrap().status, ExecutionStatus::Dispatched);
}

#[tokio::test]
async fn an_unreachable_worker_is_quarantined_in_place_and_the_batch_dispatches_on_the_next_candidate() {
    let dead = Worker::builder().platform(WorkerPlatform::Linux).build();
    let dead_id = dead.id.clone();
    let alive = Worker::builder().platform(WorkerPlatform::Linux).build();
    let h = harness_with_workers(vec![dead, alive.clone()]);
    h.probe.mark_unreachable(dead_id.clone());

    let plan = Plan::builder().category(PlanCategory::Deploy).build();
    let execution = Execution::builder().plan_id(plan.id.clone()).build();
    h.executions.save(execution.clone()).unwrap();
    h.commands.save(&Command::builder().execution_id(execution.id.clone()).build()).unwrap();

    let ids = [execution.id.clone()];
    let envelope_for = |_: &Execution| envelope_inputs();
    h.dispatcher.dispatch_batch(request(&plan, &ids, &envelope_for)).await.unwrap();

    assert_eq!(
        h.executions.get(&execution.id).unwrap().status,
        ExecutionStatus::Dispatched,
        "the dead worker should be skipped in favor of the live one, not fail the batch"
    );
    assert_eq!(h.registry.worker_count(), 2, "both workers stay known; the dead one is merely quarantined");
}
