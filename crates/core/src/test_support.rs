// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::command::{Command, CommandStatus};
use crate::environment::{Account, AccountId, Asset, AssetId, Environment};
use crate::execution::{Execution, ExecutionStatus};
use crate::plan::{Plan, PlanCategory};
use crate::worker::Worker;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::command::CommandStatus;
    use crate::execution::ExecutionStatus;
    use proptest::prelude::*;

    pub fn arb_execution_status() -> impl Strategy<Value = ExecutionStatus> {
        prop_oneof![
            Just(ExecutionStatus::Pending),
            Just(ExecutionStatus::Dispatched),
            Just(ExecutionStatus::Running),
            Just(ExecutionStatus::Succeeded),
            Just(ExecutionStatus::Failed),
            Just(ExecutionStatus::Paused),
            Just(ExecutionStatus::Skipped),
        ]
    }

    pub fn arb_command_status() -> impl Strategy<Value = CommandStatus> {
        prop_oneof![
            Just(CommandStatus::Pending),
            Just(CommandStatus::Sent),
            Just(CommandStatus::Succeeded),
            Just(CommandStatus::Failed),
        ]
    }
}

// ── Fixture factories ────────────────────────────────────────────────────

/// A worker with one label, ready to be label-matched against a plan.
pub fn labeled_worker(label: &str) -> Worker {
    Worker::builder().labels(vec![label.to_string()]).build()
}

/// An environment with a single asset/account pair, for late-binding tests.
pub fn single_asset_environment(asset_name: &str, account_username: &str) -> Environment {
    Environment::builder()
        .assets(vec![Asset {
            id: AssetId::new(),
            name: asset_name.to_string(),
            accounts: vec![Account { id: AccountId::new(), username: account_username.to_string() }],
        }])
        .build()
}

/// A deploy plan with asset/account already bound, satisfying the plan
/// invariant without needing an environment lookup.
pub fn bound_deploy_plan() -> Plan {
    Plan::builder()
        .category(PlanCategory::Deploy)
        .asset_id(AssetId::new())
        .account_id(AccountId::new())
        .build()
}

/// A sync plan with no bound targets, as the dispatcher would see it before
/// late binding resolves the first execution.
pub fn unbound_sync_plan() -> Plan {
    Plan::builder().category(PlanCategory::Sync).build()
}

/// An execution dispatched to `worker`, ready for a callback.
pub fn dispatched_execution(worker: &Worker) -> Execution {
    Execution::builder()
        .status(ExecutionStatus::Dispatched)
        .worker_id(worker.id.clone())
        .build()
}

/// A sync-plan execution still carrying unresolved late-binding hints.
pub fn unbound_sync_execution(asset_hint: &str, account_hint: &str) -> Execution {
    Execution::builder().asset_hint(asset_hint).account_hint(account_hint).build()
}

/// A command already sent to an agent, ready for a success/failure callback.
pub fn sent_command(execution_id: crate::execution::ExecutionId) -> Command {
    Command::builder().execution_id(execution_id).status(CommandStatus::Sent).build()
}
