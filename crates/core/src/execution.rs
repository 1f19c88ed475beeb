// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution entity (§3, §6) — one worker-bound run of a plan's commands.

use crate::environment::{AccountId, AssetId};
use crate::limits::{truncate, MAX_REASON_LEN};
use crate::plan::PlanId;
use crate::tenant::TenantId;
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an execution.
    pub struct ExecutionId("exe-");
}

/// What kind of payload this execution carries (§3). Orthogonal to the
/// owning plan's `deploy`/`sync` category: a `File` execution is a
/// file-bearing upload (§6.1 `/plans/{id}/upload`) regardless of which kind
/// of plan it belongs to, and a `Pause`-category execution (not the first
/// in its batch) always halts the dispatcher when it carries any command
/// (§4.2 tie-breaks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionCategory {
    Cmd,
    File,
    Pause,
}

crate::simple_display! {
    ExecutionCategory {
        Cmd => "cmd",
        File => "file",
        Pause => "pause",
    }
}

/// Execution state machine (§6.1). Transitions are validated by
/// [`Execution::can_transition_to`]; the dispatcher and callback endpoint are
/// the only two writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Dispatched,
    Running,
    Succeeded,
    Failed,
    Paused,
    Skipped,
}

crate::simple_display! {
    ExecutionStatus {
        Pending => "pending",
        Dispatched => "dispatched",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Paused => "paused",
        Skipped => "skipped",
    }
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    /// Valid edges of the execution state machine (§6.1). `Paused` is
    /// reachable from `Dispatched` or `Running` and resumes back to
    /// `Dispatched`; operator-driven, not a worker callback. `Dispatched`
    /// can fail directly, without ever reaching `Running`: late binding,
    /// worker acquisition, and agent invocation can all fail before the
    /// dispatcher ever hears back from the worker (§4.2.d, §4.2.e). A
    /// pause-category execution that opens a batch is pre-consented
    /// straight from `Pending`, never touching `Dispatched`/`Running`
    /// (§4.2 step b); an operator's explicit success override
    /// (`operate_task` §6.1) can likewise close out a `Paused` execution
    /// directly, without re-running its command.
    pub fn can_transition_to(self, next: Self) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (Pending, Dispatched)
                | (Dispatched, Running)
                | (Dispatched, Paused)
                | (Dispatched, Failed)
                | (Running, Paused)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Paused, Dispatched)
                | (Paused, Succeeded)
                | (Pending, Succeeded)
                | (Pending, Skipped)
        )
    }
}

/// One worker-bound run of a plan's ordered commands.
///
/// For sync plans, `asset_id`/`account_id` start unset and are resolved by
/// the dispatcher from `asset_hint`/`account_hint` against the plan's
/// environment (§4.2.d late binding) before the first command is sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub tenant_id: TenantId,
    pub plan_id: PlanId,
    pub name: String,
    /// Carried into a promoted [`crate::playback::PlaybackExecution`] as
    /// its replay version tag (§3, §4.7).
    pub version: String,
    pub category: ExecutionCategory,
    pub status: ExecutionStatus,
    /// Set alongside every status transition (§4.4); truncated to
    /// [`MAX_REASON_LEN`].
    pub reason: Option<String>,
    pub sequence: u32,
    pub worker_id: Option<WorkerId>,
    pub asset_id: Option<AssetId>,
    pub account_id: Option<AccountId>,
    /// Late-binding target hint (asset name suffix), sync plans only.
    pub asset_hint: Option<String>,
    /// Late-binding target hint (account username), sync plans only.
    pub account_hint: Option<String>,
    /// The target asset's label, used by the Worker Registry's
    /// label-affinity selection (§4.1); unset selects from the unlabeled
    /// default worker pool.
    pub worker_label_hint: Option<String>,
}

impl Execution {
    /// Move to `next` and record `reason`, per §4.4's "each transition is
    /// persisted atomically with reason". Returns `false` (and leaves the
    /// execution untouched) if the edge isn't valid; the caller decides
    /// whether that's a bug or a no-op idempotent replay.
    pub fn transition_to(&mut self, next: ExecutionStatus, reason: impl AsRef<str>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.reason = Some(truncate(reason.as_ref(), MAX_REASON_LEN));
        true
    }

    /// True when this execution still carries a late-binding hint and
    /// hasn't resolved an asset yet (§4.2.d). Sync-plan executions start
    /// this way; deploy-plan executions never do, since their asset is
    /// set at plan creation and no hint is ever attached.
    pub fn needs_late_binding(&self) -> bool {
        self.asset_id.is_none() && self.asset_hint.is_some()
    }

    /// Resolve `asset_hint`/`account_hint` against `env`, per §4.2.d.
    /// Returns `Err` if either hint fails to match; leaves the execution
    /// untouched on failure so the caller can surface a pause reason.
    pub fn bind_targets(
        &mut self,
        env: &crate::environment::Environment,
    ) -> Result<(), crate::error::LateBindingError> {
        use crate::error::LateBindingError;

        let asset_hint = self
            .asset_hint
            .as_deref()
            .ok_or(LateBindingError::MissingAssetHint)?;
        let asset = env
            .find_asset_by_suffix(asset_hint)
            .ok_or_else(|| LateBindingError::NoMatchingAsset(asset_hint.to_string()))?;
        let account_hint = self
            .account_hint
            .as_deref()
            .ok_or(LateBindingError::MissingAccountHint)?;
        let account = asset
            .find_account_by_username(account_hint)
            .ok_or_else(|| LateBindingError::NoMatchingAccount(account_hint.to_string()))?;
        self.asset_id = Some(asset.id.clone());
        self.account_id = Some(account.id.clone());
        Ok(())
    }
}

crate::builder! {
    pub struct ExecutionBuilder => Execution {
        into {
            name: String = "execution-1",
            version: String = "v1",
        }
        set {
            tenant_id: TenantId = TenantId::new("default"),
            plan_id: PlanId = PlanId::new(),
            category: ExecutionCategory = ExecutionCategory::Cmd,
            status: ExecutionStatus = ExecutionStatus::Pending,
            sequence: u32 = 0,
        }
        option {
            worker_id: WorkerId = None,
            asset_id: AssetId = None,
            account_id: AccountId = None,
            asset_hint: String = None,
            account_hint: String = None,
            worker_label_hint: String = None,
            reason: String = None,
        }
        computed {
            id: ExecutionId = ExecutionId::new(),
        }
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
