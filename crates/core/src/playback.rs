// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playback entity (§3, §4.7) — the recorded history a plan's executions
//! accumulate, grouped into monthly versions for promotion.

use crate::plan::PlanId;
use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a playback.
    pub struct PlaybackId("pbk-");
}

crate::define_id! {
    /// Unique identifier for a recorded playback execution.
    pub struct PlaybackExecutionId("pbx-");
}

crate::define_id! {
    /// Unique identifier for a monthly version grouping.
    pub struct MonthlyVersionId("mvr-");
}

/// A named recording stream a plan's sync executions append to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playback {
    pub id: PlaybackId,
    pub tenant_id: TenantId,
    pub plan_id: PlanId,
    pub name: String,
}

crate::builder! {
    pub struct PlaybackBuilder => Playback {
        into {
            name: String = "playback-1",
        }
        set {
            tenant_id: TenantId = TenantId::new("default"),
            plan_id: PlanId = PlanId::new(),
        }
        computed {
            id: PlaybackId = PlaybackId::new(),
        }
    }
}

/// A monthly grouping of playback executions awaiting or past promotion
/// (§4.7, playback-strategy). Promotion never mutates past versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyVersion {
    pub id: MonthlyVersionId,
    pub playback_id: PlaybackId,
    /// e.g. `"2026-07"`, derived from the recording clock (§1 `Clock`).
    pub label: String,
    pub promoted: bool,
}

crate::builder! {
    pub struct MonthlyVersionBuilder => MonthlyVersion {
        into {
            label: String = "2026-01",
        }
        set {
            playback_id: PlaybackId = PlaybackId::new(),
            promoted: bool = false,
        }
        computed {
            id: MonthlyVersionId = MonthlyVersionId::new(),
        }
    }
}

/// Promotion state of one recorded execution within a playback (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackExecutionStatus {
    Recorded,
    Promoted,
    Rejected,
}

crate::simple_display! {
    PlaybackExecutionStatus {
        Recorded => "recorded",
        Promoted => "promoted",
        Rejected => "rejected",
    }
}

/// One execution's recorded output, filed under a monthly version (§4.7).
/// Binds `(playback, execution, plan-name, asset-name, account-username,
/// execution-version)` per §3's Playback entity, so a later sync-plan
/// materialization (§4.7) can clone a fresh execution without re-reading
/// the (possibly long gone) source plan/asset/account rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackExecution {
    pub id: PlaybackExecutionId,
    pub playback_id: PlaybackId,
    pub monthly_version_id: MonthlyVersionId,
    pub execution_id: crate::execution::ExecutionId,
    pub status: PlaybackExecutionStatus,
    pub plan_name: String,
    pub asset_name_display: String,
    pub account_username_display: String,
    pub version: String,
    /// Recorded command output, truncated per [`crate::limits::MAX_OUTPUT_LEN`].
    pub recorded_output: String,
}

impl PlaybackExecution {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            PlaybackExecutionStatus::Promoted | PlaybackExecutionStatus::Rejected
        )
    }
}

crate::builder! {
    pub struct PlaybackExecutionBuilder => PlaybackExecution {
        into {
            plan_name: String = "plan-1",
            asset_name_display: String = "asset-1",
            account_username_display: String = "svc",
            version: String = "v1",
            recorded_output: String = "",
        }
        set {
            playback_id: PlaybackId = PlaybackId::new(),
            monthly_version_id: MonthlyVersionId = MonthlyVersionId::new(),
            execution_id: crate::execution::ExecutionId = crate::execution::ExecutionId::new(),
            status: PlaybackExecutionStatus = PlaybackExecutionStatus::Recorded,
        }
        computed {
            id: PlaybackExecutionId = PlaybackExecutionId::new(),
        }
    }
}

#[cfg(test)]
#[path = "playback_tests.rs"]
mod tests;
