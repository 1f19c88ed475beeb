// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan entity (§3) — a unit of intent: an ordered set of executions.

use crate::environment::{AccountId, AssetId, EnvironmentId};
use crate::playback::PlaybackId;
use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a plan.
    pub struct PlanId("pln-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    Deploy,
    Sync,
}

crate::simple_display! {
    PlanCategory {
        Deploy => "deploy",
        Sync => "sync",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStrategy {
    FailedContinue,
    FailedStop,
}

crate::simple_display! {
    PlanStrategy {
        FailedContinue => "failed_continue",
        FailedStop => "failed_stop",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStrategy {
    AutoPromote,
    ManualPromote,
    NeverPromote,
}

crate::simple_display! {
    PlaybackStrategy {
        AutoPromote => "auto_promote",
        ManualPromote => "manual_promote",
        NeverPromote => "never_promote",
    }
}

/// A unit of intent (§3). Deploy plans carry a fixed asset+account; sync
/// plans resolve theirs per-execution at dispatch time (§4.2.d).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub tenant_id: TenantId,
    pub name: String,
    pub category: PlanCategory,
    pub plan_strategy: PlanStrategy,
    pub playback_strategy: PlaybackStrategy,
    pub environment_id: EnvironmentId,
    pub playback_id: Option<PlaybackId>,
    /// Set only for deploy plans (§3 invariant).
    pub asset_id: Option<AssetId>,
    pub account_id: Option<AccountId>,
    pub review_required: bool,
}

impl Plan {
    pub fn is_sync(&self) -> bool {
        self.category == PlanCategory::Sync
    }

    /// §3 invariant: a deploy plan has asset+account set; a sync plan has
    /// neither until late-binding.
    pub fn invariant_holds(&self) -> bool {
        match self.category {
            PlanCategory::Deploy => self.asset_id.is_some() && self.account_id.is_some(),
            PlanCategory::Sync => self.asset_id.is_none() && self.account_id.is_none(),
        }
    }
}

crate::builder! {
    pub struct PlanBuilder => Plan {
        into {
            name: String = "plan-1",
        }
        set {
            tenant_id: TenantId = TenantId::new("default"),
            category: PlanCategory = PlanCategory::Deploy,
            plan_strategy: PlanStrategy = PlanStrategy::FailedStop,
            playback_strategy: PlaybackStrategy = PlaybackStrategy::AutoPromote,
            environment_id: EnvironmentId = EnvironmentId::new(),
            review_required: bool = false,
        }
        option {
            playback_id: PlaybackId = None,
            asset_id: AssetId = None,
            account_id: AccountId = None,
        }
        computed {
            id: PlanId = PlanId::new(),
        }
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
