// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment entity (§3) — a set of target assets addressable by a Plan.

use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an environment.
    pub struct EnvironmentId("env-");
}

crate::define_id! {
    /// Unique identifier for an asset within an environment.
    pub struct AssetId("ast-");
}

crate::define_id! {
    /// Unique identifier for an account on an asset.
    pub struct AccountId("acc-");
}

/// One database asset reachable within an environment (§3, §4.2.d late binding).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    pub accounts: Vec<Account>,
}

/// One account usable against an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
}

/// A set of target assets of a supported database family (§3 invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub tenant_id: TenantId,
    pub name: String,
    pub assets: Vec<Asset>,
}

impl Environment {
    /// Late-binding asset lookup (§4.2.d, §9 Open Question): find the one
    /// asset whose name ends with `suffix`.
    pub fn find_asset_by_suffix(&self, suffix: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name.ends_with(suffix))
    }
}

impl Asset {
    pub fn find_account_by_username(&self, username: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.username == username)
    }
}

crate::builder! {
    pub struct EnvironmentBuilder => Environment {
        into {
            name: String = "env-1",
        }
        set {
            tenant_id: TenantId = TenantId::new("default"),
            assets: Vec<Asset> = Vec::new(),
        }
        computed {
            id: EnvironmentId = EnvironmentId::new(),
        }
    }
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
