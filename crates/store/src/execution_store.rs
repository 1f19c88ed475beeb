// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution store (§5: "The Command Store and Execution store are the
//! system of record") — concurrent readers, per-row writers. Holds the
//! authoritative copy of every [`Execution`] the Batch Dispatcher walks.

use std::collections::HashMap;

use behemoth_core::{Execution, ExecutionId, PlanId};
use parking_lot::RwLock;

use crate::error::StoreError;

pub trait ExecutionStore: Send + Sync {
    fn get(&self, id: &ExecutionId) -> Option<Execution>;

    fn save(&self, execution: Execution) -> Result<(), StoreError>;

    /// Executions belonging to one plan, in dispatch order (§4.2).
    fn list_for_plan(&self, plan_id: &PlanId) -> Vec<Execution>;
}

#[derive(Default)]
pub struct InMemoryExecutionStore {
    executions: RwLock<HashMap<ExecutionId, Execution>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionStore for InMemoryExecutionStore {
    fn get(&self, id: &ExecutionId) -> Option<Execution> {
        self.executions.read().get(id).cloned()
    }

    fn save(&self, execution: Execution) -> Result<(), StoreError> {
        self.executions.write().insert(execution.id.clone(), execution);
        Ok(())
    }

    fn list_for_plan(&self, plan_id: &PlanId) -> Vec<Execution> {
        let mut executions: Vec<Execution> = self
            .executions
            .read()
            .values()
            .filter(|e| &e.plan_id == plan_id)
            .cloned()
            .collect();
        executions.sort_by_key(|e| e.sequence);
        executions
    }
}

#[cfg(test)]
#[path = "execution_store_tests.rs"]
mod tests;
