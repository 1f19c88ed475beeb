// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instruction entity — a plan-scoped ordered note shown to operators
//! reviewing a plan before it dispatches (supplemented from the original
//! system's plan-authoring workflow; not named in the distilled data model
//! but not excluded by any Non-goal either).

use crate::plan::PlanId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an instruction.
    pub struct InstructionId("ins-");
}

/// One ordered note attached to a plan, surfaced in the Control API's plan
/// detail view ahead of its commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstructionId,
    pub plan_id: PlanId,
    pub sequence: u32,
    pub body: String,
}

crate::builder! {
    pub struct InstructionBuilder => Instruction {
        into {
            body: String = "",
        }
        set {
            plan_id: PlanId = PlanId::new(),
            sequence: u32 = 0,
        }
        computed {
            id: InstructionId = InstructionId::new(),
        }
    }
}

#[cfg(test)]
#[path = "instruction_tests.rs"]
mod tests;
