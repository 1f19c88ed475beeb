// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command entity (§3, §4.5) — one instruction sent to an agent within an
//! execution, and its recorded outcome.

use crate::execution::ExecutionId;
use crate::limits::{truncate, MAX_OUTPUT_LEN, MAX_REASON_LEN};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a command.
    pub struct CommandId("cmd-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Pending,
    Sent,
    Succeeded,
    Failed,
}

crate::simple_display! {
    CommandStatus {
        Pending => "pending",
        Sent => "sent",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// One instruction within an execution's ordered command list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub execution_id: ExecutionId,
    pub sequence: u32,
    pub body: String,
    pub status: CommandStatus,
    pub output: Option<String>,
    pub error_reason: Option<String>,
}

impl Command {
    /// Record a successful callback (§4.6 Callback Endpoint), truncating
    /// output to [`MAX_OUTPUT_LEN`] per the Command Store's size limits.
    pub fn record_success(&mut self, output: impl AsRef<str>) {
        self.status = CommandStatus::Succeeded;
        self.output = Some(truncate(output.as_ref(), MAX_OUTPUT_LEN));
        self.error_reason = None;
    }

    /// Record a failed callback; the plan-strategy (§3 `PlanStrategy`)
    /// decides whether this pauses or continues the batch.
    pub fn record_failure(&mut self, reason: impl AsRef<str>) {
        self.status = CommandStatus::Failed;
        self.error_reason = Some(truncate(reason.as_ref(), MAX_REASON_LEN));
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, CommandStatus::Succeeded | CommandStatus::Failed)
    }
}

crate::builder! {
    pub struct CommandBuilder => Command {
        into {
            body: String = "echo ok",
        }
        set {
            execution_id: ExecutionId = ExecutionId::new(),
            sequence: u32 = 0,
            status: CommandStatus = CommandStatus::Pending,
        }
        option {
            output: String = None,
            error_reason: String = None,
        }
        computed {
            id: CommandId = CommandId::new(),
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
