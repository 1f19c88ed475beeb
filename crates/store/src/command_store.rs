// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command Store (§4.5) — the pluggable backend that records every
//! command's input/output. Grounded on the original system's
//! `backends/db.py` (relational) and `backends/es.py` (indexed) pair, both
//! implementing the same query surface over a common filter shape.

use std::collections::HashMap;

use behemoth_core::{Command, CommandId, ExecutionId};

use crate::error::StoreError;

/// Query parameters shared by both backends (§4.5). A date range with
/// neither bound set returns everything; `execution_id` narrows to one
/// execution's commands; `text_contains` matches substrings of either the
/// command body or its recorded output.
#[derive(Debug, Clone, Default)]
pub struct CommandFilter {
    pub execution_id: Option<ExecutionId>,
    pub date_from_epoch_ms: Option<u64>,
    pub date_to_epoch_ms: Option<u64>,
    pub text_contains: Option<String>,
}

impl CommandFilter {
    pub fn for_execution(execution_id: ExecutionId) -> Self {
        Self { execution_id: Some(execution_id), ..Default::default() }
    }
}

/// Pluggable storage backend for commands (§4.5 REDESIGN FLAG: one trait,
/// two implementations — an in-memory/relational one and a durable,
/// append-only one, instead of a `getattr`-style dynamic backend lookup).
pub trait CommandStore: Send + Sync {
    fn save(&self, command: &Command) -> Result<(), StoreError>;

    fn bulk_save(&self, commands: &[Command]) -> Result<(), StoreError> {
        for command in commands {
            self.save(command)?;
        }
        Ok(())
    }

    fn query(&self, filter: &CommandFilter) -> Result<Vec<Command>, StoreError>;

    fn count(&self, filter: &CommandFilter) -> Result<usize, StoreError> {
        Ok(self.query(filter)?.len())
    }
}

/// Collapse a `query` result down to the most recently saved row per
/// command id, ordered by sequence. Both `CommandStore` backends are
/// append-only (§4.5): a command saved twice (once at creation, again once
/// its callback lands) leaves both versions in `query`'s result, so any
/// caller that cares about a command's *current* state — not its whole
/// history — needs this before filtering by status.
pub fn latest_by_id(commands: Vec<Command>) -> Vec<Command> {
    let mut latest: HashMap<CommandId, Command> = HashMap::new();
    for command in commands {
        latest.insert(command.id.clone(), command);
    }
    let mut ordered: Vec<Command> = latest.into_values().collect();
    ordered.sort_by_key(|c| c.sequence);
    ordered
}

pub(crate) fn matches(command: &Command, filter: &CommandFilter, saved_at_ms: u64) -> bool {
    if let Some(execution_id) = &filter.execution_id {
        if &command.execution_id != execution_id {
            return false;
        }
    }
    if let Some(from) = filter.date_from_epoch_ms {
        if saved_at_ms < from {
            return false;
        }
    }
    if let Some(to) = filter.date_to_epoch_ms {
        if saved_at_ms > to {
            return false;
        }
    }
    if let Some(needle) = &filter.text_contains {
        let in_body = command.body.contains(needle.as_str());
        let in_output = command.output.as_deref().is_some_and(|o| o.contains(needle.as_str()));
        if !in_body && !in_output {
            return false;
        }
    }
    true
}
