// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory command store — the relational-backend analog (§4.5).

use behemoth_core::{Clock, Command};
use parking_lot::RwLock;

use crate::command_store::{matches, CommandFilter, CommandStore};
use crate::error::StoreError;

struct Entry {
    command: Command,
    saved_at_ms: u64,
}

pub struct InMemoryCommandStore<C: Clock> {
    clock: C,
    entries: RwLock<Vec<Entry>>,
}

impl<C: Clock> InMemoryCommandStore<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, entries: RwLock::new(Vec::new()) }
    }
}

impl<C: Clock> CommandStore for InMemoryCommandStore<C> {
    fn save(&self, command: &Command) -> Result<(), StoreError> {
        let saved_at_ms = self.clock.epoch_ms();
        self.entries.write().push(Entry { command: command.clone(), saved_at_ms });
        Ok(())
    }

    fn query(&self, filter: &CommandFilter) -> Result<Vec<Command>, StoreError> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|e| matches(&e.command, filter, e.saved_at_ms))
            .map(|e| e.command.clone())
            .collect())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
