// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable, append-only JSON-lines command store — grounded on the same
//! `backends/db.py` idea as [`crate::memory::InMemoryCommandStore`], but
//! backed by a file so commands survive a restart (§4.5).

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use behemoth_core::{Clock, Command};
use parking_lot::Mutex;

use crate::command_store::{CommandFilter, CommandStore};
use crate::error::StoreError;
use crate::memory::InMemoryCommandStore;

pub struct JsonFileCommandStore<C: Clock> {
    memory: InMemoryCommandStore<C>,
    path: PathBuf,
    file: Mutex<File>,
}

impl<C: Clock> JsonFileCommandStore<C> {
    /// Open (creating if needed) the JSON-lines file at `path`, replaying
    /// any previously recorded commands into the in-memory index.
    pub fn open(path: impl AsRef<Path>, clock: C) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let memory = InMemoryCommandStore::new(clock);

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let command: Command = serde_json::from_str(&line)?;
                // Replaying through `save` re-stamps the saved-at time to
                // now; acceptable since the filter's date range is a
                // convenience, not an audit trail (§4.5 Non-goals).
                memory.save(&command)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { memory, path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<C: Clock> CommandStore for JsonFileCommandStore<C> {
    fn save(&self, command: &Command) -> Result<(), StoreError> {
        self.memory.save(command)?;
        let mut line = serde_json::to_string(command)?;
        line.push('\n');
        self.file.lock().write_all(line.as_bytes())?;
        Ok(())
    }

    fn query(&self, filter: &CommandFilter) -> Result<Vec<Command>, StoreError> {
        self.memory.query(filter)
    }
}

#[cfg(test)]
#[path = "json_file_tests.rs"]
mod tests;
