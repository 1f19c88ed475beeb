// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status Stream consumer side (§4.8) — appends colored lines to a per-task
//! log file and fans them out to subscribed websocket clients. Grounded on
//! the teacher's `AgentLogger` (append-only per-id file under a log dir);
//! the broadcast fan-out is the part the teacher has no analog for, since
//! its logger has no live subscriber surface.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use behemoth_dispatch::{colorize, Severity, StatusSink};
use parking_lot::RwLock;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

pub struct FileStatusSink {
    log_dir: PathBuf,
    channels: RwLock<HashMap<String, broadcast::Sender<String>>>,
}

impl FileStatusSink {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir, channels: RwLock::new(HashMap::new()) }
    }

    fn log_path(&self, task_id: &str) -> PathBuf {
        self.log_dir.join(format!("{task_id}.log"))
    }

    fn channel(&self, task_id: &str) -> broadcast::Sender<String> {
        if let Some(tx) = self.channels.read().get(task_id) {
            return tx.clone();
        }
        self.channels
            .write()
            .entry(task_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// New websocket subscribers call this first to backfill history, then
    /// [`subscribe`](Self::subscribe) for lines appended afterward.
    pub fn replay(&self, task_id: &str) -> Vec<String> {
        let Ok(file) = fs::File::open(self.log_path(task_id)) else {
            return Vec::new();
        };
        std::io::BufReader::new(file).lines().map_while(Result::ok).collect()
    }

    pub fn subscribe(&self, task_id: &str) -> broadcast::Receiver<String> {
        self.channel(task_id).subscribe()
    }

    fn write_line(&self, task_id: &str, line: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.log_dir)?;
        let mut file = OpenOptions::new().create(true).append(true).open(self.log_path(task_id))?;
        writeln!(file, "{line}")
    }
}

impl StatusSink for FileStatusSink {
    fn append(&self, task_id: &str, severity: Severity, message: &str) {
        let line = colorize(severity, message);
        if let Err(e) = self.write_line(task_id, &line) {
            tracing::warn!(task_id, error = %e, "failed to write status line");
        }
        // No receivers yet is the common case (no websocket client attached
        // this moment); the send failing is not an error.
        let _ = self.channel(task_id).send(line);
    }
}

#[cfg(test)]
#[path = "status_stream_tests.rs"]
mod tests;
