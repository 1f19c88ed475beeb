// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status Stream producer side (§4.8) — a per-task append-only log the
//! dispatcher and callback endpoint write colored lines to. Grounded on the
//! teacher's `AgentLogger` (append-only, per-id file under a log dir); here
//! the consumer (file + websocket fan-out) lives in the server crate, so
//! this crate only defines the narrow producer trait the dispatcher needs.

use std::fmt;

/// Line severity, mapped to ANSI color by an implementation (§4.8: cyan
/// informational, green success, yellow warn, red error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warn,
    Error,
}

impl Severity {
    /// ANSI SGR color code, per §4.8.
    pub fn ansi_code(self) -> &'static str {
        match self {
            Severity::Info => "36",
            Severity::Success => "32",
            Severity::Warn => "33",
            Severity::Error => "31",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warn => "warn",
            Severity::Error => "error",
        })
    }
}

/// Where the dispatcher and callback endpoint append status lines, keyed by
/// task (execution batch) id. Implementations decide durability and
/// fan-out; the dispatcher only needs the write side.
pub trait StatusSink: Send + Sync {
    fn append(&self, task_id: &str, severity: Severity, message: &str);

    fn info(&self, task_id: &str, message: impl AsRef<str>) {
        self.append(task_id, Severity::Info, message.as_ref());
    }

    fn success(&self, task_id: &str, message: impl AsRef<str>) {
        self.append(task_id, Severity::Success, message.as_ref());
    }

    fn warn(&self, task_id: &str, message: impl AsRef<str>) {
        self.append(task_id, Severity::Warn, message.as_ref());
    }

    fn error(&self, task_id: &str, message: impl AsRef<str>) {
        self.append(task_id, Severity::Error, message.as_ref());
    }
}

/// Format one line the way a file/websocket consumer would render it:
/// `\x1b[{code}m{message}\x1b[0m`.
pub fn colorize(severity: Severity, message: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", severity.ansi_code(), message)
}

#[cfg(any(test, feature = "test-support"))]
pub mod recording {
    use super::{Severity, StatusSink};
    use parking_lot::Mutex;

    /// In-memory recorder for tests: captures every appended line in order.
    #[derive(Default)]
    pub struct RecordingStatusSink {
        lines: Mutex<Vec<(String, Severity, String)>>,
    }

    impl RecordingStatusSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn lines_for(&self, task_id: &str) -> Vec<(Severity, String)> {
            self.lines
                .lock()
                .iter()
                .filter(|(id, _, _)| id == task_id)
                .map(|(_, sev, msg)| (*sev, msg.clone()))
                .collect()
        }
    }

    impl StatusSink for RecordingStatusSink {
        fn append(&self, task_id: &str, severity: Severity, message: &str) {
            self.lines.lock().push((task_id.to_string(), severity, message.to_string()));
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
