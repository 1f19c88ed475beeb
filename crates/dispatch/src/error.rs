// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the Batch Dispatcher and Worker Pool (§4.2, §4.3).

use behemoth_agent::AgentError;
use behemoth_core::{ExecutionId, LateBindingError};
use behemoth_registry::RegistryError;
use thiserror::Error;

/// A cooperative halt of the batch, distinct from a failure (§4.2.f).
/// Rust has no exception hierarchy to catch selectively, so the original
/// system's `PauseException` becomes a dedicated variant the dispatcher
/// matches on rather than a thrown/caught type (§9 REDESIGN FLAGS).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("task is running or finished")]
    AlreadyRunningOrFinished,
    #[error("no valid worker found")]
    NoWorkerAvailable,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    LateBinding(#[from] LateBindingError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("execution {0} not found")]
    ExecutionNotFound(ExecutionId),
    /// A pause-category command (not the batch's first execution) halted
    /// the batch cooperatively; carries the command's input/output as
    /// human-readable context (§4.2 tie-breaks).
    #[error("paused: {reason}")]
    Pause { reason: String },
}

impl DispatchError {
    /// True for the variant the dispatcher treats as a cooperative halt
    /// (`pause`) rather than a hard failure (§4.2.f/g).
    pub fn is_pause(&self) -> bool {
        matches!(self, Self::Pause { .. })
    }
}
