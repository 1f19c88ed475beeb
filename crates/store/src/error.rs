// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("command store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("command store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("no playback execution found with id {0}")]
    PlaybackExecutionNotFound(behemoth_core::PlaybackExecutionId),
    #[error("sync-plan materialization: source execution {0} no longer exists")]
    SourceExecutionNotFound(behemoth_core::ExecutionId),
}
