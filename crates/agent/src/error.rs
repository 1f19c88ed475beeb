// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Failure modes of the Remote Agent Driver (§4.3). Each variant bubbles to
/// the Batch Dispatcher as a typed error; none of them are retried here.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("secure-shell connect to {0} failed: {1}")]
    Connect(String, String),

    #[error("secure-shell io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("secure-shell protocol error: {0}")]
    Ssh(#[from] ssh2::Error),

    #[error("blocking shell task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("failed to serialize agent envelope: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("bearer token shorter than {0} bytes, cannot derive bundle key")]
    TokenTooShort(usize),

    #[error("remote checksum command produced no parsable output")]
    ChecksumUnparsable,

    #[error("bundle decryption failed: {0}")]
    Decrypt(String),

    #[error("upload to {0} failed: {1}")]
    Upload(String, String),

    #[error("agent reported a fatal error: {0}")]
    AgentStderr(String),
}
