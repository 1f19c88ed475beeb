// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! behemoth-dispatch: the Batch Dispatcher and Worker Pool (§4.2, §4.3).

pub mod dispatcher;
pub mod error;
pub mod status;
pub mod worker_pool;

pub use dispatcher::{BatchDispatcher, BatchRequest};
pub use error::DispatchError;
pub use status::{colorize, Severity, StatusSink};
pub use worker_pool::{EnvelopeInputs, WorkRequest, WorkerPool};

#[cfg(any(test, feature = "test-support"))]
pub use status::recording::RecordingStatusSink;
