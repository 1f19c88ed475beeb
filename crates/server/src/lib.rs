// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! behemoth-server: the Control API (§6.1) — plan/execution/status-stream
//! HTTP routes over the Batch Dispatcher.

pub mod app_state;
pub mod config;
pub mod envelope_resolver;
pub mod error;
pub mod routes;
pub mod status_stream;
pub mod sync_coordination;

pub use app_state::AppState;
pub use config::ServerConfig;
pub use envelope_resolver::EnvelopeResolver;
pub use error::ApiError;
pub use routes::router;
pub use status_stream::FileStatusSink;
pub use sync_coordination::{Approval, SyncCoordinator};
