// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! behemoth-store: the Command Store and Playback Recorder (§4.5, §4.7).

pub mod command_store;
pub mod error;
pub mod execution_store;
pub mod json_file;
pub mod memory;
pub mod playback_store;

pub use command_store::{latest_by_id, CommandFilter, CommandStore};
pub use error::StoreError;
pub use execution_store::{ExecutionStore, InMemoryExecutionStore};
pub use json_file::JsonFileCommandStore;
pub use memory::InMemoryCommandStore;
pub use playback_store::{
    materialize_sync_plan, monthly_label, record_completed_execution, InMemoryPlaybackStore,
    PlaybackStore,
};
