// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! behemoth-core: domain model shared by every Behemoth crate.

pub mod macros;

pub mod clock;
pub mod command;
pub mod environment;
pub mod error;
pub mod execution;
pub mod id;
pub mod instruction;
pub mod limits;
pub mod plan;
pub mod playback;
pub mod tenant;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{Command, CommandId, CommandStatus};
pub use environment::{Account, AccountId, Asset, AssetId, Environment, EnvironmentId};
pub use error::LateBindingError;
pub use execution::{Execution, ExecutionCategory, ExecutionId, ExecutionStatus};
pub use id::short;
pub use instruction::{Instruction, InstructionId};
pub use limits::{truncate, MAX_OUTPUT_LEN, MAX_REASON_LEN};
pub use plan::{Plan, PlanCategory, PlanId, PlanStrategy, PlaybackStrategy};
pub use playback::{
    MonthlyVersion, MonthlyVersionId, Playback, PlaybackExecution, PlaybackExecutionId,
    PlaybackExecutionStatus, PlaybackId,
};
pub use tenant::TenantId;
pub use worker::{Worker, WorkerId, WorkerPlatform};

#[cfg(any(test, feature = "test-support"))]
pub use command::CommandBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use environment::EnvironmentBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use execution::ExecutionBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use instruction::InstructionBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use plan::PlanBuilder;
#[cfg(any(test, feature = "test-support"))]
pub use playback::{MonthlyVersionBuilder, PlaybackBuilder, PlaybackExecutionBuilder};
#[cfg(any(test, feature = "test-support"))]
pub use worker::WorkerBuilder;
