// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use behemoth_core::WorkerId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("not found a valid worker")]
    NoWorkerAvailable,
    #[error("worker [{0}] is not valid")]
    WorkerNotValid(WorkerId),
}
