// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error types for the core domain model.

use thiserror::Error;

/// Failure to resolve a sync execution's late-binding hints against an
/// environment (§4.2.d).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LateBindingError {
    #[error("execution has no asset hint to bind")]
    MissingAssetHint,
    #[error("execution has no account hint to bind")]
    MissingAccountHint,
    #[error("no asset in environment matches suffix '{0}'")]
    NoMatchingAsset(String),
    #[error("no account '{0}' on matched asset")]
    NoMatchingAccount(String),
}
