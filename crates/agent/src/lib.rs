// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! behemoth-agent: the Remote Agent Driver, bundle crypto, and invocation
//! envelope (§4.3, §6.2, §6.3).

pub mod bundle;
pub mod crypto;
pub mod driver;
pub mod envelope;
pub mod error;
pub mod platform;
pub mod shell;

pub use driver::AgentDriver;
pub use envelope::{AgentEnvelope, AuthParams, CommandType};
pub use error::AgentError;
pub use platform::{profile_for, PlatformProfile};
pub use shell::{
    CredentialResolver, SecureShell, ShellFactory, ShellOutput, Ssh2Session, Ssh2ShellFactory,
    DEFAULT_CONNECT_TIMEOUT,
};

#[cfg(any(test, feature = "test-support"))]
pub use shell::{FakeShell, FakeShellFactory};
