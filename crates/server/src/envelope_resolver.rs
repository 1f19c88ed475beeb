// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the dialect/credential pieces of an invocation envelope from a
//! bound execution (§1 Non-goals: "we do not specify the database dialects
//! being run against target assets" / credential storage). The Control API
//! is as far from that knowledge as the dispatcher is, so it holds the same
//! kind of external-collaborator seam rather than inventing asset-type
//! logic the domain model has no fields for.

use behemoth_core::Execution;
use behemoth_dispatch::EnvelopeInputs;

pub trait EnvelopeResolver: Send + Sync {
    fn resolve(&self, execution: &Execution) -> EnvelopeInputs;

    fn input_blob(&self, _execution: &Execution) -> Option<Vec<u8>> {
        None
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use behemoth_agent::{AuthParams, CommandType};

    /// Always returns the same fixed script envelope; stands in for a real
    /// dialect/credential lookup in tests.
    pub struct FixedEnvelopeResolver {
        pub cmd_type: CommandType,
        pub script: String,
    }

    impl FixedEnvelopeResolver {
        pub fn new() -> Self {
            Self { cmd_type: CommandType::Script, script: "script".to_string() }
        }
    }

    impl Default for FixedEnvelopeResolver {
        fn default() -> Self {
            Self::new()
        }
    }

    impl EnvelopeResolver for FixedEnvelopeResolver {
        fn resolve(&self, _execution: &Execution) -> EnvelopeInputs {
            EnvelopeInputs {
                cmd_type: self.cmd_type,
                script: self.script.clone(),
                auth: AuthParams {
                    address: "127.0.0.1".to_string(),
                    port: 22,
                    username: "svc".to_string(),
                    password: String::new(),
                    db_name: None,
                    privileged: None,
                },
                envs: String::new(),
            }
        }
    }
}
