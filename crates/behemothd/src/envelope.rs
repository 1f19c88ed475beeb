// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config-backed [`EnvelopeResolver`] (§1 Non-goals: the domain model has
//! no fields for a target asset's dialect or connection details, so this
//! binary applies one statically configured envelope to every execution
//! until a real per-asset directory is plugged in).

use behemoth_agent::AuthParams;
use behemoth_core::Execution;
use behemoth_dispatch::EnvelopeInputs;
use behemoth_server::EnvelopeResolver;

use crate::config::EnvelopeConfig;

pub struct ConfigEnvelopeResolver {
    config: EnvelopeConfig,
}

impl ConfigEnvelopeResolver {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self { config }
    }
}

impl EnvelopeResolver for ConfigEnvelopeResolver {
    fn resolve(&self, _execution: &Execution) -> EnvelopeInputs {
        EnvelopeInputs {
            cmd_type: self.config.cmd_type.into(),
            script: self.config.script.clone(),
            auth: AuthParams {
                address: self.config.address.clone(),
                port: self.config.port,
                username: self.config.username.clone(),
                password: self.config.password.clone(),
                db_name: self.config.db_name.clone(),
                privileged: self.config.privileged,
            },
            envs: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
