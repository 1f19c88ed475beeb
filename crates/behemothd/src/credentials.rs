// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static, config-file-backed [`CredentialResolver`] (§1 Non-goals:
//! credential storage is an external collaborator this binary stands in
//! for until a real deployment plugs in its own vault).

use std::collections::HashMap;

use behemoth_agent::CredentialResolver;

use crate::config::CredentialConfig;

pub struct ConfigCredentialResolver {
    credentials: HashMap<String, CredentialConfig>,
}

impl ConfigCredentialResolver {
    pub fn new(credentials: HashMap<String, CredentialConfig>) -> Self {
        Self { credentials }
    }
}

impl CredentialResolver for ConfigCredentialResolver {
    fn resolve(&self, account_ref: &str) -> (String, String) {
        match self.credentials.get(account_ref) {
            Some(entry) => (entry.username.clone(), entry.password.clone()),
            None => {
                tracing::warn!(account_ref, "no credentials configured for account_ref, using empty password");
                (account_ref.to_string(), String::new())
            }
        }
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
