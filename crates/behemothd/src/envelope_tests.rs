// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use behemoth_core::Execution;

use super::*;

#[test]
fn resolve_applies_the_configured_envelope_regardless_of_execution() {
    let config = EnvelopeConfig { script: "SELECT 1;".to_string(), address: "db.internal".to_string(), ..EnvelopeConfig::default() };
    let resolver = ConfigEnvelopeResolver::new(config);

    let inputs = resolver.resolve(&Execution::builder().build());
    assert_eq!(inputs.script, "SELECT 1;");
    assert_eq!(inputs.auth.address, "db.internal");
}
