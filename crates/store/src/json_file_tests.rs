// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use behemoth_core::{test_support, ExecutionId, FakeClock};

#[test]
fn save_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands.jsonl");

    let cmd = test_support::sent_command(ExecutionId::new());
    {
        let store = JsonFileCommandStore::open(&path, FakeClock::new()).unwrap();
        store.save(&cmd).unwrap();
    }

    let reopened = JsonFileCommandStore::open(&path, FakeClock::new()).unwrap();
    let found = reopened.query(&CommandFilter::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, cmd.id);
}

#[test]
fn open_on_missing_file_starts_empty_and_creates_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("new.jsonl");
    assert!(!path.exists());

    let store = JsonFileCommandStore::open(&path, FakeClock::new()).unwrap();
    assert!(store.query(&CommandFilter::default()).unwrap().is_empty());
    assert!(path.exists());
}

#[test]
fn appends_do_not_clobber_earlier_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("commands.jsonl");

    let store = JsonFileCommandStore::open(&path, FakeClock::new()).unwrap();
    store.save(&test_support::sent_command(ExecutionId::new())).unwrap();
    store.save(&test_support::sent_command(ExecutionId::new())).unwrap();
    drop(store);

    let reopened = JsonFileCommandStore::open(&path, FakeClock::new()).unwrap();
    assert_eq!(reopened.count(&CommandFilter::default()).unwrap(), 2);
}
