// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::envelope::{AuthParams, CommandType};
use crate::shell::{FakeShell, ShellOutput};
use behemoth_core::{Command, CommandStatus};

fn envelope() -> AgentEnvelope {
    AgentEnvelope {
        host: "https://control.example.test".to_string(),
        token: "0123456789abcdef0123456789abcdef".to_string(),
        task_id: "exe-1".to_string(),
        org_id: "tnt-1".to_string(),
        cmd_type: CommandType::Script,
        script: "bash".to_string(),
        cmd_set_filepath: "/tmp/behemoth/commands/exe-1/exe-1.bs".to_string(),
        cmd_file: None,
        auth: AuthParams {
            address: "10.0.0.5".to_string(),
            port: 22,
            username: "root".to_string(),
            password: "secret".to_string(),
            db_name: None,
            privileged: None,
        },
        encrypted_data: false,
        envs: String::new(),
    }
}

#[tokio::test]
async fn ensure_binary_skips_upload_when_checksums_match() {
    let shell = FakeShell::new();
    let local_binary = b"binary-bytes";
    let local_checksum = sha256_hex(local_binary);
    shell.on_exec_prefix(
        "sha256sum",
        ShellOutput { stdout: format!("{local_checksum}  /tmp/behemoth/jms_cli_linux"), exit_status: 0, ..Default::default() },
    );

    AgentDriver::new().ensure_binary(&shell, WorkerPlatform::Linux, local_binary).await.unwrap();

    assert!(shell.uploads.lock().is_empty());
}

#[tokio::test]
async fn ensure_binary_uploads_and_chmods_when_checksums_differ() {
    let shell = FakeShell::new();
    shell.on_exec_prefix(
        "sha256sum",
        ShellOutput {
            stdout: "deadbeefdeadbeefdeadbeefdeadbeef  /tmp/behemoth/jms_cli_linux".to_string(),
            exit_status: 0,
            ..Default::default()
        },
    );

    AgentDriver::new().ensure_binary(&shell, WorkerPlatform::Linux, b"binary-bytes").await.unwrap();

    assert_eq!(shell.uploads.lock().get("/tmp/behemoth/jms_cli_linux").unwrap(), b"binary-bytes");
    assert!(shell.exec_calls.lock().iter().any(|c| c.starts_with("chmod +x")));
}

#[tokio::test]
async fn ensure_binary_uploads_when_remote_checksum_missing() {
    let shell = FakeShell::new();
    shell.on_exec_prefix(
        "sha256sum",
        ShellOutput { stdout: String::new(), stderr: "no such file".to_string(), exit_status: 1 },
    );

    AgentDriver::new().ensure_binary(&shell, WorkerPlatform::Linux, b"binary-bytes").await.unwrap();

    assert!(shell.uploads.lock().contains_key("/tmp/behemoth/jms_cli_linux"));
}

#[tokio::test]
async fn ensure_command_bundle_uploads_to_scoped_path() {
    let shell = FakeShell::new();
    let execution_id = behemoth_core::ExecutionId::new();
    let commands =
        vec![Command::builder().body("echo ok").status(CommandStatus::Pending).build()];

    let (remote_path, encrypted) = AgentDriver::new()
        .ensure_command_bundle(&shell, &execution_id, &commands, None)
        .await
        .unwrap();

    assert!(!encrypted);
    assert!(shell.uploads.lock().contains_key(&remote_path));
    assert!(remote_path.contains(execution_id.as_str()));
}

#[tokio::test]
async fn ensure_command_bundle_encrypts_when_token_given() {
    let shell = FakeShell::new();
    let execution_id = behemoth_core::ExecutionId::new();
    let commands =
        vec![Command::builder().body("echo ok").status(CommandStatus::Pending).build()];
    let token = "0123456789abcdef0123456789abcdef";

    let (remote_path, encrypted) = AgentDriver::new()
        .ensure_command_bundle(&shell, &execution_id, &commands, Some(token))
        .await
        .unwrap();

    assert!(encrypted);
    let uploaded = shell.uploads.lock().get(&remote_path).unwrap().clone();
    let plain = crate::crypto::decrypt(token, &uploaded).unwrap();
    assert!(String::from_utf8(plain).unwrap().contains("echo ok"));
}

#[tokio::test]
async fn invoke_runs_remote_binary_with_encoded_envelope() {
    let shell = FakeShell::new();

    AgentDriver::new().invoke(&shell, WorkerPlatform::Linux, &envelope()).await.unwrap();

    let calls = shell.exec_calls.lock();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("/tmp/behemoth/jms_cli_linux --command "));
    assert!(calls[0].ends_with("--with_env"));
}

#[tokio::test]
async fn invoke_fails_on_nonempty_stderr() {
    let shell = FakeShell::new();
    shell.on_exec_prefix(
        "/tmp/behemoth/jms_cli_linux",
        ShellOutput { stdout: String::new(), stderr: "boom".to_string(), exit_status: 0 },
    );

    let err = AgentDriver::new().invoke(&shell, WorkerPlatform::Linux, &envelope()).await.unwrap_err();

    assert!(matches!(err, AgentError::AgentStderr(ref msg) if msg == "boom"));
}
