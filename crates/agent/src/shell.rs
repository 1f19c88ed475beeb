// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The secure-shell seam (§4.3, §5): one reused session per execution over
//! which the driver runs commands and uploads files. Mirrors the pack's
//! habit of putting a narrow trait at the boundary between a crate and the
//! one blocking/FFI-adjacent dependency it owns.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use behemoth_core::Worker;
use parking_lot::Mutex;

use crate::error::AgentError;

/// Secure-shell connect timeout default (§5).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a non-interactive remote command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

impl ShellOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }
}

/// One reused secure-shell session (§5 "all over one reused secure-shell
/// session"). Implementations own connection lifecycle; callers hold one
/// instance per execution.
#[async_trait]
pub trait SecureShell: Send + Sync {
    async fn exec(&self, command: &str) -> Result<ShellOutput, AgentError>;

    async fn upload(&self, remote_path: &str, contents: Vec<u8>, mode: i32) -> Result<(), AgentError>;
}

/// `ssh2`-backed implementation. All libssh2 calls are synchronous; each
/// call is isolated in [`tokio::task::spawn_blocking`] so the driver's
/// async callers never block the runtime (§4.3, §9's narrow-boundary
/// discipline applied to the one blocking dependency this crate owns).
pub struct Ssh2Session {
    session: Arc<Mutex<ssh2::Session>>,
}

impl Ssh2Session {
    pub fn connect(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        connect_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|e| AgentError::Connect(host.to_string(), e.to_string()))?
            .next()
            .ok_or_else(|| AgentError::Connect(host.to_string(), "no address resolved".to_string()))?;

        let tcp = TcpStream::connect_timeout(&addr, connect_timeout)
            .map_err(|e| AgentError::Connect(host.to_string(), e.to_string()))?;

        let mut session =
            ssh2::Session::new().map_err(|e| AgentError::Connect(host.to_string(), e.to_string()))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| AgentError::Connect(host.to_string(), e.to_string()))?;
        session
            .userauth_password(username, password)
            .map_err(|e| AgentError::Connect(host.to_string(), e.to_string()))?;
        if !session.authenticated() {
            return Err(AgentError::Connect(host.to_string(), "authentication rejected".to_string()));
        }

        Ok(Self { session: Arc::new(Mutex::new(session)) })
    }
}

#[async_trait]
impl SecureShell for Ssh2Session {
    async fn exec(&self, command: &str) -> Result<ShellOutput, AgentError> {
        let session = self.session.clone();
        let command = command.to_string();
        tokio::task::spawn_blocking(move || -> Result<ShellOutput, AgentError> {
            let session = session.lock();
            let mut channel = session.channel_session()?;
            channel.exec(&command)?;

            let mut stdout = String::new();
            channel.read_to_string(&mut stdout)?;
            let mut stderr = String::new();
            channel.stderr().read_to_string(&mut stderr)?;

            channel.wait_close()?;
            let exit_status = channel.exit_status()?;
            Ok(ShellOutput { stdout, stderr, exit_status })
        })
        .await?
    }

    async fn upload(&self, remote_path: &str, contents: Vec<u8>, mode: i32) -> Result<(), AgentError> {
        let session = self.session.clone();
        let remote_path_owned = remote_path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), AgentError> {
            let session = session.lock();
            let mut remote_file = session
                .scp_send(Path::new(&remote_path_owned), mode, contents.len() as u64, None)
                .map_err(|e| AgentError::Upload(remote_path_owned.clone(), e.to_string()))?;
            remote_file
                .write_all(&contents)
                .map_err(|e| AgentError::Upload(remote_path_owned.clone(), e.to_string()))?;
            remote_file.send_eof()?;
            remote_file.wait_eof()?;
            remote_file.close()?;
            remote_file.wait_close()?;
            Ok(())
        })
        .await?
    }
}

/// Produces one connected [`SecureShell`] session per worker (§4.3 "all
/// over one reused secure-shell session"). A thin seam over connection
/// lifecycle so the dispatcher never constructs a transport directly.
#[async_trait]
pub trait ShellFactory: Send + Sync {
    async fn connect(&self, worker: &Worker) -> Result<Box<dyn SecureShell>, AgentError>;
}

/// Resolves a worker's opaque `account_ref` to secure-shell credentials.
/// Credential storage and retrieval are an external collaborator (§1
/// Non-goals); this is the seam a real deployment plugs into.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self, account_ref: &str) -> (String, String);
}

/// [`ShellFactory`] backed by [`Ssh2Session::connect`].
pub struct Ssh2ShellFactory {
    credentials: Arc<dyn CredentialResolver>,
    connect_timeout: Duration,
}

impl Ssh2ShellFactory {
    pub fn new(credentials: Arc<dyn CredentialResolver>) -> Self {
        Self { credentials, connect_timeout: DEFAULT_CONNECT_TIMEOUT }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl ShellFactory for Ssh2ShellFactory {
    async fn connect(&self, worker: &Worker) -> Result<Box<dyn SecureShell>, AgentError> {
        let (username, password) = self.credentials.resolve(&worker.account_ref);
        let host = worker.host.clone();
        let port = worker.port;
        let timeout = self.connect_timeout;

        let session = tokio::task::spawn_blocking(move || {
            Ssh2Session::connect(&host, port, &username, &password, timeout)
        })
        .await??;
        Ok(Box::new(session))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::Arc;

    use behemoth_core::Worker;
    use parking_lot::Mutex;

    use super::{AgentError, ShellFactory, ShellOutput, SecureShell};
    use async_trait::async_trait;

    /// Canned response for one exec call, matched by command prefix.
    pub struct ExecRule {
        pub prefix: String,
        pub output: ShellOutput,
    }

    /// In-process double for [`SecureShell`]; records every exec/upload
    /// call and answers exec calls from a small set of prefix rules,
    /// defaulting to a successful empty response.
    #[derive(Default)]
    pub struct FakeShell {
        rules: Mutex<Vec<ExecRule>>,
        pub exec_calls: Mutex<Vec<String>>,
        pub uploads: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl FakeShell {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on_exec_prefix(&self, prefix: impl Into<String>, output: ShellOutput) {
            self.rules.lock().push(ExecRule { prefix: prefix.into(), output });
        }
    }

    #[async_trait]
    impl SecureShell for FakeShell {
        async fn exec(&self, command: &str) -> Result<ShellOutput, AgentError> {
            self.exec_calls.lock().push(command.to_string());
            let rules = self.rules.lock();
            for rule in rules.iter() {
                if command.starts_with(&rule.prefix) {
                    return Ok(rule.output.clone());
                }
            }
            Ok(ShellOutput::default())
        }

        async fn upload(&self, remote_path: &str, contents: Vec<u8>, _mode: i32) -> Result<(), AgentError> {
            self.uploads.lock().insert(remote_path.to_string(), contents);
            Ok(())
        }
    }

    #[async_trait]
    impl SecureShell for Arc<FakeShell> {
        async fn exec(&self, command: &str) -> Result<ShellOutput, AgentError> {
            (**self).exec(command).await
        }

        async fn upload(&self, remote_path: &str, contents: Vec<u8>, mode: i32) -> Result<(), AgentError> {
            (**self).upload(remote_path, contents, mode).await
        }
    }

    /// [`ShellFactory`] that always hands back the same [`FakeShell`],
    /// ignoring the requested worker.
    pub struct FakeShellFactory {
        shell: Arc<FakeShell>,
    }

    impl FakeShellFactory {
        pub fn new(shell: Arc<FakeShell>) -> Self {
            Self { shell }
        }
    }

    #[async_trait]
    impl ShellFactory for FakeShellFactory {
        async fn connect(&self, _worker: &Worker) -> Result<Box<dyn SecureShell>, AgentError> {
            Ok(Box::new(self.shell.clone()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeShell, FakeShellFactory};

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
