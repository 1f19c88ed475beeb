// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP-reachability [`ConnectivityProbe`] (§3 `test_connectivity`) —
//! cheaper than opening a full secure-shell session just to check
//! liveness, grounded on the same `TcpStream::connect_timeout` dial
//! `Ssh2Session::connect` uses for the real session.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use behemoth_core::Worker;
use behemoth_registry::ConnectivityProbe;

pub struct TcpConnectivityProbe {
    timeout: Duration,
}

impl TcpConnectivityProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ConnectivityProbe for TcpConnectivityProbe {
    async fn is_reachable(&self, worker: &Worker) -> bool {
        let host = worker.host.clone();
        let port = worker.port;
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            let Ok(mut addrs) = (host.as_str(), port).to_socket_addrs() else { return false };
            let Some(addr) = addrs.next() else { return false };
            TcpStream::connect_timeout(&addr, timeout).is_ok()
        })
        .await
        .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
