// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `behemothd`: boots the Control API (`behemoth-server`) over a real
//! secure-shell worker pool and command store, seeded from
//! [`config::BehemothConfig`].

mod config;
mod connectivity;
mod credentials;
mod envelope;

use std::sync::Arc;

use anyhow::Context;
use behemoth_agent::{CredentialResolver, Ssh2ShellFactory};
use behemoth_core::SystemClock;
use behemoth_dispatch::{BatchDispatcher, WorkerPool};
use behemoth_registry::WorkerRegistry;
use behemoth_server::{AppState, FileStatusSink, ServerConfig, SyncCoordinator};
use behemoth_store::{CommandStore, InMemoryCommandStore, InMemoryExecutionStore, InMemoryPlaybackStore, JsonFileCommandStore};
use config::{BehemothConfig, CommandStoreConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let config = BehemothConfig::load_from_env().context("loading behemothd config")?;
    let clock = SystemClock;

    let probe = Arc::new(connectivity::TcpConnectivityProbe::new(config.ssh_connect_timeout()));
    let registry = Arc::new(WorkerRegistry::new(clock.clone(), probe));
    for worker in &config.topology.workers {
        registry.add_worker(worker.clone());
    }
    info!(workers = config.topology.workers.len(), "worker registry seeded");

    let credentials: Arc<dyn CredentialResolver> = Arc::new(credentials::ConfigCredentialResolver::new(config.credentials.clone()));
    let shells = Arc::new(Ssh2ShellFactory::new(credentials).with_connect_timeout(config.ssh_connect_timeout()));
    let local_binary = std::fs::read(&config.local_binary_path)
        .with_context(|| format!("reading local agent binary at {}", config.local_binary_path.display()))?;
    let worker_pool = WorkerPool::new(registry.clone(), shells, local_binary);

    let executions = Arc::new(InMemoryExecutionStore::new());
    let commands: Arc<dyn CommandStore> = match &config.command_store {
        CommandStoreConfig::Memory => Arc::new(InMemoryCommandStore::new(clock.clone())),
        CommandStoreConfig::JsonFile { path } => Arc::new(
            JsonFileCommandStore::open(path, clock.clone()).with_context(|| format!("opening command store at {}", path.display()))?,
        ),
    };
    let playback = Arc::new(InMemoryPlaybackStore::new());

    std::fs::create_dir_all(&config.log_dir).with_context(|| format!("creating log dir {}", config.log_dir.display()))?;
    let status = Arc::new(FileStatusSink::new(config.log_dir.clone()));
    let coordinator = Arc::new(SyncCoordinator::new(clock.clone(), config.required_approvers, config.coordination_wait_timeout()));
    let dispatcher = Arc::new(BatchDispatcher::new(executions.clone(), commands.clone(), worker_pool, status.clone()));
    let envelope_resolver = Arc::new(envelope::ConfigEnvelopeResolver::new(config.envelope.clone()));

    let server_config = ServerConfig {
        bind_addr: config.bind_addr,
        log_dir: config.log_dir.clone(),
        required_approvers: config.required_approvers,
        coordination_wait_timeout: config.coordination_wait_timeout(),
        control_plane_host: config.control_plane_host.clone(),
        org_id: config.org_id.clone(),
        encrypt_bundle: config.encrypt_bundle,
    };

    let state = AppState::new(executions, commands, playback, registry, dispatcher, status, coordinator, envelope_resolver, clock, server_config);

    for environment in &config.topology.environments {
        state.register_environment(environment.clone());
    }
    for plan in &config.topology.plans {
        state.register_plan(plan.clone());
    }
    for playback in &config.topology.playbacks {
        state.register_playback(playback.clone());
    }
    info!(
        environments = config.topology.environments.len(),
        plans = config.topology.plans.len(),
        playbacks = config.topology.playbacks.len(),
        "topology seeded"
    );

    let bind_addr = config.bind_addr;
    let router = behemoth_server::router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await.with_context(|| format!("binding {bind_addr}"))?;
    info!(%bind_addr, "behemothd listening");
    axum::serve(listener, router).await.context("serving Control API")?;

    Ok(())
}
