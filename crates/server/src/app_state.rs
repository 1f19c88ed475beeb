// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state handed to every Control API route (§6.1).
//!
//! Plan and Environment storage is an in-memory map here rather than a
//! `behemoth-store` backend: persistence schema for those entities is out of
//! scope (§1 Non-goals, "persistence schema/migrations beyond the two
//! `CommandStore` backends"), so this crate only needs enough bookkeeping to
//! resolve a plan/environment by id when routing a request.

use std::collections::HashMap;
use std::sync::Arc;

use behemoth_core::{Clock, Environment, EnvironmentId, Plan, PlanId, Playback, PlaybackId};
use behemoth_dispatch::BatchDispatcher;
use behemoth_registry::WorkerRegistry;
use behemoth_store::{CommandStore, ExecutionStore, PlaybackStore};
use parking_lot::RwLock;

use crate::config::ServerConfig;
use crate::envelope_resolver::EnvelopeResolver;
use crate::status_stream::FileStatusSink;
use crate::sync_coordination::SyncCoordinator;

#[derive(Clone)]
pub struct AppState<C: Clock> {
    plans: Arc<RwLock<HashMap<PlanId, Plan>>>,
    environments: Arc<RwLock<HashMap<EnvironmentId, Environment>>>,
    playbacks: Arc<RwLock<HashMap<PlaybackId, Playback>>>,
    pub executions: Arc<dyn ExecutionStore>,
    pub commands: Arc<dyn CommandStore>,
    pub playback: Arc<dyn PlaybackStore>,
    pub registry: Arc<WorkerRegistry<C>>,
    pub dispatcher: Arc<BatchDispatcher<C>>,
    pub status: Arc<FileStatusSink>,
    pub coordinator: Arc<SyncCoordinator<C>>,
    pub envelope_resolver: Arc<dyn EnvelopeResolver>,
    pub clock: C,
    pub config: ServerConfig,
}

impl<C: Clock> AppState<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        executions: Arc<dyn ExecutionStore>,
        commands: Arc<dyn CommandStore>,
        playback: Arc<dyn PlaybackStore>,
        registry: Arc<WorkerRegistry<C>>,
        dispatcher: Arc<BatchDispatcher<C>>,
        status: Arc<FileStatusSink>,
        coordinator: Arc<SyncCoordinator<C>>,
        envelope_resolver: Arc<dyn EnvelopeResolver>,
        clock: C,
        config: ServerConfig,
    ) -> Self {
        Self {
            plans: Arc::new(RwLock::new(HashMap::new())),
            environments: Arc::new(RwLock::new(HashMap::new())),
            playbacks: Arc::new(RwLock::new(HashMap::new())),
            executions,
            commands,
            playback,
            registry,
            dispatcher,
            status,
            coordinator,
            envelope_resolver,
            clock,
            config,
        }
    }

    pub fn register_plan(&self, plan: Plan) {
        self.plans.write().insert(plan.id.clone(), plan);
    }

    pub fn plan(&self, id: &PlanId) -> Option<Plan> {
        self.plans.read().get(id).cloned()
    }

    pub fn register_environment(&self, environment: Environment) {
        self.environments.write().insert(environment.id.clone(), environment);
    }

    pub fn environment(&self, id: &EnvironmentId) -> Option<Environment> {
        self.environments.read().get(id).cloned()
    }

    pub fn register_playback(&self, playback: Playback) {
        self.playbacks.write().insert(playback.id.clone(), playback);
    }

    pub fn playback_entity(&self, id: &PlaybackId) -> Option<Playback> {
        self.playbacks.read().get(id).cloned()
    }
}

#[cfg(test)]
#[path = "app_state_tests.rs"]
mod tests;
