// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control API routes (§6.1). Identity/authorization is out of scope (§1
//! Non-goals); [`CallerIdentity`] is the pre-resolved extractor input a real
//! deployment would populate from its auth middleware, here read straight
//! off a header.

pub mod executions;
pub mod plans;
pub mod stream;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::Router;
use behemoth_core::Clock;

use crate::app_state::AppState;

const IDENTITY_HEADER: &str = "x-behemoth-identity";

/// The calling identity, as a real deployment's auth middleware would hand
/// it to these routes (§1 Non-goals: identity/authorization is an external
/// collaborator). Read straight off a header since nothing here verifies it.
pub struct CallerIdentity(pub String);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| CallerIdentity(s.to_string()))
            .ok_or((StatusCode::UNAUTHORIZED, "missing x-behemoth-identity header"))
    }
}

pub fn router<C: Clock + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/plans/:id/start-sync-task", post(plans::start_sync_task::<C>))
        .route("/plans/:id/upload", post(plans::upload::<C>))
        .route("/executions/:id/operate_task", post(executions::operate_task::<C>))
        .route("/executions/:id/callback", patch(executions::execution_callback::<C>))
        .route("/tasks/:task_id/stream", get(stream::task_stream::<C>))
        .with_state(state)
}
