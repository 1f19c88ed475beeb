// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /plans/:id/start-sync-task` and `POST /plans/:id/upload` (§6.1).

use std::io::{Cursor, Read};

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use behemoth_core::{
    Clock, Command, Execution, ExecutionCategory, ExecutionId, ExecutionStatus, Plan, PlanId,
};
use behemoth_store::{CommandStore, ExecutionStore};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::routes::CallerIdentity;
use crate::sync_coordination::Approval;

#[derive(Serialize)]
#[serde(untagged)]
pub enum StartSyncTaskResponse {
    Ready { task_id: String, task_status: &'static str, users: Vec<String> },
    Pending { ttl_secs: u64, users: Vec<String>, participants: usize, wait_timeout_secs: u64 },
}

/// Accumulates `identity` into the plan's pending-approvers set (§6.1);
/// starts the batch and returns `201` once enough distinct approvers have
/// joined, otherwise `200` with the current wait state.
pub async fn start_sync_task<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(plan_id): Path<String>,
    CallerIdentity(identity): CallerIdentity,
) -> Result<Response, ApiError> {
    let plan_id = PlanId::from_string(plan_id);
    let plan = state.plan(&plan_id).ok_or_else(|| ApiError::PlanNotFound(plan_id.to_string()))?;

    match state.coordinator.join(plan_id.clone(), identity) {
        Approval::Pending { ttl, participants, users, wait_timeout } => {
            let body = StartSyncTaskResponse::Pending {
                ttl_secs: ttl.as_secs(),
                users,
                participants,
                wait_timeout_secs: wait_timeout.as_secs(),
            };
            Ok((StatusCode::OK, Json(body)).into_response())
        }
        Approval::Ready { users } => {
            if plan.is_sync() {
                // §4.7 "on sync-plan creation"; there is no dedicated
                // create-plan route (§1 Non-goals), so the first
                // start-sync-task call against a playback-backed sync plan
                // is this plan's materialization point. A no-op on every
                // later call, once the plan already has executions.
                behemoth_store::materialize_sync_plan(
                    state.playback.as_ref(),
                    state.executions.as_ref(),
                    state.commands.as_ref(),
                    &plan,
                )?;
            }
            let executions = state.executions.list_for_plan(&plan_id);
            let execution_ids: Vec<ExecutionId> = executions.iter().map(|e| e.id.clone()).collect();
            let environment = state.environment(&plan.environment_id);
            dispatch_plan(&state, &plan, environment.as_ref(), &execution_ids, &users).await?;

            let body = StartSyncTaskResponse::Ready {
                task_id: plan_id.to_string(),
                task_status: "executing",
                users,
            };
            Ok((StatusCode::CREATED, Json(body)).into_response())
        }
    }
}

pub(crate) async fn dispatch_plan<C: Clock + 'static>(
    state: &AppState<C>,
    plan: &Plan,
    environment: Option<&behemoth_core::Environment>,
    execution_ids: &[ExecutionId],
    approving_users: &[String],
) -> Result<(), ApiError> {
    let resolver = state.envelope_resolver.clone();
    let resolver_for_blob = resolver.clone();
    let envelope_for = move |execution: &Execution| resolver.resolve(execution);
    let input_blob_for = move |execution: &Execution| resolver_for_blob.input_blob(execution);

    let request = behemoth_dispatch::BatchRequest {
        plan,
        environment,
        execution_ids,
        approving_users,
        envelope_for: &envelope_for,
        input_blob_for: &input_blob_for,
        bearer_token: None,
        encrypt_bundle: state.config.encrypt_bundle,
        control_plane_host: state.config.control_plane_host.clone(),
        org_id: state.config.org_id.clone(),
    };
    state.dispatcher.dispatch_batch(request).await?;
    Ok(())
}

/// Sentinel filename the ZIP repackaging step uses to name the primary
/// script inside an uploaded bundle (§6.1).
const ENTRY_SENTINEL: &str = "entry.bs";

/// Upload a command-bearing file (§6.1); ZIP uploads are repackaged under
/// [`ENTRY_SENTINEL`] with path separators and encodings normalized. Creates
/// one file-category execution and one Command whose body names the stored
/// blob path.
pub async fn upload<C: Clock + 'static>(
    State(state): State<AppState<C>>,
    Path(plan_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let plan_id = PlanId::from_string(plan_id);
    let plan = state.plan(&plan_id).ok_or_else(|| ApiError::PlanNotFound(plan_id.to_string()))?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidUpload(e.to_string()))?
        .ok_or_else(|| ApiError::InvalidUpload("no file part in upload".to_string()))?;
    let filename = field.file_name().unwrap_or("upload.bin").to_string();
    let bytes = field.bytes().await.map_err(|e| ApiError::InvalidUpload(e.to_string()))?;

    let blob_path = if filename.to_ascii_lowercase().ends_with(".zip") {
        repackage_zip(&bytes, &state.config.log_dir, &plan_id)?
    } else {
        let dest = state.config.log_dir.join("blobs").join(plan_id.to_string()).join(&filename);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
        }
        std::fs::write(&dest, &bytes).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
        dest
    };

    let execution = Execution::builder()
        .name(format!("upload: {filename}"))
        .tenant_id(plan.tenant_id.clone())
        .plan_id(plan_id.clone())
        .category(ExecutionCategory::File)
        .status(ExecutionStatus::Pending)
        .sequence(state.executions.list_for_plan(&plan_id).len() as u32)
        .build();
    state.executions.save(execution.clone())?;

    let command = Command::builder().execution_id(execution.id.clone()).sequence(0).body(blob_path.to_string_lossy().to_string()).build();
    state.commands.save(&command)?;

    Ok(Json(UploadResponse { execution_id: execution.id.to_string(), blob_path: blob_path.to_string_lossy().to_string() }))
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub execution_id: String,
    pub blob_path: String,
}

/// Re-zip `raw` so its primary entry is named [`ENTRY_SENTINEL`], with
/// backslash separators rewritten to `/` and non-UTF-8 entry names
/// re-encoded via `encoding_rs` (§6.1).
fn repackage_zip(raw: &[u8], log_dir: &std::path::Path, plan_id: &PlanId) -> Result<std::path::PathBuf, ApiError> {
    let mut source = zip::ZipArchive::new(Cursor::new(raw)).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
    if source.is_empty() {
        return Err(ApiError::InvalidUpload("zip archive is empty".to_string()));
    }

    let dest_dir = log_dir.join("blobs").join(plan_id.to_string());
    std::fs::create_dir_all(&dest_dir).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
    let dest_path = dest_dir.join(format!("{ENTRY_SENTINEL}.zip"));
    let dest_file = std::fs::File::create(&dest_path).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
    let mut writer = zip::ZipWriter::new(dest_file);
    let options = zip::write::SimpleFileOptions::default();

    for i in 0..source.len() {
        let mut entry = source.by_index(i).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        let normalized = normalize_entry_name(entry.name_raw(), i == 0);

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;

        writer.start_file(normalized, options).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
        std::io::Write::write_all(&mut writer, &contents).map_err(|e| ApiError::InvalidUpload(e.to_string()))?;
    }
    writer.finish().map_err(|e| ApiError::InvalidUpload(e.to_string()))?;

    Ok(dest_path)
}

/// The archive's first non-directory entry becomes [`ENTRY_SENTINEL`]
/// (naming the primary script); every other entry keeps its name with
/// separators and encoding normalized, preserving its directory prefix.
fn normalize_entry_name(raw: &[u8], is_primary: bool) -> String {
    let (decoded, _, _) = encoding_rs::UTF_8.decode(raw);
    let forward_slashes = decoded.replace('\\', "/");
    if is_primary {
        ENTRY_SENTINEL.to_string()
    } else {
        forward_slashes
    }
}

#[cfg(test)]
#[path = "plans_tests.rs"]
mod tests;
