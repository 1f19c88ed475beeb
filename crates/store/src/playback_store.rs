// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playback Recorder (§4.7) — files a completed execution's output under
//! the plan's current monthly version and, per the plan's playback
//! strategy, decides whether it promotes immediately.
//!
//! The original system builds this side effect inside a serializer's
//! `validate`/`create` (dynamic composition); here it's a free function
//! over an explicit DTO and a storage trait instead (§9 REDESIGN FLAGS).

use std::collections::HashMap;

use behemoth_core::{
    Clock, Command, Execution, ExecutionCategory, ExecutionId, MonthlyVersion, MonthlyVersionId,
    Plan, Playback, PlaybackExecution, PlaybackExecutionId, PlaybackExecutionStatus, PlaybackId,
    PlaybackStrategy,
};
use parking_lot::RwLock;

use crate::command_store::{latest_by_id, CommandFilter, CommandStore};
use crate::error::StoreError;
use crate::execution_store::ExecutionStore;

pub trait PlaybackStore: Send + Sync {
    fn get_or_create_monthly_version(
        &self,
        playback_id: PlaybackId,
        label: &str,
    ) -> MonthlyVersion;

    fn record_execution(&self, recording: PlaybackExecution) -> Result<(), StoreError>;

    fn executions_for_version(&self, monthly_version_id: MonthlyVersionId) -> Vec<PlaybackExecution>;

    /// Every recording a playback has ever accumulated, in recording order
    /// (§4.7 "an ordered list of PlaybackExecution ids"), regardless of
    /// which monthly version they landed in.
    fn executions_for_playback(&self, playback_id: PlaybackId) -> Vec<PlaybackExecution>;

    fn set_status(
        &self,
        id: PlaybackExecutionId,
        status: PlaybackExecutionStatus,
    ) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryPlaybackStore {
    monthly_versions: RwLock<HashMap<(PlaybackId, String), MonthlyVersion>>,
    // A `Vec`, not a map keyed by id, so recording order survives (§4.7
    // materialization reads these back in the order they were recorded).
    executions: RwLock<Vec<PlaybackExecution>>,
}

impl InMemoryPlaybackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaybackStore for InMemoryPlaybackStore {
    fn get_or_create_monthly_version(
        &self,
        playback_id: PlaybackId,
        label: &str,
    ) -> MonthlyVersion {
        let key = (playback_id.clone(), label.to_string());
        if let Some(existing) = self.monthly_versions.read().get(&key) {
            return existing.clone();
        }
        let mv = MonthlyVersion::builder().playback_id(playback_id).label(label).build();
        self.monthly_versions.write().insert(key, mv.clone());
        mv
    }

    fn record_execution(&self, recording: PlaybackExecution) -> Result<(), StoreError> {
        self.executions.write().push(recording);
        Ok(())
    }

    fn executions_for_version(&self, monthly_version_id: MonthlyVersionId) -> Vec<PlaybackExecution> {
        self.executions
            .read()
            .iter()
            .filter(|e| e.monthly_version_id == monthly_version_id)
            .cloned()
            .collect()
    }

    fn executions_for_playback(&self, playback_id: PlaybackId) -> Vec<PlaybackExecution> {
        self.executions.read().iter().filter(|e| e.playback_id == playback_id).cloned().collect()
    }

    fn set_status(
        &self,
        id: PlaybackExecutionId,
        status: PlaybackExecutionStatus,
    ) -> Result<(), StoreError> {
        let mut executions = self.executions.write();
        let recording = executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::PlaybackExecutionNotFound(id.clone()))?;
        recording.status = status;
        Ok(())
    }
}

/// Format a monthly version label from an epoch-millisecond timestamp.
pub fn monthly_label(epoch_ms: u64) -> String {
    let datetime = chrono::DateTime::from_timestamp_millis(epoch_ms as i64)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).expect("epoch is representable"));
    datetime.format("%Y-%m").to_string()
}

/// Record a completed execution's output into its playback, per the
/// plan's playback strategy (§4.7):
/// - `AutoPromote` records already promoted.
/// - `ManualPromote` records pending a later, explicit promotion.
/// - `NeverPromote` records for history only; it is never promoted.
///
/// `plan_name`/`asset_name_display`/`account_username_display` are captured
/// display strings (§3 Playback entity), not foreign keys, so a later
/// sync-plan materialization (§4.7) can clone a fresh execution without
/// re-reading plan/asset/account rows that may no longer exist.
#[allow(clippy::too_many_arguments)]
pub fn record_completed_execution(
    store: &dyn PlaybackStore,
    clock: &impl Clock,
    playback: &Playback,
    plan_name: &str,
    execution: &Execution,
    asset_name_display: &str,
    account_username_display: &str,
    strategy: PlaybackStrategy,
    output: impl AsRef<str>,
) -> PlaybackExecution {
    let label = monthly_label(clock.epoch_ms());
    let monthly_version = store.get_or_create_monthly_version(playback.id.clone(), &label);

    let status = match strategy {
        PlaybackStrategy::AutoPromote => PlaybackExecutionStatus::Promoted,
        PlaybackStrategy::ManualPromote | PlaybackStrategy::NeverPromote => {
            PlaybackExecutionStatus::Recorded
        }
    };

    let recording = PlaybackExecution::builder()
        .playback_id(playback.id.clone())
        .monthly_version_id(monthly_version.id)
        .execution_id(execution.id.clone())
        .status(status)
        .plan_name(plan_name)
        .asset_name_display(asset_name_display)
        .account_username_display(account_username_display)
        .version(execution.version.clone())
        .recorded_output(behemoth_core::truncate(output.as_ref(), behemoth_core::MAX_OUTPUT_LEN))
        .build();

    let _ = store.record_execution(recording.clone());
    recording
}

/// On sync-plan creation (§4.7 steps 1-4): walk `plan`'s playback's
/// recordings in order and clone each one's source execution and commands
/// into a fresh execution under `plan`. Idempotent — a plan that already
/// has executions, or that has no playback attached, is left alone, so
/// calling this more than once for the same plan is a no-op rather than a
/// second materialization.
///
/// Atomic per source execution (§4.7 invariant): a source's commands are
/// cloned and saved before the execution row that references them, so a
/// mid-clone failure never leaves a visible execution short its commands;
/// sources already materialized earlier in the list are unaffected.
pub fn materialize_sync_plan(
    playback_store: &dyn PlaybackStore,
    executions: &dyn ExecutionStore,
    commands: &dyn CommandStore,
    plan: &Plan,
) -> Result<Vec<Execution>, StoreError> {
    if !executions.list_for_plan(&plan.id).is_empty() {
        return Ok(Vec::new());
    }
    let Some(playback_id) = plan.playback_id.clone() else {
        return Ok(Vec::new());
    };

    let recordings = playback_store.executions_for_playback(playback_id);
    let mut materialized = Vec::with_capacity(recordings.len());

    for (position, recording) in recordings.iter().enumerate() {
        let source = executions
            .get(&recording.execution_id)
            .ok_or_else(|| StoreError::SourceExecutionNotFound(recording.execution_id.clone()))?;

        let new_execution = Execution::builder()
            .tenant_id(plan.tenant_id.clone())
            .plan_id(plan.id.clone())
            .name(source.name.clone())
            .version(recording.version.clone())
            .category(source.category)
            .sequence(position as u32)
            .asset_hint(recording.asset_name_display.clone())
            .account_hint(recording.account_username_display.clone())
            .build();

        let cloned_commands = clone_commands(commands, &recording.execution_id, &new_execution.id, source.category)?;
        commands.bulk_save(&cloned_commands)?;
        executions.save(new_execution.clone())?;
        materialized.push(new_execution);
    }

    Ok(materialized)
}

/// Clone one source execution's commands into `new_execution_id`, indices
/// reset to a dense run starting at 0 (§4.7 step 3). A pause-category
/// source carries its recorded `output` forward onto the clone as well
/// (the operator's prior review note); every other category starts its
/// clone fresh, to be populated by a real run.
fn clone_commands(
    commands: &dyn CommandStore,
    source_execution_id: &ExecutionId,
    new_execution_id: &ExecutionId,
    source_category: ExecutionCategory,
) -> Result<Vec<Command>, StoreError> {
    let source_commands = latest_by_id(commands.query(&CommandFilter::for_execution(source_execution_id.clone()))?);

    Ok(source_commands
        .into_iter()
        .enumerate()
        .map(|(index, src)| {
            let mut builder =
                Command::builder().execution_id(new_execution_id.clone()).sequence(index as u32).body(src.body);
            if source_category == ExecutionCategory::Pause {
                if let Some(output) = src.output {
                    builder = builder.output(output);
                }
            }
            builder.build()
        })
        .collect())
}

#[cfg(test)]
#[path = "playback_store_tests.rs"]
mod tests;
