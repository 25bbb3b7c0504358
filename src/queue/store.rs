//! Task Store
//!
//! The durable record of every bootstrap task and the only shared mutable
//! resource in the core. Concurrency safety comes from `DashMap` per-entry
//! locking: every state transition re-checks its precondition under the entry
//! lock, which gives compare-and-set semantics without a global mutex.
//!
//! ## Responsibilities
//! - **Idempotent enqueue**: at most one `Queued`/`Running` row per dedup key.
//! - **Atomic claim**: only one caller wins the `Queued -> Running` flip for a
//!   given row, ordered by `(priority, created_at)`.
//! - **Retry accounting**: backoff scheduling on failure until `max_attempts`.
//! - **Projections**: status snapshots with ETA, queue-wide counts.
//! - **Stale recovery**: requeueing `Running` rows whose worker likely died.

use super::backoff::{FailureReason, backoff_delay, classify_failure};
use super::dedup::dedup_key;
use super::types::*;
use crate::pipeline::steps::eta_seconds;

use anyhow::Result;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::time::Duration;

/// Default ceiling on claim attempts before a failure becomes terminal.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Raw failure messages are truncated to this many characters on the row.
const MAX_FAILURE_DETAILS: usize = 500;

/// Outcome of an enqueue call.
#[derive(Debug, Clone, Serialize)]
pub struct EnqueueOutcome {
    /// True when a fresh row was created by this call.
    pub queued: bool,
    /// True when an existing row was returned unchanged.
    pub existing: bool,
    pub task_id: TaskId,
    pub status: TaskStatus,
}

/// Outcome of `mark_failed`.
#[derive(Debug, Clone)]
pub struct FailureOutcome {
    pub will_retry: bool,
    pub reason: FailureReason,
    pub next_retry_at: Option<u64>,
}

/// Read-only status projection for callers.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
}

impl StatusSnapshot {
    pub fn missing() -> Self {
        Self {
            exists: false,
            status: None,
            progress: None,
            step: None,
            eta_seconds: None,
            attempts: None,
            updated_at: None,
        }
    }
}

/// Counts of tasks by status.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct QueueStats {
    pub queued: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
    pub total: usize,
}

/// The bootstrap task store.
pub struct TaskStore {
    /// All rows, keyed by store-assigned id.
    tasks: DashMap<TaskId, BootstrapTask>,
    /// Uniqueness index over dedup keys, scoped to non-terminal statuses.
    active: DashMap<String, TaskId>,
    /// Most recent row per dedup key, regardless of status. Backs status
    /// lookups and the done-row-returned-unchanged enqueue path.
    latest: DashMap<String, TaskId>,
    max_attempts: u32,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            tasks: DashMap::new(),
            active: DashMap::new(),
            latest: DashMap::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    /// Enqueues a bootstrap task for a subject. Idempotent.
    ///
    /// - An active (`Queued`/`Running`) row for the same dedup key is
    ///   returned unchanged.
    /// - A prior `Done` row is also returned unchanged unless `force` asks
    ///   for re-indexing.
    /// - A prior `Failed` row is removed and replaced by a fresh `Queued`
    ///   row.
    ///
    /// The `active` index entry lock is held across row creation, so two
    /// racing enqueues for the same key can never both create a row.
    pub fn enqueue(&self, subject: SubjectRef, priority: Option<i32>, force: bool) -> EnqueueOutcome {
        let key = dedup_key(&subject);

        match self.active.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                let task_id = occupied.get().clone();
                let status = self
                    .tasks
                    .get(&task_id)
                    .map(|t| t.status)
                    .unwrap_or(TaskStatus::Queued);

                tracing::debug!("Enqueue {}: active task {} exists", key, task_id.0);
                EnqueueOutcome {
                    queued: false,
                    existing: true,
                    task_id,
                    status,
                }
            }
            Entry::Vacant(vacant) => {
                // No active row. A prior terminal row may still decide the outcome.
                if let Some(prior_id) = self.latest.get(&key).map(|id| id.clone())
                    && let Some(prior) = self.tasks.get(&prior_id).map(|t| t.clone())
                {
                    match prior.status {
                        TaskStatus::Done if !force => {
                            tracing::debug!("Enqueue {}: already indexed, returning done row", key);
                            return EnqueueOutcome {
                                queued: false,
                                existing: true,
                                task_id: prior.id,
                                status: TaskStatus::Done,
                            };
                        }
                        TaskStatus::Failed => {
                            // Failed rows are replaced, not resumed.
                            self.tasks.remove(&prior_id);
                            tracing::info!("Enqueue {}: replacing failed task {}", key, prior_id.0);
                        }
                        _ => {}
                    }
                }

                let now = now_ms();
                let task = BootstrapTask {
                    id: TaskId::new(),
                    subject,
                    dedup_key: key.clone(),
                    status: TaskStatus::Queued,
                    priority: priority.unwrap_or(0),
                    attempts: 0,
                    max_attempts: self.max_attempts,
                    progress: 0,
                    step: None,
                    last_error: None,
                    failure_reason: None,
                    failure_details: None,
                    next_retry_at: None,
                    started_at: None,
                    finished_at: None,
                    created_at: now,
                    updated_at: now,
                };
                let task_id = task.id.clone();

                self.tasks.insert(task_id.clone(), task);
                self.latest.insert(key.clone(), task_id.clone());
                vacant.insert(task_id.clone());

                tracing::info!("Enqueued bootstrap task {} ({})", task_id.0, key);
                EnqueueOutcome {
                    queued: true,
                    existing: false,
                    task_id,
                    status: TaskStatus::Queued,
                }
            }
        }
    }

    /// Atomically claims the next eligible task, if any.
    ///
    /// Eligible rows are `Queued` with no pending retry hold-off, served in
    /// `(priority ascending, created_at ascending)` order. The claim itself
    /// re-checks eligibility under the entry lock; if another caller won the
    /// race for a candidate, the next candidate is tried.
    pub fn claim_next(&self) -> Option<BootstrapTask> {
        let now = now_ms();

        let mut candidates: Vec<(i32, u64, TaskId)> = self
            .tasks
            .iter()
            .filter(|entry| entry.value().claimable(now))
            .map(|entry| {
                let t = entry.value();
                (t.priority, t.created_at, t.id.clone())
            })
            .collect();
        candidates.sort_by(|a, b| (a.0, a.1, &a.2.0).cmp(&(b.0, b.1, &b.2.0)));

        for (_, _, task_id) in candidates {
            if let Some(mut entry) = self.tasks.get_mut(&task_id) {
                // Re-check under the entry lock: another claimer may have won.
                if !entry.claimable(now) {
                    continue;
                }

                entry.status = TaskStatus::Running;
                entry.attempts += 1;
                entry.started_at = Some(now);
                entry.next_retry_at = None;
                // Fresh run: progress restarts so it stays monotone per run.
                entry.progress = 0;
                entry.step = None;
                entry.updated_at = now;

                tracing::debug!(
                    "Claimed task {} ({}) attempt {}/{}",
                    entry.id.0,
                    entry.dedup_key,
                    entry.attempts,
                    entry.max_attempts
                );
                return Some(entry.clone());
            }
        }

        None
    }

    /// Writes fractional progress onto a running task.
    ///
    /// Clamps to 0..=100 and never lowers an already-recorded value, keeping
    /// progress monotone within a run. Idempotent.
    pub fn update_progress(&self, task_id: &TaskId, progress: u8, step: Option<&str>) -> Result<()> {
        let mut entry = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| anyhow::anyhow!("Task not found: {}", task_id.0))?;

        entry.progress = entry.progress.max(progress.min(100));
        if let Some(step) = step {
            entry.step = Some(step.to_string());
        }
        entry.updated_at = now_ms();

        tracing::trace!("Task {} progress {}%", task_id.0, entry.progress);
        Ok(())
    }

    /// Marks a task successfully finished.
    pub fn mark_done(&self, task_id: &TaskId) -> Result<()> {
        let dedup_key = {
            let mut entry = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| anyhow::anyhow!("Task not found: {}", task_id.0))?;

            let now = now_ms();
            entry.status = TaskStatus::Done;
            entry.progress = 100;
            entry.finished_at = Some(now);
            entry.next_retry_at = None;
            entry.updated_at = now;
            entry.dedup_key.clone()
        };

        // Entry guard dropped before touching the active index; terminal rows
        // leave the uniqueness scope.
        self.active.remove(&dedup_key);
        tracing::info!("Task {} done", task_id.0);
        Ok(())
    }

    /// Records a step failure: either schedules a retry with backoff or, once
    /// attempts are exhausted, marks the task permanently failed.
    pub fn mark_failed(&self, task_id: &TaskId, error: &str) -> Result<FailureOutcome> {
        let reason = classify_failure(error);
        let now = now_ms();

        let (outcome, dedup_key) = {
            let mut entry = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| anyhow::anyhow!("Task not found: {}", task_id.0))?;

            entry.last_error = Some(error.to_string());
            entry.failure_reason = Some(reason);
            entry.failure_details = Some(truncate(error, MAX_FAILURE_DETAILS));
            entry.updated_at = now;

            if entry.attempts < entry.max_attempts {
                let delay = backoff_delay(entry.attempts);
                let retry_at = now + delay.as_millis() as u64;
                entry.status = TaskStatus::Queued;
                entry.next_retry_at = Some(retry_at);
                entry.step = None;

                tracing::warn!(
                    "Task {} failed ({}), retry {} in {}s: {}",
                    task_id.0,
                    reason,
                    entry.attempts,
                    delay.as_secs(),
                    error
                );
                (
                    FailureOutcome {
                        will_retry: true,
                        reason,
                        next_retry_at: Some(retry_at),
                    },
                    None,
                )
            } else {
                entry.status = TaskStatus::Failed;
                entry.finished_at = Some(now);
                entry.next_retry_at = None;

                tracing::error!(
                    "Task {} permanently failed after {} attempts ({}): {}",
                    task_id.0,
                    entry.attempts,
                    reason,
                    error
                );
                (
                    FailureOutcome {
                        will_retry: false,
                        reason,
                        next_retry_at: None,
                    },
                    Some(entry.dedup_key.clone()),
                )
            }
        };

        if let Some(key) = dedup_key {
            self.active.remove(&key);
        }
        Ok(outcome)
    }

    /// Resets `Running` rows older than `timeout` back to `Queued` with a
    /// synthetic worker-timeout failure and the ordinary backoff schedule.
    ///
    /// A stale row whose attempts are already exhausted goes terminal instead
    /// (requeueing it would let `attempts` exceed `max_attempts`). Safe to run
    /// from any instance: it targets elapsed time, not leadership.
    pub fn recover_stale(&self, timeout: Duration) -> Vec<TaskId> {
        let now = now_ms();
        let cutoff = now.saturating_sub(timeout.as_millis() as u64);

        let stale: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|entry| {
                let t = entry.value();
                t.status == TaskStatus::Running && t.started_at.is_some_and(|at| at < cutoff)
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut recovered = Vec::new();
        for task_id in stale {
            let error = format!(
                "worker timeout: task ran longer than {}s without finishing",
                timeout.as_secs()
            );
            // mark_failed re-checks nothing status-specific, so guard here:
            // only still-running, still-stale rows are touched.
            let still_stale = self
                .tasks
                .get(&task_id)
                .map(|t| t.status == TaskStatus::Running && t.started_at.is_some_and(|at| at < cutoff))
                .unwrap_or(false);
            if !still_stale {
                continue;
            }

            match self.mark_failed(&task_id, &error) {
                Ok(outcome) => {
                    tracing::warn!(
                        "Recovered stale task {} (will_retry={})",
                        task_id.0,
                        outcome.will_retry
                    );
                    recovered.push(task_id);
                }
                Err(e) => {
                    tracing::error!("Failed to recover stale task {}: {}", task_id.0, e);
                }
            }
        }

        recovered
    }

    /// Status snapshot for a subject. ETA is computed only for active rows.
    pub fn get_status(&self, subject: &SubjectRef) -> StatusSnapshot {
        self.get_status_by_key(&dedup_key(subject))
    }

    /// Status snapshot by dedup key. Prefers the active row, falling back to
    /// the most recent terminal row for the key.
    pub fn get_status_by_key(&self, key: &str) -> StatusSnapshot {
        let task_id = self
            .active
            .get(key)
            .map(|id| id.clone())
            .or_else(|| self.latest.get(key).map(|id| id.clone()));

        let Some(task) = task_id.and_then(|id| self.tasks.get(&id).map(|t| t.clone())) else {
            return StatusSnapshot::missing();
        };

        let eta = task
            .status
            .is_active()
            .then(|| eta_seconds(task.subject.subject_type, task.progress));

        StatusSnapshot {
            exists: true,
            status: Some(task.status),
            progress: Some(task.progress),
            step: task.step,
            eta_seconds: eta,
            attempts: Some(task.attempts),
            updated_at: Some(task.updated_at),
        }
    }

    /// Counts tasks by status.
    pub fn get_queue_stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            queued: 0,
            running: 0,
            done: 0,
            failed: 0,
            total: 0,
        };

        for entry in self.tasks.iter() {
            match entry.value().status {
                TaskStatus::Queued => stats.queued += 1,
                TaskStatus::Running => stats.running += 1,
                TaskStatus::Done => stats.done += 1,
                TaskStatus::Failed => stats.failed += 1,
            }
            stats.total += 1;
        }

        stats
    }

    /// Number of permanently failed tasks whose failure is younger than
    /// `window`. Lets the stats aggregator ignore stale failures.
    pub fn failed_within(&self, window: Duration) -> usize {
        let cutoff = now_ms().saturating_sub(window.as_millis() as u64);
        self.tasks
            .iter()
            .filter(|entry| {
                let t = entry.value();
                t.status == TaskStatus::Failed && t.finished_at.is_some_and(|at| at >= cutoff)
            })
            .count()
    }

    pub fn get_task(&self, task_id: &TaskId) -> Option<BootstrapTask> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Test hook for rewinding timestamps and similar row surgery.
    #[cfg(test)]
    pub fn with_task_mut(&self, task_id: &TaskId, f: impl FnOnce(&mut BootstrapTask)) {
        if let Some(mut entry) = self.tasks.get_mut(task_id) {
            f(&mut entry);
        }
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Character-boundary-safe truncation.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
