//! Worker Loop Implementation
//!
//! Owns the leadership lease and the three background loops (poll, heartbeat,
//! stale sweep). Step-pipeline errors are caught at the task boundary and
//! converted into store mutations plus events; they never propagate to the
//! poll loop itself, so one bad task cannot stop the loop from picking up the
//! next one.

use crate::coordination::heartbeat::HeartbeatSink;
use crate::coordination::lease::LeadershipLease;
use crate::events::{BootstrapEvent, EventBus, Resolution, ResolutionSink};
use crate::pipeline::registry::{StepContext, StepRegistry};
use crate::pipeline::steps::{avg_step_secs, steps_for};
use crate::queue::store::TaskStore;
use crate::queue::types::BootstrapTask;

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Tunables for the worker loops. Defaults suit production; tests shrink the
/// intervals to milliseconds.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Lease key identifying this worker role.
    pub lease_key: String,
    /// TTL requested when acquiring the lease.
    pub lease_ttl: Duration,
    /// How often the lease is renewed and the heartbeat sink written.
    pub heartbeat_interval: Duration,
    /// How often the store is polled for claimable work.
    pub poll_interval: Duration,
    /// How often the stale-task sweep runs.
    pub sweep_interval: Duration,
    /// Age at which a `Running` task counts as stale.
    pub stale_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            lease_key: "bootstrap-worker".to_string(),
            lease_ttl: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(5 * 60),
            stale_timeout: Duration::from_secs(30 * 60),
        }
    }
}

/// Worker control surface snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub running: bool,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

/// The single-active bootstrap worker.
pub struct BootstrapWorker {
    store: Arc<TaskStore>,
    steps: Arc<StepRegistry>,
    lease: Arc<dyn LeadershipLease>,
    heartbeat: Arc<dyn HeartbeatSink>,
    bus: Arc<dyn EventBus>,
    resolutions: Arc<dyn ResolutionSink>,
    config: WorkerConfig,
    running: AtomicBool,
}

impl BootstrapWorker {
    pub fn new(
        store: Arc<TaskStore>,
        steps: Arc<StepRegistry>,
        lease: Arc<dyn LeadershipLease>,
        heartbeat: Arc<dyn HeartbeatSink>,
        bus: Arc<dyn EventBus>,
        resolutions: Arc<dyn ResolutionSink>,
        config: WorkerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            steps,
            lease,
            heartbeat,
            bus,
            resolutions,
            config,
            running: AtomicBool::new(false),
        })
    }

    /// Starts the worker loops, if the leadership lease can be acquired.
    ///
    /// Returns false without any side effects when another instance holds
    /// the lease. Idempotent: a second call on a running worker returns true.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.load(Ordering::SeqCst) {
            tracing::debug!("Worker already running");
            return true;
        }

        if !self
            .lease
            .acquire(&self.config.lease_key, self.config.lease_ttl)
        {
            tracing::warn!(
                "Worker not started: lease '{}' held by another instance",
                self.config.lease_key
            );
            return false;
        }

        self.running.store(true, Ordering::SeqCst);
        tracing::info!(
            "Bootstrap worker started (poll {}ms, stale timeout {}s)",
            self.config.poll_interval.as_millis(),
            self.config.stale_timeout.as_secs()
        );

        let worker = self.clone();
        tokio::spawn(async move {
            worker.poll_loop().await;
        });

        let worker = self.clone();
        tokio::spawn(async move {
            worker.heartbeat_loop().await;
        });

        let worker = self.clone();
        tokio::spawn(async move {
            worker.sweep_loop().await;
        });

        true
    }

    /// Stops claiming work and releases the lease. Any step currently in
    /// flight finishes; there is no explicit cancel.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.lease.release(&self.config.lease_key);
            tracing::info!("Bootstrap worker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> WorkerStatus {
        WorkerStatus {
            running: self.is_running(),
            poll_interval_ms: self.config.poll_interval.as_millis() as u64,
            timeout_ms: self.config.stale_timeout.as_millis() as u64,
        }
    }

    /// The claim loop: drains eligible tasks, then idles until the next tick.
    async fn poll_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.poll_interval);

        loop {
            interval.tick().await;
            if !self.is_running() {
                break;
            }

            // Drain: claim until the store has nothing eligible, then sleep.
            while self.is_running() {
                match self.store.claim_next() {
                    Some(task) => self.process_task(task).await,
                    None => break,
                }
            }
        }

        tracing::debug!("Poll loop exited");
    }

    /// Lease renewal plus best-effort heartbeat recording.
    ///
    /// A failed renewal is the one condition that halts the worker: the
    /// single-writer invariant matters more than liveness. Heartbeat sink
    /// failures are logged and ignored.
    async fn heartbeat_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.heartbeat_interval);

        loop {
            interval.tick().await;
            if !self.is_running() {
                break;
            }

            if !self.lease.refresh(&self.config.lease_key) {
                tracing::error!(
                    "Lost lease '{}'; halting worker to preserve single-writer guarantee",
                    self.config.lease_key
                );
                self.running.store(false, Ordering::SeqCst);
                break;
            }

            let stats = self.store.get_queue_stats();
            let metadata = serde_json::json!({
                "queued": stats.queued,
                "running": stats.running,
                "pollIntervalMs": self.config.poll_interval.as_millis() as u64,
            });
            if let Err(e) = self.heartbeat.update(&self.config.lease_key, metadata) {
                tracing::warn!("Heartbeat write failed: {}", e);
            }
        }

        tracing::debug!("Heartbeat loop exited");
    }

    /// Periodic stale-task recovery, independent of the claim loop.
    async fn sweep_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.sweep_interval);

        loop {
            interval.tick().await;
            if !self.is_running() {
                break;
            }

            let recovered = self.store.recover_stale(self.config.stale_timeout);
            if !recovered.is_empty() {
                tracing::warn!("Stale sweep requeued {} task(s)", recovered.len());
            }
        }

        tracing::debug!("Sweep loop exited");
    }

    /// Runs the full step pipeline for one claimed task.
    ///
    /// Steps run synchronously one after another; a step failing fails the
    /// whole task and the remaining steps are skipped.
    async fn process_task(&self, task: BootstrapTask) {
        let steps = steps_for(task.subject.subject_type);
        let total = steps.len();
        let ctx = StepContext {
            subject: task.subject.clone(),
        };

        tracing::info!(
            "Processing task {} ({}): {} step(s)",
            task.id.0,
            task.dedup_key,
            total
        );

        for (index, &step) in steps.iter().enumerate() {
            if let Err(e) = self.steps.run_step(step, ctx.clone()).await {
                self.handle_step_failure(&task, step, &e.to_string()).await;
                return;
            }

            let completed = index + 1;
            let progress = ((100 * completed + total / 2) / total).min(100) as u8;
            let eta = avg_step_secs(task.subject.subject_type) * (total - completed) as u64;

            if let Err(e) = self.store.update_progress(&task.id, progress, Some(step)) {
                tracing::error!("Progress write failed for task {}: {}", task.id.0, e);
            }
            self.bus.emit(BootstrapEvent::Progress {
                dedup_key: task.dedup_key.clone(),
                progress,
                step: step.to_string(),
                eta_seconds: eta,
            });
        }

        match self.store.mark_done(&task.id) {
            Ok(()) => {
                self.bus.emit(BootstrapEvent::Done {
                    dedup_key: task.dedup_key.clone(),
                });
                self.resolutions.resolve(&task.dedup_key, Resolution::Done);
            }
            Err(e) => {
                tracing::error!("Failed to finalize task {}: {}", task.id.0, e);
            }
        }
    }

    /// Converts a step error into a store mutation plus events. Never
    /// propagates: the poll loop must survive any task.
    async fn handle_step_failure(&self, task: &BootstrapTask, step: &str, error: &str) {
        tracing::warn!("Task {} failed at step '{}': {}", task.id.0, step, error);

        match self.store.mark_failed(&task.id, error) {
            Ok(outcome) if outcome.will_retry => {
                tracing::info!(
                    "Task {} will retry (reason: {})",
                    task.id.0,
                    outcome.reason
                );
            }
            Ok(outcome) => {
                // Terminal: tell downstream consumers to stop waiting.
                self.bus.emit(BootstrapEvent::Failed {
                    dedup_key: task.dedup_key.clone(),
                    error: error.to_string(),
                    failure_reason: outcome.reason,
                });
                self.resolutions.resolve(&task.dedup_key, Resolution::Failed);
            }
            Err(e) => {
                tracing::error!("Failed to record failure for task {}: {}", task.id.0, e);
            }
        }
    }
}
