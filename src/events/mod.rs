//! Bootstrap Event Ports
//!
//! Fire-and-forget output ports of the core. The worker and the stats
//! aggregator emit events here; delivery is at-most-once and must never block
//! or fail the caller. Implementations are injected so tests can assert on
//! emitted events without a real bus.
//!
//! ## Ports
//! - **`EventBus`**: progress/done/failed/stats fan-out to the rest of the
//!   product (UI push, caches, alerting).
//! - **`ResolutionSink`**: terminal done/failed notifications for the
//!   downstream resolution cache, so other modules stop treating a subject as
//!   pending.

#[cfg(test)]
mod tests;

use serde::Serialize;
use std::sync::Mutex;

use crate::queue::backoff::FailureReason;
use crate::stats::SystemState;

/// Events published on the bootstrap event bus.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum BootstrapEvent {
    Progress {
        dedup_key: String,
        progress: u8,
        step: String,
        eta_seconds: u64,
    },
    Done {
        dedup_key: String,
    },
    Failed {
        dedup_key: String,
        error: String,
        failure_reason: FailureReason,
    },
    StatsUpdated {
        active_tasks: usize,
        queued_tasks: usize,
        failed_tasks: usize,
        state: SystemState,
        last_updated: u64,
    },
}

impl BootstrapEvent {
    /// Wire topic name for the event.
    pub fn topic(&self) -> &'static str {
        match self {
            BootstrapEvent::Progress { .. } => "bootstrap.progress",
            BootstrapEvent::Done { .. } => "bootstrap.done",
            BootstrapEvent::Failed { .. } => "bootstrap.failed",
            BootstrapEvent::StatsUpdated { .. } => "bootstrap.stats.updated",
        }
    }
}

/// Fire-and-forget event emission port.
pub trait EventBus: Send + Sync {
    fn emit(&self, event: BootstrapEvent);
}

/// Default bus: structured log lines only. Deployments wire a real transport
/// here; the core does not care which.
pub struct TracingBus;

impl EventBus for TracingBus {
    fn emit(&self, event: BootstrapEvent) {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        tracing::debug!("Event {}: {}", event.topic(), payload);
    }
}

/// Test double that records every emitted event.
pub struct RecordingBus {
    events: Mutex<Vec<BootstrapEvent>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<BootstrapEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn topics(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.topic()).collect()
    }
}

impl Default for RecordingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for RecordingBus {
    fn emit(&self, event: BootstrapEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Terminal outcome handed to the downstream resolution cache.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Done,
    Failed,
}

/// Downstream status sink: lets the rest of the system stop treating a
/// subject as "pending" once its bootstrap terminates.
pub trait ResolutionSink: Send + Sync {
    fn resolve(&self, dedup_key: &str, resolution: Resolution);
}

/// Default sink: log-only.
pub struct TracingResolutionSink;

impl ResolutionSink for TracingResolutionSink {
    fn resolve(&self, dedup_key: &str, resolution: Resolution) {
        tracing::info!("Resolved {} as {:?}", dedup_key, resolution);
    }
}

/// Test double recording resolutions.
pub struct RecordingResolutionSink {
    resolutions: Mutex<Vec<(String, Resolution)>>,
}

impl RecordingResolutionSink {
    pub fn new() -> Self {
        Self {
            resolutions: Mutex::new(Vec::new()),
        }
    }

    pub fn resolutions(&self) -> Vec<(String, Resolution)> {
        self.resolutions.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Default for RecordingResolutionSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolutionSink for RecordingResolutionSink {
    fn resolve(&self, dedup_key: &str, resolution: Resolution) {
        if let Ok(mut resolutions) = self.resolutions.lock() {
            resolutions.push((dedup_key.to_string(), resolution));
        }
    }
}
