//! Stats Aggregator
//!
//! Derives queue-wide counts and the tri-state system health from the task
//! store and pushes `bootstrap.stats.updated` events, throttled to at most
//! one emission per window regardless of how many callers request it. An
//! explicit force path bypasses the throttle for cold-start/refresh callers.

use super::SystemState;
use crate::events::{BootstrapEvent, EventBus};
use crate::queue::store::TaskStore;
use crate::queue::types::now_ms;

use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Throttle window for stats emissions.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(3);

/// Rolling window for counting failures toward the `Error` state. Old
/// permanent failures should not permanently flag the system as unhealthy.
pub const DEFAULT_FAILURE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Point-in-time system summary, mirroring the stats event payload.
#[derive(Debug, Clone, Serialize)]
pub struct SystemSnapshot {
    pub active_tasks: usize,
    pub queued_tasks: usize,
    pub failed_tasks: usize,
    pub state: SystemState,
    pub last_updated: u64,
}

pub struct StatsAggregator {
    store: Arc<TaskStore>,
    bus: Arc<dyn EventBus>,
    last_emit: Mutex<Option<Instant>>,
    throttle_window: Duration,
    failure_window: Duration,
}

impl StatsAggregator {
    pub fn new(store: Arc<TaskStore>, bus: Arc<dyn EventBus>) -> Arc<Self> {
        Self::with_windows(store, bus, DEFAULT_THROTTLE_WINDOW, DEFAULT_FAILURE_WINDOW)
    }

    pub fn with_windows(
        store: Arc<TaskStore>,
        bus: Arc<dyn EventBus>,
        throttle_window: Duration,
        failure_window: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            bus,
            last_emit: Mutex::new(None),
            throttle_window,
            failure_window,
        })
    }

    /// Computes the current summary without emitting anything.
    pub fn snapshot(&self) -> SystemSnapshot {
        let stats = self.store.get_queue_stats();
        let recent_failures = self.store.failed_within(self.failure_window);

        // Active work always takes priority in the reported state.
        let state = if stats.queued + stats.running > 0 {
            SystemState::Indexing
        } else if recent_failures > 0 {
            SystemState::Error
        } else {
            SystemState::Idle
        };

        SystemSnapshot {
            active_tasks: stats.running,
            queued_tasks: stats.queued,
            failed_tasks: recent_failures,
            state,
            last_updated: now_ms(),
        }
    }

    /// Publishes a stats event, subject to the throttle.
    ///
    /// Returns the snapshot when an event was emitted, `None` when the
    /// throttle suppressed it. `force` bypasses the throttle.
    pub fn publish(&self, force: bool) -> Option<SystemSnapshot> {
        {
            let mut last = match self.last_emit.lock() {
                Ok(guard) => guard,
                Err(_) => return None,
            };

            if !force
                && let Some(at) = *last
                && at.elapsed() < self.throttle_window
            {
                tracing::trace!("Stats emission throttled");
                return None;
            }
            *last = Some(Instant::now());
        }

        let snapshot = self.snapshot();
        self.bus.emit(BootstrapEvent::StatsUpdated {
            active_tasks: snapshot.active_tasks,
            queued_tasks: snapshot.queued_tasks,
            failed_tasks: snapshot.failed_tasks,
            state: snapshot.state,
            last_updated: snapshot.last_updated,
        });

        tracing::debug!(
            "Published stats: {:?} ({} active, {} queued, {} failed)",
            snapshot.state,
            snapshot.active_tasks,
            snapshot.queued_tasks,
            snapshot.failed_tasks
        );
        Some(snapshot)
    }
}
