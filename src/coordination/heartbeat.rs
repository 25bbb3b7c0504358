//! Best-effort liveness recording. Failures here are logged by the caller,
//! never fatal: a missed heartbeat write must not stop the worker.

use anyhow::Result;

/// Heartbeat sink port.
pub trait HeartbeatSink: Send + Sync {
    fn update(&self, key: &str, metadata: serde_json::Value) -> Result<()>;
}

/// Default sink: log-only.
pub struct TracingHeartbeat;

impl HeartbeatSink for TracingHeartbeat {
    fn update(&self, key: &str, metadata: serde_json::Value) -> Result<()> {
        tracing::trace!("Heartbeat {}: {}", key, metadata);
        Ok(())
    }
}
