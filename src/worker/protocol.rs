//! HTTP contracts for worker control.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_WORKER_START: &str = "/worker/start";
pub const ENDPOINT_WORKER_STOP: &str = "/worker/stop";
pub const ENDPOINT_WORKER_STATUS: &str = "/worker/status";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStartResponse {
    /// False when another instance holds the leadership lease.
    pub started: bool,
    pub running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStopResponse {
    pub running: bool,
}
