//! HTTP contracts for the bootstrap enqueue/status surface.

use serde::{Deserialize, Serialize};

use super::store::{QueueStats, StatusSnapshot};
use super::types::{SubjectType, TaskId, TaskStatus};

pub const ENDPOINT_ENQUEUE: &str = "/bootstrap/enqueue";
pub const ENDPOINT_STATUS: &str = "/bootstrap/status/:subject_type/:chain/:identifier";
pub const ENDPOINT_STATUS_BY_KEY: &str = "/bootstrap/task/:dedup_key";
pub const ENDPOINT_STATS: &str = "/bootstrap/stats";
pub const ENDPOINT_STATS_REFRESH: &str = "/bootstrap/stats/refresh";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    pub subject_type: SubjectType,
    pub chain: String,
    pub identifier: String,
    #[serde(default)]
    pub priority: Option<i32>,
    /// Explicitly requests re-indexing of an already-done subject.
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueResponse {
    pub queued: bool,
    pub existing: bool,
    pub task_id: TaskId,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub snapshot: StatusSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: QueueStats,
}
