use serde::{Deserialize, Serialize};

use super::backoff::FailureReason;

/// Unique identifier for a bootstrap task.
///
/// Wrapper around a UUID string assigned by the store on creation. Stable for
/// the task's lifetime; a re-enqueued subject gets a fresh id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generates a new random UUID v4-based TaskId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// The kind of subject being bootstrapped. Selects which step pipeline runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Wallet,
    Actor,
    Entity,
    Token,
}

impl SubjectType {
    pub const ALL: [SubjectType; 4] = [
        SubjectType::Wallet,
        SubjectType::Actor,
        SubjectType::Entity,
        SubjectType::Token,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Wallet => "wallet",
            SubjectType::Actor => "actor",
            SubjectType::Entity => "entity",
            SubjectType::Token => "token",
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubjectType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wallet" => Ok(SubjectType::Wallet),
            "actor" => Ok(SubjectType::Actor),
            "entity" => Ok(SubjectType::Entity),
            "token" => Ok(SubjectType::Token),
            other => Err(anyhow::anyhow!("Unknown subject type: {}", other)),
        }
    }
}

/// The thing being indexed: subject type, chain, and one identifier.
///
/// Identifiers are normalized (trimmed, lower-cased) on construction so that
/// `0xABC` and `0xabc` map to the same dedup key. Depending on the subject
/// type the identifier is a wallet address, an actor/entity id, or a token
/// contract address; the accessors expose whichever applies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubjectRef {
    pub subject_type: SubjectType,
    pub chain: String,
    pub identifier: String,
}

impl SubjectRef {
    pub fn new(subject_type: SubjectType, chain: &str, identifier: &str) -> Self {
        Self {
            subject_type,
            chain: chain.trim().to_lowercase(),
            identifier: identifier.trim().to_lowercase(),
        }
    }

    /// Wallet address, for wallet subjects.
    pub fn address(&self) -> Option<&str> {
        matches!(self.subject_type, SubjectType::Wallet).then_some(self.identifier.as_str())
    }

    /// Actor or entity id, for actor/entity subjects.
    pub fn subject_id(&self) -> Option<&str> {
        matches!(self.subject_type, SubjectType::Actor | SubjectType::Entity)
            .then_some(self.identifier.as_str())
    }

    /// Token contract address, for token subjects.
    pub fn token_address(&self) -> Option<&str> {
        matches!(self.subject_type, SubjectType::Token).then_some(self.identifier.as_str())
    }
}

/// Lifecycle state of a bootstrap task.
///
/// Valid transitions: `Queued -> Running` (claim), `Running -> Done`
/// (success), `Running -> Queued` (retryable failure or stale recovery),
/// `Running -> Failed` (attempts exhausted). `Done` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    /// Active statuses participate in the dedup uniqueness constraint.
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Queued | TaskStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Running => "running",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        }
    }
}

/// One row of indexing work, keyed by `id` in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapTask {
    pub id: TaskId,
    pub subject: SubjectRef,
    /// Deterministic identity string; unique among `Queued`/`Running` rows.
    pub dedup_key: String,
    pub status: TaskStatus,
    /// Lower is served first; ties broken by creation order (FIFO).
    pub priority: i32,
    /// Claim attempts so far; incremented on every claim.
    pub attempts: u32,
    /// Ceiling after which a failure becomes terminal.
    pub max_attempts: u32,
    /// 0..=100, monotonically non-decreasing within a single run.
    pub progress: u8,
    /// Current pipeline step name, for UI/ETA.
    pub step: Option<String>,
    pub last_error: Option<String>,
    pub failure_reason: Option<FailureReason>,
    /// Truncated raw error message.
    pub failure_details: Option<String>,
    /// Earliest time (epoch ms) the task may be reclaimed after a failure.
    pub next_retry_at: Option<u64>,
    pub started_at: Option<u64>,
    pub finished_at: Option<u64>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl BootstrapTask {
    /// Eligible for `claim_next`: queued and past any retry hold-off.
    pub fn claimable(&self, now: u64) -> bool {
        self.status == TaskStatus::Queued && self.next_retry_at.is_none_or(|at| at <= now)
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
