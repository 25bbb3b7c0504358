//! Queue Stats Module
//!
//! Pure read/derive over the task store: counts by status plus a coarse
//! tri-state system health, published on the event bus throttled to one
//! emission per window. The throttle timestamp is process-local and
//! best-effort, not correctness-critical.

pub mod aggregator;


use serde::Serialize;

/// Coarse system state derived from queue contents.
///
/// Any queued or running work wins over everything else; a recent permanent
/// failure flags `Error`; otherwise the system is `Idle`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SystemState {
    Idle,
    Indexing,
    Error,
}

impl SystemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemState::Idle => "idle",
            SystemState::Indexing => "indexing",
            SystemState::Error => "error",
        }
    }
}
