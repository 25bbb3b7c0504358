//! Retry Backoff & Failure Classification
//!
//! Pure functions shared by ordinary failure handling (`mark_failed`) and the
//! stale-task recovery sweep. Both are total: classification degrades to
//! `Unknown` rather than erroring, and the delay is bounded above.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Base retry delay; doubles per attempt.
pub const BACKOFF_BASE: Duration = Duration::from_secs(30);

/// Cap on the retry delay. Matches the stale-task timeout so a retrying task
/// never waits longer than a stuck one would take to be recovered.
pub const BACKOFF_CAP: Duration = Duration::from_secs(30 * 60);

/// Closed set of failure categories recorded on a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    Timeout,
    RateLimited,
    UpstreamError,
    Validation,
    Unknown,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::RateLimited => "rate-limited",
            FailureReason::UpstreamError => "upstream-error",
            FailureReason::Validation => "validation",
            FailureReason::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exponential retry delay: `base * 2^attempts`, capped.
///
/// Non-decreasing in `attempts` and bounded above by [`BACKOFF_CAP`].
pub fn backoff_delay(attempts: u32) -> Duration {
    let factor = 1u64 << attempts.min(32);
    let delay = BACKOFF_BASE
        .as_secs()
        .saturating_mul(factor)
        .min(BACKOFF_CAP.as_secs());
    Duration::from_secs(delay)
}

/// Maps raw error text to a failure category via pattern matching.
///
/// Matching is case-insensitive and order matters: more specific categories
/// are checked before the generic upstream bucket.
pub fn classify_failure(message: &str) -> FailureReason {
    let lower = message.to_lowercase();

    if lower.contains("timeout") || lower.contains("timed out") || lower.contains("deadline") {
        FailureReason::Timeout
    } else if lower.contains("rate limit")
        || lower.contains("too many requests")
        || lower.contains("429")
    {
        FailureReason::RateLimited
    } else if lower.contains("upstream")
        || lower.contains("bad gateway")
        || lower.contains("unavailable")
        || lower.contains("502")
        || lower.contains("503")
    {
        FailureReason::UpstreamError
    } else if lower.contains("invalid")
        || lower.contains("validation")
        || lower.contains("malformed")
        || lower.contains("missing")
    {
        FailureReason::Validation
    } else {
        FailureReason::Unknown
    }
}
