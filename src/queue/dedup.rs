//! Dedup Key Function
//!
//! Pure mapping from (subject type, chain, identifier) to a stable identity
//! string. This is the sole idempotency mechanism of the queue: identical
//! inputs (after normalization in `SubjectRef::new`) always yield the
//! identical key, so it must never incorporate time or randomness.

use super::types::SubjectRef;

const DEDUP_PREFIX: &str = "bootstrap";

/// Computes the dedup key for a subject.
///
/// Format: `bootstrap:{subject_type}:{chain}:{identifier}`, all lower-case.
pub fn dedup_key(subject: &SubjectRef) -> String {
    format!(
        "{}:{}:{}:{}",
        DEDUP_PREFIX,
        subject.subject_type.as_str(),
        subject.chain,
        subject.identifier
    )
}
