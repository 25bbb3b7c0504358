//! Worker Coordination Module
//!
//! The at-most-one-worker-active guarantee does not come from in-process
//! locking: multiple process instances may exist, and only the holder of a
//! TTL lease polls and claims. This module defines the lease and heartbeat
//! ports the worker consumes, plus an in-memory lease implementation with
//! real expiry semantics for single-process deployments and tests. The
//! lease's own durable storage is an external concern behind the trait.
//!
//! ## Submodules
//! - **`lease`**: `LeadershipLease` port and `InMemoryLease`.
//! - **`heartbeat`**: `HeartbeatSink` port (best-effort liveness recording).

pub mod heartbeat;
pub mod lease;

#[cfg(test)]
mod tests;
