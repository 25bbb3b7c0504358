//! Bootstrap Indexing Queue Library
//!
//! This library crate implements the core of the bootstrap indexing subsystem:
//! a durable, idempotent task queue that drives multi-step data-indexing
//! pipelines ("bootstrap" a wallet/actor/entity/token into the system), with
//! single-active-worker semantics enforced by a leased lock.
//!
//! ## Architecture Modules
//! The system is composed of six loosely coupled subsystems:
//!
//! - **`queue`**: The task store. Owns idempotent enqueue (dedup-keyed),
//!   atomic claiming, retry backoff, status/stat projections, and stale-task
//!   recovery.
//! - **`pipeline`**: Subject types, the fixed ordered step lists per subject
//!   type, hard-coded ETA averages, and the registry mapping step names to
//!   the indexing handlers supplied by external services.
//! - **`worker`**: The single-active worker loop. Acquires the leadership
//!   lease, polls for claimable tasks, runs step pipelines, and hands
//!   terminal outcomes back to the store.
//! - **`coordination`**: The leadership lease and heartbeat ports, plus an
//!   in-memory TTL lease used by single-process deployments and tests.
//! - **`events`**: Fire-and-forget output ports: the bootstrap event bus and
//!   the downstream resolution sink.
//! - **`stats`**: Queue-wide count aggregation and the throttled
//!   `bootstrap.stats.updated` publisher.

pub mod coordination;
pub mod events;
pub mod pipeline;
pub mod queue;
pub mod stats;
pub mod worker;
