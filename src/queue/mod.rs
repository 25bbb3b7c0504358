//! Bootstrap Task Store Module
//!
//! This module implements the durable record of every bootstrap task. The
//! store is the single source of truth of the core: every other subsystem
//! (worker loop, stats aggregator, HTTP surface) reads from or mutates it.
//!
//! ## Lifecycle Overview
//! 1. **Enqueue**: Callers submit a subject (wallet/actor/entity/token). The
//!    store computes a deterministic dedup key and refuses to create a second
//!    active row for the same key (idempotent enqueue).
//! 2. **Claim**: The worker atomically flips one eligible `Queued` row to
//!    `Running`, ordered by `(priority, created_at)`. Per-entry locking makes
//!    the transition a compare-and-set: concurrent claimers never both win.
//! 3. **Progress / Terminal**: The worker writes fractional progress after
//!    each step and finishes with `mark_done` or `mark_failed`. Failures are
//!    classified and retried with exponential backoff until `max_attempts`.
//! 4. **Stale recovery**: `Running` rows whose worker likely died (detected
//!    purely by elapsed wall-clock time) are reset to `Queued` through the
//!    same backoff machinery.
//!
//! ## Submodules
//! - **`types`**: Task rows, subject references, status enums.
//! - **`dedup`**: The pure dedup key function (sole idempotency mechanism).
//! - **`backoff`**: Pure retry-delay and failure-classification functions.
//! - **`store`**: The `TaskStore` itself.
//! - **`protocol`**: HTTP request/response contracts for the enqueue/status
//!   surface.
//! - **`handlers`**: Axum handlers consuming the store.

pub mod backoff;
pub mod dedup;
pub mod handlers;
pub mod protocol;
pub mod store;
pub mod types;
