//! Bootstrap Worker Module
//!
//! The single-active worker that drives the queue. Follows a pull-based model
//! under a leadership lease:
//! 1. **Leadership**: the loop acquires a TTL lease before doing any work; if
//!    another instance holds it, the loop does not start at all.
//! 2. **Polling**: on a fixed interval the worker claims the next eligible
//!    task (atomic `Queued -> Running` flip in the store).
//! 3. **Execution**: the step pipeline for the task's subject type runs
//!    strictly in order on this worker, one step at a time; progress and an
//!    ETA are written after each step.
//! 4. **Heartbeat**: the lease is renewed on a short interval; a failed
//!    renewal halts claiming (better to stop than to let two workers run).
//! 5. **Recovery**: a slower sweep requeues `Running` tasks whose worker
//!    likely died.
//!
//! ## Submodules
//! - **`worker`**: `BootstrapWorker` and its lifecycle (`start`/`stop`).
//! - **`protocol`**: HTTP contracts for worker control.
//! - **`handlers`**: Axum handlers for start/stop/status.

pub mod handlers;
pub mod protocol;
pub mod worker;
