use super::protocol::*;
use super::worker::{BootstrapWorker, WorkerStatus};

use axum::{Extension, Json, http::StatusCode};
use std::sync::Arc;

pub async fn handle_worker_start(
    Extension(worker): Extension<Arc<BootstrapWorker>>,
) -> (StatusCode, Json<WorkerStartResponse>) {
    let started = worker.start();
    let code = if started {
        StatusCode::OK
    } else {
        // Another instance is active; not an error, but not this process.
        StatusCode::CONFLICT
    };

    (
        code,
        Json(WorkerStartResponse {
            started,
            running: worker.is_running(),
        }),
    )
}

pub async fn handle_worker_stop(
    Extension(worker): Extension<Arc<BootstrapWorker>>,
) -> (StatusCode, Json<WorkerStopResponse>) {
    worker.stop();
    (
        StatusCode::OK,
        Json(WorkerStopResponse {
            running: worker.is_running(),
        }),
    )
}

pub async fn handle_worker_status(
    Extension(worker): Extension<Arc<BootstrapWorker>>,
) -> (StatusCode, Json<WorkerStatus>) {
    (StatusCode::OK, Json(worker.status()))
}
