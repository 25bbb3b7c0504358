use super::protocol::*;
use super::store::{StatusSnapshot, TaskStore};
use super::types::{SubjectRef, SubjectType};
use crate::stats::aggregator::StatsAggregator;

use axum::{Extension, Json, extract::Path, http::StatusCode};
use std::sync::Arc;

pub async fn handle_enqueue(
    Extension(store): Extension<Arc<TaskStore>>,
    Extension(stats): Extension<Arc<StatsAggregator>>,
    Json(req): Json<EnqueueRequest>,
) -> (StatusCode, Json<EnqueueResponse>) {
    let subject = SubjectRef::new(req.subject_type, &req.chain, &req.identifier);
    let outcome = store.enqueue(subject, req.priority, req.force);

    tracing::info!(
        "Enqueue request: {} {} {} -> {} (queued={})",
        req.subject_type,
        req.chain,
        req.identifier,
        outcome.task_id.0,
        outcome.queued
    );

    // Queue composition changed; let the throttle decide whether to emit.
    if outcome.queued {
        stats.publish(false);
    }

    (
        StatusCode::OK,
        Json(EnqueueResponse {
            queued: outcome.queued,
            existing: outcome.existing,
            task_id: outcome.task_id,
            status: outcome.status,
        }),
    )
}

pub async fn handle_get_status(
    Extension(store): Extension<Arc<TaskStore>>,
    Path((subject_type, chain, identifier)): Path<(String, String, String)>,
) -> (StatusCode, Json<StatusResponse>) {
    let Ok(subject_type) = subject_type.parse::<SubjectType>() else {
        tracing::debug!("Status query with unknown subject type: {}", subject_type);
        return (
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                snapshot: StatusSnapshot::missing(),
            }),
        );
    };

    let subject = SubjectRef::new(subject_type, &chain, &identifier);
    let snapshot = store.get_status(&subject);
    let code = if snapshot.exists {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    (code, Json(StatusResponse { snapshot }))
}

pub async fn handle_get_status_by_key(
    Extension(store): Extension<Arc<TaskStore>>,
    Path(dedup_key): Path<String>,
) -> (StatusCode, Json<StatusResponse>) {
    let snapshot = store.get_status_by_key(&dedup_key);
    let code = if snapshot.exists {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };

    (code, Json(StatusResponse { snapshot }))
}

pub async fn handle_get_stats(
    Extension(store): Extension<Arc<TaskStore>>,
) -> (StatusCode, Json<StatsResponse>) {
    let stats = store.get_queue_stats();
    (StatusCode::OK, Json(StatsResponse { stats }))
}

/// Force path for cold-start/refresh callers: bypasses the stats throttle.
pub async fn handle_stats_refresh(
    Extension(stats): Extension<Arc<StatsAggregator>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match stats.publish(true) {
        Some(snapshot) => (
            StatusCode::OK,
            Json(serde_json::to_value(&snapshot).unwrap_or_default()),
        ),
        None => (StatusCode::OK, Json(serde_json::json!({"emitted": false}))),
    }
}
