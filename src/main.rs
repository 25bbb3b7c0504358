use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use bootstrap_indexer::coordination::heartbeat::TracingHeartbeat;
use bootstrap_indexer::coordination::lease::InMemoryLease;
use bootstrap_indexer::events::{TracingBus, TracingResolutionSink};
use bootstrap_indexer::pipeline::registry::{StepContext, StepRegistry};
use bootstrap_indexer::pipeline::steps::steps_for;
use bootstrap_indexer::queue::handlers::{
    handle_enqueue, handle_get_stats, handle_get_status, handle_get_status_by_key,
    handle_stats_refresh,
};
use bootstrap_indexer::queue::protocol::*;
use bootstrap_indexer::queue::store::TaskStore;
use bootstrap_indexer::queue::types::SubjectType;
use bootstrap_indexer::stats::aggregator::StatsAggregator;
use bootstrap_indexer::worker::handlers::{
    handle_worker_start, handle_worker_status, handle_worker_stop,
};
use bootstrap_indexer::worker::protocol::*;
use bootstrap_indexer::worker::worker::{BootstrapWorker, WorkerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut bind_addr: SocketAddr = "127.0.0.1:8003".parse()?;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                bind_addr = args[i + 1].parse()?;
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    tracing::info!("Starting bootstrap indexer on {}", bind_addr);

    // 1. Task store and step registry:
    let store = Arc::new(TaskStore::new());
    let registry = StepRegistry::new();

    // Placeholder step handlers; real deployments register the indexing
    // services here instead.
    for subject_type in SubjectType::ALL {
        for step in steps_for(subject_type) {
            if registry.has_handler(step) {
                continue;
            }
            let step_name = step.to_string();
            registry.register(step, move |ctx: StepContext| {
                let step_name = step_name.clone();
                async move {
                    tracing::info!(
                        "Indexing step '{}' for {} {} {}",
                        step_name,
                        ctx.subject.subject_type,
                        ctx.subject.chain,
                        ctx.subject.identifier
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    Ok(())
                }
            });
        }
    }

    // 2. Output ports and coordination:
    let bus = Arc::new(TracingBus);
    let lease = Arc::new(InMemoryLease::new());
    let heartbeat = Arc::new(TracingHeartbeat);
    let resolutions = Arc::new(TracingResolutionSink);

    // 3. Worker and stats aggregator:
    let worker = BootstrapWorker::new(
        store.clone(),
        registry.clone(),
        lease,
        heartbeat,
        bus.clone(),
        resolutions,
        WorkerConfig::default(),
    );

    if !worker.start() {
        tracing::warn!("Worker did not start; another instance holds the lease");
    }

    let stats = StatsAggregator::new(store.clone(), bus);

    // 4. Periodic stats publisher (throttle decides the actual emissions):
    let stats_publisher = stats.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            stats_publisher.publish(false);
        }
    });

    // 5. HTTP router:
    let app = Router::new()
        .route(ENDPOINT_ENQUEUE, post(handle_enqueue))
        .route(ENDPOINT_STATUS, get(handle_get_status))
        .route(ENDPOINT_STATUS_BY_KEY, get(handle_get_status_by_key))
        .route(ENDPOINT_STATS, get(handle_get_stats))
        .route(ENDPOINT_STATS_REFRESH, post(handle_stats_refresh))
        .route(ENDPOINT_WORKER_START, post(handle_worker_start))
        .route(ENDPOINT_WORKER_STOP, post(handle_worker_stop))
        .route(ENDPOINT_WORKER_STATUS, get(handle_worker_status))
        .layer(Extension(store))
        .layer(Extension(worker))
        .layer(Extension(stats));

    tracing::info!("HTTP server listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
