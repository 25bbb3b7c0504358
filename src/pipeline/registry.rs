//! Step Handler Registry
//!
//! A dynamic registry mapping step names (e.g. "scan_transactions") to
//! executable async closures. The indexing services supply the closures at
//! startup; the worker loop only resolves names. This keeps the queue core
//! free of any chain-scanning or scoring logic.

use crate::queue::types::SubjectRef;

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Everything a step implementation gets to see about the task it serves.
#[derive(Debug, Clone)]
pub struct StepContext {
    pub subject: SubjectRef,
}

/// Type alias for a thread-safe, asynchronous step handler function.
pub type StepHandlerFn =
    Arc<dyn Fn(StepContext) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;

/// Registry holding the mapping between step names and their implementation.
pub struct StepRegistry {
    handlers: DashMap<String, StepHandlerFn>,
}

impl StepRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            handlers: DashMap::new(),
        })
    }

    /// Registers a handler under a step name.
    pub fn register<F, Fut>(&self, step_name: &str, handler: F)
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        // Box::pin type-erases the concrete Future so different async fns can
        // share one map.
        let handler_fn: StepHandlerFn = Arc::new(move |ctx: StepContext| {
            Box::pin(handler(ctx)) as Pin<Box<dyn Future<Output = Result<()>> + Send>>
        });

        self.handlers.insert(step_name.to_string(), handler_fn);

        tracing::info!("Registered step handler: {}", step_name);
    }

    /// Looks up a handler by step name and runs it.
    ///
    /// A missing handler is an error: the worker treats it as a failure of
    /// the task, never of the loop.
    pub async fn run_step(&self, step_name: &str, ctx: StepContext) -> Result<()> {
        let Some(handler_fn) = self.handlers.get(step_name).map(|h| h.clone()) else {
            let error = format!("Unknown step handler: {}", step_name);
            tracing::error!("{}", error);
            return Err(anyhow::anyhow!(error));
        };

        tracing::debug!(
            "Running step '{}' for {} {} {}",
            step_name,
            ctx.subject.subject_type,
            ctx.subject.chain,
            ctx.subject.identifier
        );
        handler_fn(ctx).await
    }

    pub fn has_handler(&self, step_name: &str) -> bool {
        self.handlers.contains_key(step_name)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }
}
