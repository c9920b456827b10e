//! Prometheus metrics for observability and monitoring.
//!
//! The engine, cache and stores record through the `metrics` facade; this
//! module installs the Prometheus recorder and serves `GET /metrics` on a
//! dedicated listener.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut server = MetricsServer::new("0.0.0.0:9090".to_string());
//! server.start().await?;
//! // Metrics available at http://localhost:9090/metrics
//! ```

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
    /// Failed to bind HTTP server
    #[error("Failed to bind metrics server: {0}")]
    Bind(#[from] std::io::Error),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: String,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server bound to `addr` once started.
    #[must_use]
    pub const fn new(addr: String) -> Self {
        Self { addr, handle: None }
    }

    /// Install the recorder and start serving `/metrics` in the background.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be installed or the listener
    /// cannot bind.
    pub async fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        let render = handle.clone();
        let app = Router::new().route(
            "/metrics",
            get(move || {
                let render = render.clone();
                async move { render.render() }
            }),
        );
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Metrics server stopped");
            }
        });

        tracing::info!(addr = %self.addr, "Metrics server started");
        self.handle = Some(handle);
        Ok(())
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if server hasn't been started.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!("planner.events.created", "Events created");
    describe_counter!("planner.events.deleted", "Events deleted");
    describe_counter!("planner.rsvps.recorded", "RSVPs recorded, by status");
    describe_counter!(
        "planner.store.errors",
        "Store calls that failed or timed out, by operation"
    );
    describe_histogram!(
        "planner.store.duration_seconds",
        "Time spent in store calls, by operation"
    );
    describe_counter!("planner.cache.hits", "Cached reads served, by cache");
    describe_counter!("planner.cache.misses", "Cached reads loaded from the store, by cache");
    describe_counter!("planner.cache.invalidations", "Cache tag invalidations");
    describe_counter!("planner.postgres.rsvp_upserts", "RSVP upserts committed to PostgreSQL");
}
