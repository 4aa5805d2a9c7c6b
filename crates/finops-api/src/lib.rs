//! finops-api: exposition endpoint for the FinOps exporter.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/metrics` | Prometheus text exposition of the gauge registry |
//! | GET | `/healthz` | Liveness probe |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use finops_metrics::GaugeRegistry;

/// Shared state for exposition handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: GaugeRegistry,
}

/// Build the exposition router.
pub fn build_router(registry: GaugeRegistry) -> Router {
    Router::new()
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/healthz", get(handlers::healthz))
        .with_state(ApiState { registry })
}
