//! Axum handlers for the exposition endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::error;

use crate::ApiState;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// `GET /metrics`: every live series in the Prometheus text format.
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    match state.registry.render().await {
        Ok(body) => (StatusCode::OK, [("content-type", TEXT_FORMAT)], body),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                e.to_string(),
            )
        }
    }
}

/// `GET /healthz`
pub async fn healthz() -> &'static str {
    "ok"
}
