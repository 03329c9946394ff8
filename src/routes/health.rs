// src/routes/health.rs
//! API health check endpoint for the uptime monitor.
//!
//! `GET /health` is used by container orchestrators and CI pipelines to
//! verify that the service can still reach its database. Unlike a bare
//! liveness check it runs the store's probe, which includes the single
//! reconnect attempt, so a 200 here means queries will work.
//!
//! Exports to the gateway (`mod.rs`): a [`Handler`] bound to the store.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::router::Handler;
use crate::TimeSeriesStore;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

/// Handle `GET /health`.
///
/// `200 {"status": "healthy"}` when the probe succeeds, `503` with
/// `"unhealthy"` otherwise.
async fn health(store: Arc<TimeSeriesStore>) -> Response {
    // ---
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                timestamp,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    timestamp,
                }),
            )
                .into_response()
        }
    }
}

/// Create the `/health` handler bound to `store`.
pub fn handler(store: Arc<TimeSeriesStore>) -> Handler {
    Handler::callable(move |_req| health(store.clone()))
}
