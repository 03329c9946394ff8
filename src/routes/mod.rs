//! Route gateway.
//!
//! Builds the application's route table and wraps it in an axum service.
//! axum only owns the transport here: every request lands in one fallback
//! handler that answers CORS preflights and forwards the rest to
//! [`Router::dispatch`].

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::router::{Handler, Router, ServiceRegistry};
use crate::{AggregationQueryBuilder, TimeSeriesStore};

mod health;
mod monitoring;

pub use monitoring::MonitoringController;

// ---

/// Register every API route against `store` and `queries`.
pub fn route_table(
    store: Arc<TimeSeriesStore>,
    queries: AggregationQueryBuilder,
) -> Result<Router, regex::Error> {
    // ---
    let mut services = ServiceRegistry::new();
    services
        .register(store.clone())
        .register(Arc::new(queries));

    let mut table = Router::new(services);
    table
        .get("/", Handler::callable(|_req| index()))?
        .get("/health", health::handler(store))?
        .get(
            "/api/monitoring",
            Handler::action::<MonitoringController>("index"),
        )?;

    Ok(table)
}

/// Wrap the route table in an axum service with CORS applied.
pub fn router(table: Arc<Router>) -> axum::Router {
    // ---
    axum::Router::new()
        .fallback(dispatch)
        .with_state(table)
        .layer(middleware::map_response(with_cors))
}

async fn index() -> Response {
    // ---
    Json(json!({
        "message": "Uptime Monitoring API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response()
}

async fn dispatch(State(table): State<Arc<Router>>, method: Method, uri: Uri) -> Response {
    // ---
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let raw = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    table.dispatch(&method, raw).await
}

async fn with_cors(mut response: Response) -> Response {
    // ---
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}
