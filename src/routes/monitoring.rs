//! `GET /api/monitoring`: uptime history with summary statistics.
//!
//! Resolved through the service registry as `MonitoringController::index`.
//! Narrow ranges return raw 15-minute rows; ranges of seven days or more
//! (both bounds required) come back as hourly buckets.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::router::{json_error, Controller, Injectable, RouteRequest, ServiceRegistry};
use crate::{AggregationQueryBuilder, StatsSummary, TimeSeriesStore, UptimeRecord};

// ---

#[derive(Debug, Serialize)]
struct MonitoringResponse {
    result: &'static str,
    output: MonitoringOutput,
}

#[derive(Debug, Serialize)]
struct MonitoringOutput {
    data: Vec<UptimeRecord>,
    #[serde(flatten)]
    stats: StatsSummary,
}

pub struct MonitoringController {
    store: Option<Arc<TimeSeriesStore>>,
    queries: Option<Arc<AggregationQueryBuilder>>,
}

impl Injectable for MonitoringController {
    fn inject(services: &ServiceRegistry) -> Self {
        // ---
        MonitoringController {
            store: services.get(),
            queries: services.get(),
        }
    }
}

#[async_trait]
impl Controller for MonitoringController {
    async fn call(&self, action: &str, request: RouteRequest) -> Response {
        // ---
        match action {
            "index" => self.index(request).await,
            other => json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                format!("MonitoringController has no action '{other}'"),
            ),
        }
    }
}

impl MonitoringController {
    // ---
    async fn index(&self, request: RouteRequest) -> Response {
        // ---
        info!("GET /api/monitoring - {:?}", request.params);

        let Some(store) = &self.store else {
            error!("TimeSeriesStore is not registered");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "Uptime history is not available".into(),
            );
        };
        let queries = self.queries.as_deref().copied().unwrap_or_default();

        let ts_min = match bound(&request, "ts_minimum") {
            Ok(v) => v,
            Err(resp) => return resp,
        };
        let ts_max = match bound(&request, "ts_maximum") {
            Ok(v) => v,
            Err(resp) => return resp,
        };

        let query = queries.build(ts_min, ts_max);
        debug!("GET /api/monitoring - {:?}", query);

        let data = match store.query(&query).await {
            Ok(data) => data,
            Err(e) => {
                error!("Failed to query uptime history: {}", e);
                return json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "Failed to query uptime history".into(),
                );
            }
        };

        let stats = StatsSummary::from_records(&data);
        debug!("GET /api/monitoring - Returning {} rows", data.len());

        let body = MonitoringResponse {
            result: "success",
            output: MonitoringOutput { data, stats },
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

/// Optional integer query parameter; a malformed value is a 400.
fn bound(request: &RouteRequest, name: &str) -> Result<Option<i64>, Response> {
    // ---
    request.parse_param::<i64>(name).transpose().map_err(|raw| {
        json_error(
            StatusCode::BAD_REQUEST,
            "Bad Request",
            format!("{name} must be an integer Unix timestamp, got '{raw}'"),
        )
    })
}
