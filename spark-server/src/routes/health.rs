use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;

use spark_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::{AppState, SERVICE_NAME};

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.conn() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => HealthCheck::healthy("database"),
            Err(e) => HealthCheck::unhealthy("database", e.to_string()),
        },
        Err(e) => HealthCheck::unhealthy("database", e.to_string()),
    };

    let response = HealthResponse::healthy(SERVICE_NAME, env!("CARGO_PKG_VERSION"))
        .with_checks(vec![database]);

    let status = match response.status {
        HealthStatus::Unhealthy => {
            tracing::warn!("health check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::OK,
    };

    (status, Json(response))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
