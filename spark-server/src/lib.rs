use axum::extract::FromRef;
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use spark_shared::clients::db::{DbConn, DbPool};
use spark_shared::errors::{AppError, AppResult};
use spark_shared::types::auth::JwtSecret;

pub mod config;
pub mod models;
pub mod routes;
pub mod schema;
pub mod services;

use config::AppConfig;

pub const SERVICE_NAME: &str = "spark-server";

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<AppConfig>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig, metrics: PrometheusHandle) -> Self {
        Self {
            db,
            config: Arc::new(config),
            metrics,
        }
    }

    pub fn conn(&self) -> AppResult<DbConn> {
        self.db.get().map_err(|e| AppError::internal(e.to_string()))
    }
}

impl FromRef<AppState> for JwtSecret {
    fn from_ref(state: &AppState) -> Self {
        JwtSecret::new(state.config.jwt_secret.clone())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        // Auth
        .route("/auth/register", post(routes::register::register))
        .route("/auth/login", post(routes::login::login))
        .route("/auth/refresh", post(routes::refresh::refresh_session))
        .route("/auth/logout", post(routes::logout::logout))
        // Profiles and discovery
        .route("/users", get(routes::discovery::discover_users))
        .route("/users/me", get(routes::profile::get_profile).put(routes::profile::update_profile))
        .route("/users/:id", get(routes::profile::get_match_profile))
        // Matches
        .route("/users/me/matches", get(routes::matches::list_matches).post(routes::matches::add_match))
        .route("/users/me/matches/:id", delete(routes::matches::unmatch))
        // Messages
        .route("/messages", post(routes::messages::send_message))
        .route("/messages/:match_id", get(routes::messages::list_conversation))
        .layer(middleware::from_fn(spark_shared::middleware::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
