//! relcal-server library - release calendar and LTTD compliance service
//!
//! HTTP service over the shared engines in relcal-common: release-
//! collection store, calendar/dashboard render models, and the LTTD
//! metrics pipeline.

use std::path::PathBuf;

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use relcal_common::config::UpstreamConfig;

pub mod api;
pub mod clients;
pub mod db;
pub mod notify;
pub mod snapshot;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Release collection store
    pub db: SqlitePool,
    /// JSON snapshot cache, rewritten after every successful mutation
    pub snapshot_path: PathBuf,
    /// Upstream metrics/directory/mail endpoints and credentials
    pub upstream: UpstreamConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, snapshot_path: PathBuf, upstream: UpstreamConfig) -> Self {
        Self {
            db,
            snapshot_path,
            upstream,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/api/releases", get(api::list_releases).post(api::create_release))
        .route("/api/releases/warnings", get(api::release_warnings))
        .route("/api/releases/bulk", post(api::bulk_replace))
        .route("/api/releases/export", get(api::export_releases))
        .route("/api/releases/import", post(api::import_releases))
        .route("/api/releases/date/:date", get(api::releases_on_date))
        .route("/api/releases/date/:date/suggestions", get(api::date_suggestions))
        .route(
            "/api/releases/:id",
            get(api::get_release)
                .put(api::update_release)
                .delete(api::delete_release),
        )
        .route("/api/calendar", get(api::calendar_view))
        .route("/api/dashboard", get(api::dashboard_view))
        .route("/api/lttd/records", post(api::lttd_records))
        .route("/api/lttd/fetch-emails", post(api::lttd_fetch_emails))
        .route("/api/lttd/send-emails", post(api::lttd_send_emails))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
