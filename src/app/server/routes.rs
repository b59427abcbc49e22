//! Route table and handlers

use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::config::AssetConfig;
use super::sponsors::SponsorTier;
use super::AppState;
use crate::errors::ServerError;

/// Build the full router
///
/// API routes are matched first; `/sponsors/images/*` is served from the
/// sponsor directory and every other path falls back to the frontend.
pub fn router(state: AppState, assets: &AssetConfig, request_timeout: Duration) -> Router {
    Router::new()
        .route("/schedule", get(schedule))
        .route("/healthz", get(healthz))
        .route("/sponsors/diamond", get(diamond_sponsors))
        .route("/sponsors/platinum", get(platinum_sponsors))
        .route("/sponsors/gold", get(gold_sponsors))
        .route("/sponsors/all", get(all_sponsors))
        .nest_service("/sponsors/images", ServeDir::new(&assets.sponsors_dir))
        .fallback_service(ServeDir::new(&assets.frontend_dir))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// GET /schedule
async fn schedule(State(state): State<AppState>) -> Result<Response, ServerError> {
    let body = serde_json::to_vec(&state.cache.snapshot())?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

/// Body of `GET /healthz`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub session_count: usize,
    pub last_refresh_time: Option<DateTime<Utc>>,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthStatus> {
    let snapshot = state.cache.snapshot();
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_count: snapshot.session_count,
        last_refresh_time: snapshot.last_refresh_time,
    })
}

async fn diamond_sponsors(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.sponsors.tier(SponsorTier::Diamond).to_vec())
}

async fn platinum_sponsors(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.sponsors.tier(SponsorTier::Platinum).to_vec())
}

async fn gold_sponsors(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.sponsors.tier(SponsorTier::Gold).to_vec())
}

async fn all_sponsors(State(state): State<AppState>) -> Result<Json<Vec<String>>, ServerError> {
    Ok(Json(state.sponsors.list_images().await?))
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
