//! Operational HTTP endpoints.
//!
//! - `/health`  : `{"status":"ok"}` once serving (the model is already loaded)
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app_state::AppState;
use crate::obs::REQUESTS_TOTAL;

pub const HEALTH_ENDPOINT: &str = "/health";

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    state
        .metrics()
        .increment_counter(REQUESTS_TOTAL, &[("endpoint", HEALTH_ENDPOINT)]);
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().export_snapshot();

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}
