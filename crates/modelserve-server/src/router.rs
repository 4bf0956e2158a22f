//! Axum router wiring.
//!
//! Routes: `GET /health`, `POST /predict`, `GET /metrics`. No request size
//! limit is applied.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, predict};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(ops::HEALTH_ENDPOINT, get(ops::health))
        .route(predict::PREDICT_ENDPOINT, post(predict::predict))
        .route("/metrics", get(ops::metrics))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}
