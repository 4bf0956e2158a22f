//! Shared helpers for router-level tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use modelserve_core::error::{Result, ServeError};
use modelserve_core::Model;
use modelserve_server::app_state::AppState;
use modelserve_server::config::ServeConfig;
use modelserve_server::{router, server};

pub fn model_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../model/model.json"))
}

pub fn iris_config() -> ServeConfig {
    ServeConfig::default()
        .with_overrides(Some(model_path()), Some("127.0.0.1:0".into()))
        .unwrap()
}

pub fn iris_router() -> (Router, AppState) {
    let state = server::bootstrap(iris_config()).unwrap();
    (router::build_router(state.clone()), state)
}

pub fn router_with(model: Arc<dyn Model>, cfg: ServeConfig) -> (Router, AppState) {
    let state = AppState::new(cfg, model);
    (router::build_router(state.clone()), state)
}

pub fn predict_req(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

pub async fn send_json(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(router, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn metrics_text(router: &Router) -> String {
    let (status, body) = send(router, get_req("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    String::from_utf8(body.to_vec()).unwrap()
}

/// Model that errors on negative input, panics on 666, and otherwise
/// returns the first feature truncated.
pub struct FlakyModel;

impl Model for FlakyModel {
    fn n_features(&self) -> usize {
        1
    }

    fn predict(&self, row: &[f64]) -> Result<i64> {
        let x = row[0];
        if x == 666.0 {
            panic!("model blew up");
        }
        if x < 0.0 {
            return Err(ServeError::Inference("negative input".into()));
        }
        Ok(x as i64)
    }
}
