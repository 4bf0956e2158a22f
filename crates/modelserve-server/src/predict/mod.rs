//! `/predict` handler.
//!
//! Per request: RECEIVED -> VALIDATED -> PREDICTED -> RESPONDED, or FAILED
//! from validation or inference. The request counter is bumped on entry and
//! the latency timer covers the whole handler, success or not. Failures log
//! their cause and answer with a generic body.

use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;

use modelserve_core::error::{Result, ServeError};
use modelserve_core::protocol::{ErrorBody, FeatureInput, PredictRequest, PredictResponse};

use crate::app_state::AppState;
use crate::obs::{REQUESTS_TOTAL, REQUEST_ERRORS_TOTAL, REQUEST_LATENCY_SECONDS};

pub const PREDICT_ENDPOINT: &str = "/predict";

/// Query-string fallback used when the body is empty (`/predict?value=5.1`).
#[derive(Debug, Deserialize)]
pub struct PredictQuery {
    pub value: Option<String>,
}

/// Where a failed request stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Validate,
    Predict,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Predict => "predict",
        }
    }
}

pub async fn predict(
    State(app): State<AppState>,
    query: Option<Query<PredictQuery>>,
    body: Bytes,
) -> Response {
    let _timer = app.metrics().start_timer(REQUEST_LATENCY_SECONDS, PREDICT_ENDPOINT);
    app.metrics()
        .increment_counter(REQUESTS_TOTAL, &[("endpoint", PREDICT_ENDPOINT)]);

    let row = match extract_row(&app, query.map(|Query(q)| q), &body) {
        Ok(row) => row,
        Err(e) => return failure(&app, Stage::Validate, e),
    };

    match infer(&app, &row) {
        Ok(prediction) => (StatusCode::OK, Json(PredictResponse { prediction })).into_response(),
        Err(e) => failure(&app, Stage::Predict, e),
    }
}

fn extract_row(app: &AppState, query: Option<PredictQuery>, body: &[u8]) -> Result<Vec<f64>> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        match query.and_then(|q| q.value) {
            Some(v) => FeatureInput::from_query(&v),
            None => return Err(ServeError::BadRequest("missing value".into())),
        }
    } else {
        PredictRequest::from_slice(body)?.value
    };
    input.into_row(app.model().n_features())
}

/// Run the model, turning a panicking implementation into an inference error
/// so it stays contained to this request.
fn infer(app: &AppState, row: &[f64]) -> Result<i64> {
    match catch_unwind(AssertUnwindSafe(|| app.model().predict(row))) {
        Ok(res) => res,
        Err(_) => Err(ServeError::Inference("model panicked".into())),
    }
}

fn failure(app: &AppState, stage: Stage, err: ServeError) -> Response {
    let code = err.client_code().as_str();
    tracing::warn!(stage = stage.as_str(), code, error = %err, "predict failed");
    app.metrics().increment_counter(
        REQUEST_ERRORS_TOTAL,
        &[("endpoint", PREDICT_ENDPOINT), ("code", code)],
    );

    let status = if err.is_client_fault() && app.cfg().predict.client_errors_as_4xx {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorBody::from_error(&err))).into_response()
}
