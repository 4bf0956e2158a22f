//! `/predict` wire types.
//!
//! Payloads are validated into `PredictRequest` before the model is touched;
//! anything that does not fit is reported as `ServeError::BadRequest`.

pub mod predict;

pub use predict::{ErrorBody, FeatureInput, PredictRequest, PredictResponse};
