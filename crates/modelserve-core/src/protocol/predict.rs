use serde::{Deserialize, Serialize};

use crate::error::{Result, ServeError};

/// Generic failure message returned to callers. Causes are only logged.
pub const GENERIC_ERROR: &str = "prediction failed";

/// The `value` field of a prediction payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeatureInput {
    /// A single number, broadcast into every feature column.
    Scalar(f64),
    /// A full feature row.
    Row(Vec<f64>),
    /// A numeric string such as `"5.1"`.
    Text(String),
}

impl FeatureInput {
    /// Parse a query-string value.
    pub fn from_query(raw: &str) -> Self {
        FeatureInput::Text(raw.to_string())
    }

    /// Build the single feature row handed to the model.
    ///
    /// Width checking is left to the model; only shape-independent problems
    /// are rejected here.
    pub fn into_row(self, n_features: usize) -> Result<Vec<f64>> {
        match self {
            FeatureInput::Scalar(v) => broadcast(v, n_features),
            FeatureInput::Text(s) => {
                let v = s
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| ServeError::BadRequest(format!("value is not numeric: {s:?}")))?;
                broadcast(v, n_features)
            }
            FeatureInput::Row(row) => {
                if row.is_empty() {
                    return Err(ServeError::BadRequest("value must not be an empty list".into()));
                }
                if row.iter().any(|x| !x.is_finite()) {
                    return Err(ServeError::BadRequest("value contains a non-finite number".into()));
                }
                Ok(row)
            }
        }
    }
}

fn broadcast(v: f64, n_features: usize) -> Result<Vec<f64>> {
    if !v.is_finite() {
        return Err(ServeError::BadRequest("value must be finite".into()));
    }
    Ok(vec![v; n_features])
}

/// Validated prediction payload. Keys other than `value` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub value: FeatureInput,
}

impl PredictRequest {
    /// Decode a JSON body. The body must be an object carrying `value`.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ServeError::BadRequest(format!("invalid json: {e}")))?;
        if !raw.is_object() {
            return Err(ServeError::BadRequest("payload must be a json object".into()));
        }
        serde_json::from_value(raw)
            .map_err(|e| ServeError::BadRequest(format!("invalid payload: {e}")))
    }
}

/// Success body for `/predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
}

/// Failure body for `/predict`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub code: &'static str,
}

impl ErrorBody {
    pub fn from_error(err: &ServeError) -> Self {
        Self {
            error: GENERIC_ERROR,
            code: err.client_code().as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn scalar_broadcasts() {
        let req = PredictRequest::from_slice(br#"{"value": 5.1}"#).unwrap();
        assert_eq!(req.value.into_row(4).unwrap(), vec![5.1; 4]);
    }

    #[test]
    fn integer_and_string_are_numeric() {
        let req = PredictRequest::from_slice(br#"{"value": 3}"#).unwrap();
        assert_eq!(req.value.into_row(2).unwrap(), vec![3.0, 3.0]);
        let req = PredictRequest::from_slice(br#"{"value": " 2.5 "}"#).unwrap();
        assert_eq!(req.value.into_row(1).unwrap(), vec![2.5]);
    }

    #[test]
    fn row_is_kept_verbatim() {
        let req = PredictRequest::from_slice(br#"{"value": [1, 2, 3], "extra": true}"#).unwrap();
        assert_eq!(req.value.into_row(4).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rejects_bad_payloads() {
        for body in [
            &br#"{}"#[..],
            br#"{"value": null}"#,
            br#"{"value": "abc"}"#,
            br#"{"value": "NaN"}"#,
            br#"[5.1]"#,
            br#"5.1"#,
            br#"not json"#,
            b"",
        ] {
            let res = PredictRequest::from_slice(body).and_then(|r| r.value.into_row(4));
            let err = res.unwrap_err();
            assert!(err.is_client_fault(), "body={:?}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn rejects_empty_row() {
        let req = PredictRequest::from_slice(br#"{"value": []}"#).unwrap();
        assert!(req.value.into_row(4).is_err());
    }

    #[test]
    fn error_body_is_generic() {
        let body = ErrorBody::from_error(&ServeError::Inference("stack trace here".into()));
        let s = serde_json::to_string(&body).unwrap();
        assert_eq!(s, r#"{"error":"prediction failed","code":"INFERENCE_FAILED"}"#);
    }
}
