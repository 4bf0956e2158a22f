//! Shared error type across modelserve crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Model artifact missing or corrupt.
    LoadFailed,
    /// Invalid input / malformed payload.
    BadRequest,
    /// Model raised during prediction.
    InferenceFailed,
    /// Invalid configuration.
    BadConfig,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::LoadFailed => "LOAD_FAILED",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InferenceFailed => "INFERENCE_FAILED",
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ServeError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Startup-fatal: the artifact could not be read or is malformed.
    #[error("artifact load failed: {0}")]
    Load(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ServeError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ServeError::Load(_) => ClientCode::LoadFailed,
            ServeError::BadRequest(_) => ClientCode::BadRequest,
            ServeError::Inference(_) => ClientCode::InferenceFailed,
            ServeError::Config(_) => ClientCode::BadConfig,
            ServeError::Internal(_) => ClientCode::Internal,
        }
    }

    /// True when the caller, not the service, caused the failure.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, ServeError::BadRequest(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ServeError::Load("x".into()).client_code().as_str(), "LOAD_FAILED");
        assert_eq!(ServeError::BadRequest("x".into()).client_code().as_str(), "BAD_REQUEST");
        assert_eq!(ServeError::Inference("x".into()).client_code().as_str(), "INFERENCE_FAILED");
        assert!(ServeError::BadRequest("x".into()).is_client_fault());
        assert!(!ServeError::Inference("x".into()).is_client_fault());
    }
}
