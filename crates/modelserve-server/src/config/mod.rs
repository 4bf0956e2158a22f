//! Server config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use modelserve_core::error::{Result, ServeError};

pub use schema::{MetricsSection, ModelSection, PredictSection, ServeConfig, ServerSection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ServeConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| ServeError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServeConfig> {
    let cfg: ServeConfig = serde_yaml::from_str(s)
        .map_err(|e| ServeError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
