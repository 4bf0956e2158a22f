//! Artifact loader.
//!
//! A missing or corrupt artifact is a deployment error: `load` reports it as
//! `ServeError::Load` and the caller is expected to abort startup. There is no
//! retry.

use std::fs;
use std::path::Path;

use crate::error::{Result, ServeError};
use crate::model::ForestModel;

/// Read and validate the forest artifact at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<ForestModel> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|e| ServeError::Load(format!("read {} failed: {e}", path.display())))?;

    let model = ForestModel::from_slice(&bytes).map_err(|e| match e {
        ServeError::Load(msg) => ServeError::Load(format!("{}: {msg}", path.display())),
        other => other,
    })?;

    tracing::debug!(
        path = %path.display(),
        trees = model.trees().len(),
        classes = model.classes().len(),
        "artifact parsed"
    );
    Ok(model)
}
