//! Model capability and the forest artifact.
//!
//! The serving runtime only needs one capability from a model: map a single
//! feature row to an integer label. `Model` is that seam; `ForestModel` is the
//! artifact produced by the offline training job.

pub mod forest;
pub mod loader;

use crate::error::Result;

pub use forest::{ForestModel, Node, Tree};
pub use loader::load;

/// Read-only inference capability shared across request tasks.
///
/// Implementations must be immutable after construction; the server holds one
/// instance behind an `Arc` for the whole process lifetime.
pub trait Model: Send + Sync {
    /// Width of the feature row accepted by `predict`.
    fn n_features(&self) -> usize;

    /// Predict the label for a single row.
    fn predict(&self, row: &[f64]) -> Result<i64>;
}
