//! Random-forest classifier in the JSON artifact format.
//!
//! Rules:
//! - A split sends a row left when `row[feature] <= threshold`.
//! - Child indices are strictly greater than their parent's index, so every
//!   walk terminates.
//! - Leaves hold per-class weights; each tree votes with its normalized leaf
//!   and the forest returns the class with the highest mean probability.

use serde::Deserialize;

use crate::error::{Result, ServeError};
use crate::model::Model;

/// Only artifact format version understood by this build.
pub const ARTIFACT_VERSION: u32 = 1;

/// One tree node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// A single decision tree; node 0 is the root.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { feature, threshold, left, right } => {
                    if *feature >= n_features {
                        return Err(format!("node {idx}: feature {feature} out of range (n_features={n_features})"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {idx}: threshold is not finite"));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= len {
                            return Err(format!("node {idx}: child {child} out of order or out of bounds"));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(format!(
                            "node {idx}: leaf has {} weights, expected {n_classes}",
                            value.len()
                        ));
                    }
                    if value.iter().any(|w| !w.is_finite() || *w < 0.0) {
                        return Err(format!("node {idx}: leaf weights must be finite and non-negative"));
                    }
                    let total: f64 = value.iter().sum();
                    if !total.is_finite() || total <= 0.0 {
                        return Err(format!("node {idx}: leaf weights must sum to a finite positive value"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to the leaf selected by `row`.
    fn leaf_for(&self, row: &[f64]) -> Result<&[f64]> {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(value),
                Some(Node::Split { feature, threshold, left, right }) => {
                    let x = row.get(*feature).copied().ok_or_else(|| {
                        ServeError::Inference(format!("feature {feature} missing from row"))
                    })?;
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(ServeError::Inference(format!("dangling node index {idx}")));
                }
            }
        }
    }
}

/// Immutable forest loaded from the training artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForestModel {
    version: u32,
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<Tree>,
}

impl ForestModel {
    /// Build and validate a forest from parts.
    pub fn new(n_features: usize, classes: Vec<i64>, trees: Vec<Tree>) -> Result<Self> {
        let model = Self {
            version: ARTIFACT_VERSION,
            n_features,
            classes,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    /// Parse and validate a JSON artifact.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let model: ForestModel = serde_json::from_slice(bytes)
            .map_err(|e| ServeError::Load(format!("malformed artifact: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_slice(s.as_bytes())
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    fn validate(&self) -> Result<()> {
        if self.version != ARTIFACT_VERSION {
            return Err(ServeError::Load(format!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                self.version
            )));
        }
        if self.n_features == 0 {
            return Err(ServeError::Load("n_features must be > 0".into()));
        }
        if self.classes.is_empty() {
            return Err(ServeError::Load("classes must not be empty".into()));
        }
        let mut sorted = self.classes.clone();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.len() != self.classes.len() {
            return Err(ServeError::Load("classes must be unique".into()));
        }
        if self.trees.is_empty() {
            return Err(ServeError::Load("trees must not be empty".into()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| ServeError::Load(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }
}

impl Model for ForestModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, row: &[f64]) -> Result<i64> {
        if row.len() != self.n_features {
            return Err(ServeError::Inference(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        if let Some(i) = row.iter().position(|x| !x.is_finite()) {
            return Err(ServeError::Inference(format!("feature {i} is not finite")));
        }

        let mut votes = vec![0.0f64; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_for(row)?;
            let total: f64 = leaf.iter().sum();
            for (acc, w) in votes.iter_mut().zip(leaf) {
                *acc += w / total;
            }
        }

        // First index wins ties.
        let mut best = 0usize;
        for (i, p) in votes.iter().enumerate() {
            if *p > votes[best] {
                best = i;
            }
        }
        self.classes
            .get(best)
            .copied()
            .ok_or_else(|| ServeError::Internal("class index out of range".into()))
    }
}
