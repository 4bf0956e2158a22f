//! Shared application state for the serving runtime.
//!
//! Built only after the artifact has loaded, so every handler can rely on a
//! model being present. The model is read-only; the metrics registry is the
//! only shared mutable piece and synchronizes internally.

use std::sync::Arc;

use modelserve_core::Model;

use crate::config::ServeConfig;
use crate::obs::{self, MetricsRegistry};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    model: Arc<dyn Model>,
    metrics: Arc<MetricsRegistry>,
}

struct AppStateInner {
    cfg: ServeConfig,
}

impl AppState {
    /// Build state with a fresh metrics registry sized from config.
    pub fn new(cfg: ServeConfig, model: Arc<dyn Model>) -> Self {
        let metrics = Arc::new(MetricsRegistry::new(&cfg.metrics.latency_buckets));
        Self::with_metrics(cfg, model, metrics)
    }

    /// Build state around an existing registry.
    pub fn with_metrics(cfg: ServeConfig, model: Arc<dyn Model>, metrics: Arc<MetricsRegistry>) -> Self {
        obs::describe_service_metrics(&metrics);
        Self {
            inner: Arc::new(AppStateInner { cfg }),
            model,
            metrics,
        }
    }

    pub fn cfg(&self) -> &ServeConfig {
        &self.inner.cfg
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }
}
