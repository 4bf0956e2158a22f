use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use modelserve_core::error::{Result, ServeError};

/// Prometheus client default buckets, in seconds.
pub const DEFAULT_LATENCY_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub model: ModelSection,

    #[serde(default)]
    pub predict: PredictSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            model: ModelSection::default(),
            predict: PredictSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ServeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ServeError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.server.validate()?;
        self.model.validate()?;
        self.metrics.validate()?;
        Ok(())
    }

    /// Apply command-line overrides, then re-validate.
    pub fn with_overrides(mut self, model_path: Option<PathBuf>, listen: Option<String>) -> Result<Self> {
        if let Some(p) = model_path {
            self.model.path = p;
        }
        if let Some(l) = listen {
            self.server.listen = l;
        }
        self.validate()?;
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            ServeError::Config(format!(
                "server.listen must be a valid SocketAddr (got {:?})",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

impl ModelSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ServeError::Config("model.path must not be empty".into()));
        }
        Ok(())
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model/model.json")
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictSection {
    /// Answer payload validation failures with 422 instead of 500.
    #[serde(default)]
    pub client_errors_as_4xx: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    /// Upper bounds (seconds) of the request latency histogram.
    #[serde(default = "default_latency_buckets")]
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            latency_buckets: default_latency_buckets(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if self.latency_buckets.is_empty() {
            return Err(ServeError::Config("metrics.latency_buckets must not be empty".into()));
        }
        if self.latency_buckets.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            return Err(ServeError::Config(
                "metrics.latency_buckets must be finite and positive".into(),
            ));
        }
        if self.latency_buckets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ServeError::Config(
                "metrics.latency_buckets must be strictly increasing".into(),
            ));
        }
        Ok(())
    }
}

fn default_latency_buckets() -> Vec<f64> {
    DEFAULT_LATENCY_BUCKETS.to_vec()
}
