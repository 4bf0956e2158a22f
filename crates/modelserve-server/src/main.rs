//! modelserve
//!
//! Loads the forest artifact once, then serves `/health`, `/predict` and
//! `/metrics`. A missing or corrupt artifact exits non-zero before binding.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use modelserve_core::error::Result;
use modelserve_server::{config, server};

/// Model prediction service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML config file; built-in defaults apply when omitted.
    #[arg(long, env = "MODELSERVE_CONFIG")]
    config: Option<PathBuf>,

    /// Override `model.path`.
    #[arg(long, env = "MODELSERVE_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Override `server.listen`.
    #[arg(long, env = "MODELSERVE_LISTEN")]
    listen: Option<String>,
}

fn load_config(args: Args) -> Result<config::ServeConfig> {
    let cfg = match &args.config {
        Some(path) => config::load_from_file(path)?,
        None => config::ServeConfig::default(),
    };
    cfg.with_overrides(args.model_path, args.listen)
}

#[tokio::main]
async fn main() -> ExitCode {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = match load_config(Args::parse()) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    match server::run(cfg, server::shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.client_code().as_str(), "modelserve failed");
            ExitCode::FAILURE
        }
    }
}
