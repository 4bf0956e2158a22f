//! Startup and serve loop.
//!
//! `bootstrap` loads the artifact before anything is bound; a load failure
//! returns early so no listener or request state is ever created.

use std::future::Future;
use std::sync::Arc;

use modelserve_core::error::{Result, ServeError};
use modelserve_core::model;

use crate::{app_state::AppState, config::ServeConfig, router};

/// Load the model and build request-handling state.
pub fn bootstrap(cfg: ServeConfig) -> Result<AppState> {
    let forest = model::load(&cfg.model.path)?;
    tracing::info!(
        path = %cfg.model.path.display(),
        trees = forest.trees().len(),
        classes = forest.classes().len(),
        "model loaded"
    );
    Ok(AppState::new(cfg, Arc::new(forest)))
}

/// Load, bind, and serve until `shutdown` resolves.
pub async fn run<F>(cfg: ServeConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listen = cfg.server.listen_addr()?;
    let state = bootstrap(cfg)?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ServeError::Internal(format!("bind {listen} failed: {e}")))?;
    let local = listener
        .local_addr()
        .map_err(|e| ServeError::Internal(format!("local_addr failed: {e}")))?;
    tracing::info!(listen = %local, "modelserve serving");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServeError::Internal(format!("server failed: {e}")))?;

    tracing::info!("modelserve stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown requested");
}
