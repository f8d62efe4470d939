//! Router assembly and the HTTP serve loop.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::{middleware::from_fn, routing::get, Router};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use user_directory::UserDirectoryModule;

use crate::request_id;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

async fn health() -> &'static str {
    "OK"
}

/// Whole-request timeout; `0` falls back to the default.
pub fn request_timeout(timeout_sec: u64) -> Duration {
    if timeout_sec == 0 {
        DEFAULT_REQUEST_TIMEOUT
    } else {
        Duration::from_secs(timeout_sec)
    }
}

/// Module routes plus `/health`, wrapped in the shared middleware stack.
pub fn build_router(module: &UserDirectoryModule, request_timeout: Duration) -> Router {
    let x_request_id = request_id::header();

    let mut router = Router::new().route("/health", get(health));
    router = module.register_rest(router);

    // Layers run bottom-up: the last one added sees the request first.
    router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
    router = router.layer(from_fn(request_id::push_req_id_to_extensions));
    router = router.layer(request_id::create_trace_layer());
    router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));
    router = router.layer(TimeoutLayer::new(request_timeout));
    router.layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
}

/// Bind and serve until a shutdown signal arrives.
pub async fn serve(router: Router, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow!("Invalid bind address '{}:{}': {}", host, port, e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = wait_for_shutdown().await {
                tracing::warn!("shutdown: signal listener failed ({e}); falling back to ctrl_c()");
                let _ = tokio::signal::ctrl_c().await;
            }
            tracing::info!("HTTP server shutting down gracefully");
        })
        .await
        .map_err(|e| anyhow!(e))
}

async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
