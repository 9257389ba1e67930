mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::digest::PipelineDigest;

#[derive(Clone)]
pub struct AppState {
    pub digest: Arc<PipelineDigest>,
}

impl AppState {
    pub fn new(digest: PipelineDigest) -> Self {
        Self {
            digest: Arc::new(digest),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/pipeline/status", get(routes::pipeline_status))
        .route(
            "/pipeline/log/{build_number}/{node_id}",
            post(routes::stage_log),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the dashboard API until Ctrl-C.
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let bind_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{bind}': expected host:port"))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve listen address")?;
    info!("Listening on http://{local_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("server exited unexpectedly")?;
    Ok(())
}
