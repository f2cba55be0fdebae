use crate::config::AppConfig;
use crate::render;
use crate::scene::Scene;
use anyhow::Result;
use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub page: String,
    pub figure: Value,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/figure", get(figure_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the rendered map until Ctrl+C or SIGTERM.
pub async fn start_server(config: &AppConfig, scene: &Scene) -> Result<()> {
    let state = Arc::new(AppState {
        page: render::to_html(scene)?,
        figure: render::to_figure(scene)?,
    });

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    tracing::info!("Map available on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn page_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

async fn figure_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.figure.clone())
}

/// Resolves on Ctrl+C or SIGTERM. A handler that fails to install is logged
/// and never fires, so the server keeps running instead of exiting at once.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! { _ = ctrl_c => {}, _ = terminate => {}, }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_signal_waits_for_a_signal() {
        let waited = tokio::time::timeout(Duration::from_millis(100), shutdown_signal()).await;
        assert!(waited.is_err());
    }
}
