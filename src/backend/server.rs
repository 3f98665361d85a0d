use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use super::api::{self, AppState};
use super::data::FakeBackend;

/// Configuration for the fake API server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Answer paged listings with a `Link` header.
    pub links: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            links: false,
        }
    }
}

/// Build the full router over `backend`.
pub fn build_router(backend: FakeBackend) -> Router {
    api::api_router()
        .layer(CorsLayer::permissive())
        .merge(api::services_router())
        .with_state(Arc::new(AppState::new(backend)))
}

/// Run the server until Ctrl+C.
pub async fn start_server(config: ServerConfig, mut backend: FakeBackend) -> Result<()> {
    backend.with_link_headers(config.links);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, links = config.links, "Fake platform API listening");
    println!("Fake platform API running at http://{}", local_addr);

    axum::serve(listener, build_router(backend))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

/// Serve `backend` on an ephemeral local port in the background.
pub async fn spawn_local(backend: FakeBackend) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind an ephemeral port")?;
    let addr = listener.local_addr()?;
    let app = build_router(backend);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!(error = %e, "Fake platform API stopped");
        }
    });
    Ok((addr, handle))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_router_serves_health() {
        let response = build_router(FakeBackend::new())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_router_answers_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/workspace")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = build_router(FakeBackend::new()).oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("access-control-allow-origin"));
    }

    #[tokio::test]
    async fn test_spawn_local_binds_ephemeral_port() {
        let (addr, handle) = spawn_local(FakeBackend::new()).await.unwrap();
        assert_ne!(addr.port(), 0);
        let body = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
        handle.abort();
    }

    #[tokio::test]
    async fn test_services_info_reachable_through_cors_layer() {
        let mut backend = FakeBackend::new();
        backend.set_implementation_version("6.2.0");
        let (addr, handle) = spawn_local(backend).await.unwrap();

        let response = reqwest::Client::new()
            .request(reqwest::Method::OPTIONS, format!("http://{}/api/", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let info: serde_json::Value = response.json().await.unwrap();
        assert_eq!(info["implementationVersion"], "6.2.0");
        handle.abort();
    }
}
