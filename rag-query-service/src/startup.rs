//! Application startup and lifecycle management.
//!
//! Exposes a single HTTP route, `POST /query`. The QA pipeline is built on the
//! first request by the `ensure_pipeline` hook, not here.

use crate::config::RagConfig;
use crate::handlers::query::query;
use crate::middleware::pipeline::ensure_pipeline;
use crate::services::{LazyPipeline, PipelineBuilder, VertexPipelineBuilder};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::post,
    Router,
};
use service_core::config::Config;
use service_core::error::AppError;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LazyPipeline>,
}

impl AppState {
    pub fn new(builder: Arc<dyn PipelineBuilder>) -> Self {
        Self {
            pipeline: Arc::new(LazyPipeline::new(builder)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/query", post(query))
        .layer(from_fn_with_state(state.clone(), ensure_pipeline))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application against the Vertex AI backends.
    pub async fn build(config: RagConfig) -> Result<Self, AppError> {
        let server = config.common.clone();
        let builder: Arc<dyn PipelineBuilder> = Arc::new(VertexPipelineBuilder::new(config));
        Self::build_with(server, builder).await
    }

    /// Build the application with a custom pipeline builder.
    pub async fn build_with(
        server: Config,
        builder: Arc<dyn PipelineBuilder>,
    ) -> Result<Self, AppError> {
        // port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("RAG query service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState::new(builder),
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until a shutdown signal arrives.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
