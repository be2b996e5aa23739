use crate::app::handlers;
use crate::core::identify::RecognitionEngine;
use crate::domain::ports::RecognitionClient;
use crate::utils::error::Result;
use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// Shared by every request handler. Cloning is cheap; the engine itself is
/// never cloned, so concurrent requests all drive the same client.
pub struct AppState<C: RecognitionClient> {
    pub engine: Arc<RecognitionEngine<C>>,
}

impl<C: RecognitionClient> AppState<C> {
    pub fn new(engine: RecognitionEngine<C>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

impl<C: RecognitionClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

pub fn build_router<C: RecognitionClient + 'static>(
    state: AppState<C>,
    max_upload_bytes: usize,
) -> Router {
    Router::new()
        .route("/", get(handlers::liveness_handler))
        .route("/pokedex", post(handlers::pokedex_handler::<C>))
        .layer(middleware::from_fn(log_requests))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}

pub async fn serve<C: RecognitionClient + 'static>(
    host: &str,
    port: u16,
    state: AppState<C>,
    max_upload_bytes: usize,
) -> Result<()> {
    let app = build_router(state, max_upload_bytes);
    let listener = TcpListener::bind((host, port)).await?;
    tracing::info!("🚀 Pokédex service listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("🛑 Shutdown signal received");
    }
}
