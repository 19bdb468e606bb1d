//! HTTP surface: axum router over the batch processor, store and
//! broadcaster.
//!
//! - `POST   /api/generate-essays`: submit a batch, answered when it finishes
//! - `GET    /api/essays?search=`: list stored items, newest first
//! - `DELETE /api/essays/{id}`: delete one item
//! - `GET    /api/progress`: live progress stream (SSE)
//! - `GET    /api/health`: liveness
//!
//! Anything else falls through to the static client directory, when one
//! is configured.

pub mod error;
pub mod handlers;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::engine::BatchProcessor;
use crate::error::{Error, Result};
use crate::llm::Completer;
use crate::progress::Broadcaster;
use crate::storage::ItemStore;

pub use error::ApiError;

/// Shared handler state.
pub struct AppState<C> {
    pub processor: Arc<BatchProcessor<C>>,
    pub store: Arc<ItemStore>,
    pub broadcaster: Broadcaster,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            store: Arc::clone(&self.store),
            broadcaster: self.broadcaster.clone(),
        }
    }
}

impl<C: Completer> AppState<C> {
    pub fn new(processor: Arc<BatchProcessor<C>>, broadcaster: Broadcaster) -> Self {
        Self {
            store: Arc::clone(processor.store()),
            processor,
            broadcaster,
        }
    }
}

/// Build the application router.
pub fn router<C: Completer + 'static>(state: AppState<C>, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/generate-essays", post(handlers::generate_essays::<C>))
        .route("/api/essays", get(handlers::list_essays::<C>))
        .route("/api/essays/{id}", delete(handlers::delete_essay::<C>))
        .route("/api/progress", get(handlers::progress::<C>))
        .route("/api/health", get(handlers::health::<C>))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };
    app.layer(CorsLayer::permissive())
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "essaygen listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Other(format!("server error: {e}")))
}
