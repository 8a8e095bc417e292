//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, panic recovery)
//! - Own the injected task store and telemetry sinks
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ListenerConfig, ServiceConfig};
use crate::http::handlers::{add_todo, delete_todo, get_todo, list_todos, update_todo};
use crate::observability::Telemetry;
use crate::store::TaskStore;

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub telemetry: Telemetry,
}

/// HTTP server for the task list.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server with a fresh store, seeded according to `config.store`.
    pub fn new(config: &ServiceConfig, telemetry: Telemetry) -> Self {
        let store = if config.store.seed_sample {
            TaskStore::with_sample()
        } else {
            TaskStore::new()
        };
        Self::with_store(&config.listener, Arc::new(store), telemetry)
    }

    /// Create a server around an existing store.
    pub fn with_store(listener: &ListenerConfig, store: Arc<TaskStore>, telemetry: Telemetry) -> Self {
        let router = Self::build_router(listener, AppState { store, telemetry });
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(listener: &ListenerConfig, state: AppState) -> Router {
        Router::new()
            .route("/todos", get(list_todos).post(add_todo))
            .route(
                "/todos/{id}",
                get(get_todo).put(update_todo).delete(delete_todo),
            )
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(listener.request_timeout_secs)))
                    .layer(CatchPanicLayer::new()),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
