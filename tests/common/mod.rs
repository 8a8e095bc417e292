//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use todo_service::config::ListenerConfig;
use todo_service::observability::RecordingTelemetry;
use todo_service::{HttpServer, Shutdown, TaskStore};

/// A running server plus the handles a test needs to inspect it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub recorder: RecordingTelemetry,
    pub store: Arc<TaskStore>,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start a server on an ephemeral port, backed by `store` and a recording
/// telemetry backend.
pub async fn start_server(store: TaskStore) -> TestServer {
    let recorder = RecordingTelemetry::new();
    let store = Arc::new(store);
    let server = HttpServer::with_store(&ListenerConfig::default(), store.clone(), recorder.telemetry());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Wait for the accept loop
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        recorder,
        store,
        shutdown,
    }
}

/// Start a server with the sample task preloaded.
#[allow(dead_code)]
pub async fn start_seeded_server() -> TestServer {
    start_server(TaskStore::with_sample()).await
}
