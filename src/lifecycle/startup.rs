//! Startup orchestration.
//!
//! # Responsibilities
//! - Install telemetry pipelines and the logging subscriber
//! - Bind the listener and serve until a termination signal
//! - Flush telemetry after the server has drained
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when telemetry is ready)

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{MetricsExporter, ServiceConfig, TelemetryConfig};
use crate::http::HttpServer;
use crate::lifecycle::{shutdown::Shutdown, signals::spawn_signal_handler};
use crate::observability::logging::init_logging;
use crate::observability::{TelemetryError, TelemetryPipeline};

/// Fatal errors while bringing the service up or down.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Run the service with a validated configuration until shutdown.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    let pipeline = TelemetryPipeline::install(&config.telemetry)?;
    init_logging(&config.telemetry.log_filter, pipeline.logger_provider())?;

    announce_telemetry(&config.telemetry);

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signals = spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(&config, pipeline.telemetry());
    let served = server.run(listener, shutdown.subscribe()).await;
    signals.abort();

    // Flush whatever the batch processors still hold, even after a server error.
    if let Err(e) = pipeline.shutdown() {
        tracing::warn!(error = %e, "Telemetry shutdown incomplete");
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Startup summary of the telemetry setup. Runs once the subscriber exists.
fn announce_telemetry(telemetry: &TelemetryConfig) {
    tracing::info!(
        service = %telemetry.service_name,
        version = %telemetry.service_version,
        otlp_endpoint = %telemetry.otlp_endpoint,
        metrics_exporter = ?telemetry.metrics_exporter,
        "Telemetry initialized"
    );
    if telemetry.metrics_exporter == MetricsExporter::Prometheus {
        tracing::info!(
            address = %telemetry.prometheus_address,
            "Prometheus metrics exporter started"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn announce_with(config: &TelemetryConfig) -> String {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || announce_telemetry(config));
        captured.contents()
    }

    #[test]
    fn test_prometheus_listener_is_announced() {
        let config = TelemetryConfig {
            metrics_exporter: MetricsExporter::Prometheus,
            prometheus_address: "127.0.0.1:9464".to_string(),
            ..TelemetryConfig::default()
        };

        let output = announce_with(&config);
        assert!(output.contains("Telemetry initialized"));
        assert!(output.contains("Prometheus metrics exporter started"));
        assert!(output.contains("127.0.0.1:9464"));
    }

    #[test]
    fn test_otlp_metrics_skip_prometheus_line() {
        let output = announce_with(&TelemetryConfig::default());
        assert!(output.contains("Telemetry initialized"));
        assert!(!output.contains("Prometheus"));
    }
}
