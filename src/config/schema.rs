//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file. Every
//! section is optional; missing fields take the defaults below.

use std::net::{AddrParseError, SocketAddr};

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Task store settings.
    pub store: StoreConfig,

    /// Telemetry export settings.
    pub telemetry: TelemetryConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:43524").
    pub bind_address: String,

    /// Per-request timeout enforced by the HTTP layer.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:43524".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Task store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Start with the sample "Learn OpenTelemetry" task.
    pub seed_sample: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { seed_sample: true }
    }
}

/// Where operation metrics go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsExporter {
    /// OTLP push to the collector.
    Otlp,
    /// Prometheus scrape endpoint.
    Prometheus,
    /// Discard metrics.
    None,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `service.name` resource attribute.
    pub service_name: String,

    /// `service.version` resource attribute.
    pub service_version: String,

    /// `service.namespace` resource attribute.
    pub service_namespace: String,

    /// Collector base URL; `/v1/{traces,metrics,logs}` is appended per signal.
    pub otlp_endpoint: String,

    /// Batch / periodic export interval for all pipelines.
    pub export_interval_secs: u64,

    /// Export spans over OTLP.
    pub traces_enabled: bool,

    /// Export logs over OTLP.
    pub logs_enabled: bool,

    /// Metric destination.
    pub metrics_exporter: MetricsExporter,

    /// Scrape listener when `metrics_exporter = "prometheus"`.
    pub prometheus_address: String,

    /// `tracing` filter directive (overridden by `RUST_LOG` on the console).
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "rust-todo-service".to_string(),
            service_version: "1.0.0".to_string(),
            service_namespace: "rust".to_string(),
            otlp_endpoint: "http://localhost:4318".to_string(),
            export_interval_secs: 5,
            traces_enabled: true,
            logs_enabled: true,
            metrics_exporter: MetricsExporter::Otlp,
            prometheus_address: "0.0.0.0:9464".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Whether any signal is pushed to the OTLP collector.
    pub fn uses_otlp(&self) -> bool {
        self.traces_enabled || self.logs_enabled || self.metrics_exporter == MetricsExporter::Otlp
    }

    /// Parsed Prometheus listener address.
    pub fn prometheus_socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.prometheus_address.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:43524");
        assert!(config.store.seed_sample);
        assert_eq!(config.telemetry.service_name, "rust-todo-service");
        assert_eq!(config.telemetry.metrics_exporter, MetricsExporter::Otlp);
        assert!(config.telemetry.uses_otlp());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [telemetry]
            metrics_exporter = "prometheus"
            traces_enabled = false
            logs_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.request_timeout_secs, 30);
        assert_eq!(config.telemetry.metrics_exporter, MetricsExporter::Prometheus);
        assert_eq!(config.telemetry.service_version, "1.0.0");
        assert!(!config.telemetry.uses_otlp());
        assert_eq!(
            config.telemetry.prometheus_socket_addr().unwrap(),
            "0.0.0.0:9464".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_bad_prometheus_address_is_an_error() {
        let config = TelemetryConfig {
            prometheus_address: "localhost".to_string(),
            ..TelemetryConfig::default()
        };
        assert!(config.prometheus_socket_addr().is_err());
    }

    #[test]
    fn test_unknown_exporter_rejected() {
        let result: Result<ServiceConfig, _> = toml::from_str(
            r#"
            [telemetry]
            metrics_exporter = "statsd"
            "#,
        );
        assert!(result.is_err());
    }
}
