//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check the telemetry section is usable for the selected exporters
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{MetricsExporter, ServiceConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("listener.request_timeout_secs must be greater than zero")]
    RequestTimeout,

    #[error("telemetry.service_name must not be empty")]
    ServiceName,

    #[error("telemetry.otlp_endpoint '{0}' must start with http:// or https://")]
    OtlpEndpoint(String),

    #[error("telemetry.export_interval_secs must be greater than zero")]
    ExportInterval,

    #[error("telemetry.prometheus_address '{0}' is not a socket address")]
    PrometheusAddress(String),

    #[error("telemetry.log_filter '{0}' is not a valid filter directive")]
    LogFilter(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let listener = &config.listener;
    let telemetry = &config.telemetry;

    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(listener.bind_address.clone()));
    }
    if listener.request_timeout_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if telemetry.service_name.trim().is_empty() {
        errors.push(ValidationError::ServiceName);
    }
    if telemetry.uses_otlp() {
        let endpoint = &telemetry.otlp_endpoint;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            errors.push(ValidationError::OtlpEndpoint(endpoint.clone()));
        }
        if telemetry.export_interval_secs == 0 {
            errors.push(ValidationError::ExportInterval);
        }
    }
    if telemetry.metrics_exporter == MetricsExporter::Prometheus
        && telemetry.prometheus_socket_addr().is_err()
    {
        errors.push(ValidationError::PrometheusAddress(telemetry.prometheus_address.clone()));
    }
    if EnvFilter::try_new(&telemetry.log_filter).is_err() {
        errors.push(ValidationError::LogFilter(telemetry.log_filter.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
