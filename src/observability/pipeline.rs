//! Telemetry pipeline setup and teardown.
//!
//! Builds the OpenTelemetry providers described by [`TelemetryConfig`], wires
//! them into the sinks the operation wrapper uses, and flushes them on
//! shutdown. Export itself (batching, retries, transport errors) stays inside
//! the SDK's background processors and never reaches the request path.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::metrics::MeterProvider as _;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{LogExporter, MetricExporter, Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::logs::{BatchLogProcessor, SdkLoggerProvider};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{
    SERVICE_INSTANCE_ID, SERVICE_NAME, SERVICE_NAMESPACE, SERVICE_VERSION,
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{MetricsExporter, TelemetryConfig};
use crate::observability::logging::TracingLogSink;
use crate::observability::metrics::{init_prometheus, OtelMetricSink, PrometheusMetricSink};
use crate::observability::sink::{LogSink, MetricSink, Noop, Telemetry, TraceSink};
use crate::observability::tracing::OtelTraceSink;

/// Instrumentation scope name for tracers and meters.
pub const INSTRUMENTATION_SCOPE: &str = "todo-service";

/// Telemetry setup errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Exporter could not be built.
    #[error("Exporter error: {0}")]
    Exporter(String),

    /// Global subscriber could not be installed.
    #[error("Subscriber error: {0}")]
    Subscriber(String),

    /// Provider shutdown failed.
    #[error("Shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Running OpenTelemetry providers.
pub struct TelemetryPipeline {
    telemetry: Telemetry,
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryPipeline {
    /// Build every enabled pipeline.
    ///
    /// Selecting the Prometheus exporter installs a global recorder and an
    /// HTTP listener, so this must run inside a Tokio runtime.
    pub fn install(config: &TelemetryConfig) -> TelemetryResult<Self> {
        let resource = build_resource(config);
        let interval = Duration::from_secs(config.export_interval_secs);

        let tracer_provider = if config.traces_enabled {
            Some(tracer_provider(config, resource.clone(), interval)?)
        } else {
            None
        };

        let meter_provider = match config.metrics_exporter {
            MetricsExporter::Otlp => Some(meter_provider(config, resource.clone(), interval)?),
            MetricsExporter::Prometheus | MetricsExporter::None => None,
        };

        let logger_provider = if config.logs_enabled {
            Some(logger_provider(config, resource, interval)?)
        } else {
            None
        };

        let traces: Arc<dyn TraceSink> = match &tracer_provider {
            Some(provider) => Arc::new(OtelTraceSink::new(provider.tracer(INSTRUMENTATION_SCOPE))),
            None => Arc::new(Noop),
        };

        let metrics: Arc<dyn MetricSink> = match config.metrics_exporter {
            MetricsExporter::Otlp => match &meter_provider {
                Some(provider) => Arc::new(OtelMetricSink::new(&provider.meter(INSTRUMENTATION_SCOPE))),
                None => Arc::new(Noop),
            },
            MetricsExporter::Prometheus => {
                let addr = config.prometheus_socket_addr().map_err(|e| {
                    TelemetryError::Exporter(format!(
                        "invalid prometheus address {:?}: {e}",
                        config.prometheus_address
                    ))
                })?;
                init_prometheus(addr).map_err(|e| TelemetryError::Exporter(e.to_string()))?;
                Arc::new(PrometheusMetricSink)
            }
            MetricsExporter::None => Arc::new(Noop),
        };

        // Console logging stays on even when OTLP log export is off.
        let logs: Arc<dyn LogSink> = Arc::new(TracingLogSink);

        Ok(Self {
            telemetry: Telemetry::new(traces, metrics, logs),
            tracer_provider,
            meter_provider,
            logger_provider,
        })
    }

    /// Sinks for the operation wrapper.
    pub fn telemetry(&self) -> Telemetry {
        self.telemetry.clone()
    }

    /// Provider for the `tracing` → OpenTelemetry log bridge, if log export is on.
    pub fn logger_provider(&self) -> Option<&SdkLoggerProvider> {
        self.logger_provider.as_ref()
    }

    /// Flush and stop every provider. All providers are attempted even if one fails.
    pub fn shutdown(self) -> TelemetryResult<()> {
        let mut failures = Vec::new();

        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                failures.push(format!("traces: {e}"));
            }
        }
        if let Some(provider) = self.meter_provider {
            if let Err(e) = provider.shutdown() {
                failures.push(format!("metrics: {e}"));
            }
        }
        if let Some(provider) = self.logger_provider {
            if let Err(e) = provider.shutdown() {
                failures.push(format!("logs: {e}"));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(TelemetryError::Shutdown(failures.join(", ")))
        }
    }
}

/// Resource attributes shared by all three signals.
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes([
            KeyValue::new(SERVICE_VERSION, config.service_version.clone()),
            KeyValue::new(SERVICE_NAMESPACE, config.service_namespace.clone()),
            KeyValue::new(SERVICE_INSTANCE_ID, Uuid::new_v4().to_string()),
        ])
        .build()
}

fn signal_endpoint(config: &TelemetryConfig, signal: &str) -> String {
    format!("{}/v1/{}", config.otlp_endpoint.trim_end_matches('/'), signal)
}

fn tracer_provider(
    config: &TelemetryConfig,
    resource: Resource,
    interval: Duration,
) -> TelemetryResult<SdkTracerProvider> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(signal_endpoint(config, "traces"))
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let processor = BatchSpanProcessor::builder(exporter)
        .with_batch_config(BatchConfigBuilder::default().with_scheduled_delay(interval).build())
        .build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_span_processor(processor)
        .build())
}

fn meter_provider(
    config: &TelemetryConfig,
    resource: Resource,
    interval: Duration,
) -> TelemetryResult<SdkMeterProvider> {
    let exporter = MetricExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(signal_endpoint(config, "metrics"))
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let reader = PeriodicReader::builder(exporter).with_interval(interval).build();

    Ok(SdkMeterProvider::builder()
        .with_resource(resource)
        .with_reader(reader)
        .build())
}

fn logger_provider(
    config: &TelemetryConfig,
    resource: Resource,
    interval: Duration,
) -> TelemetryResult<SdkLoggerProvider> {
    let exporter = LogExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(signal_endpoint(config, "logs"))
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let processor = BatchLogProcessor::builder(exporter)
        .with_batch_config(
            opentelemetry_sdk::logs::BatchConfigBuilder::default()
                .with_scheduled_delay(interval)
                .build(),
        )
        .build();

    Ok(SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_log_processor(processor)
        .build())
}
