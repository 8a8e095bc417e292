//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber (console + optional OTLP export)
//! - Forward operation log lines to `tracing` with their span identity
//!
//! # Design Decisions
//! - Console filter honours `RUST_LOG`, falling back to the configured filter
//! - The export bridge silences transport crates, otherwise exporting a log
//!   would itself produce logs
//! - Operation logs attach the operation's OpenTelemetry context only for the
//!   duration of the emit call; the SDK stamps the exported record from it

use opentelemetry::trace::{SpanContext, TraceContextExt, TraceFlags, TraceState};
use opentelemetry::Context;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::observability::pipeline::TelemetryError;
use crate::observability::sink::{LogLevel, LogRecord, LogSink, TraceContext};

/// Targets never forwarded to the OTLP log exporter.
const EXPORT_SILENCED_TARGETS: &[&str] = &["hyper", "h2", "tonic", "reqwest", "opentelemetry"];

/// Install the global subscriber.
///
/// `logger_provider` adds the OpenTelemetry bridge layer when log export is on.
pub fn init_logging(
    filter: &str,
    logger_provider: Option<&SdkLoggerProvider>,
) -> Result<(), TelemetryError> {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let export_layer = match logger_provider {
        Some(provider) => {
            Some(OpenTelemetryTracingBridge::new(provider).with_filter(export_filter(filter)?))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(console_filter))
        .with(export_layer)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))
}

fn export_filter(filter: &str) -> Result<EnvFilter, TelemetryError> {
    let mut env_filter = EnvFilter::try_new(filter).map_err(|e| TelemetryError::Subscriber(e.to_string()))?;
    for target in EXPORT_SILENCED_TARGETS {
        let directive = format!("{target}=off")
            .parse()
            .map_err(|e: tracing_subscriber::filter::ParseError| TelemetryError::Subscriber(e.to_string()))?;
        env_filter = env_filter.add_directive(directive);
    }
    Ok(env_filter)
}

/// Log sink that writes operation logs as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn emit(&self, record: LogRecord<'_>) {
        let _attached = record
            .trace
            .is_valid()
            .then(|| operation_context(&record.trace).attach());

        let trace_id = record.trace.trace_id;
        let span_id = record.trace.span_id;
        let operation = record.operation;
        let message = record.message;

        match record.level {
            LogLevel::Debug => {
                tracing::debug!(operation, %trace_id, %span_id, "{}", message)
            }
            LogLevel::Info => {
                tracing::info!(operation, %trace_id, %span_id, "{}", message)
            }
            LogLevel::Warn => {
                tracing::warn!(operation, %trace_id, %span_id, "{}", message)
            }
            LogLevel::Error => {
                tracing::error!(operation, %trace_id, %span_id, "{}", message)
            }
        }
    }
}

fn operation_context(trace: &TraceContext) -> Context {
    let flags = if trace.sampled {
        TraceFlags::SAMPLED
    } else {
        TraceFlags::default()
    };
    let span_context = SpanContext::new(trace.trace_id, trace.span_id, flags, false, TraceState::default());
    Context::new().with_remote_span_context(span_context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use opentelemetry::logs::Severity;
    use opentelemetry::trace::{SpanId, TraceId, TracerProvider as _};
    use opentelemetry_sdk::logs::InMemoryLogExporter;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    use crate::observability::sink::{Noop, Telemetry};
    use crate::observability::tracing::OtelTraceSink;

    #[test]
    fn test_operation_context_carries_ids() {
        let trace = TraceContext {
            trace_id: TraceId::from_bytes([7; 16]),
            span_id: SpanId::from_bytes([9; 8]),
            sampled: true,
        };

        let cx = operation_context(&trace);
        assert!(cx.has_active_span());
        let span = cx.span();
        assert_eq!(span.span_context().trace_id(), trace.trace_id);
        assert_eq!(span.span_context().span_id(), trace.span_id);
        assert!(span.span_context().is_sampled());
    }

    #[test]
    fn test_export_filter_accepts_config_value() {
        assert!(export_filter("info").is_ok());
        assert!(export_filter("todo_service=debug,warn").is_ok());
    }

    fn otel_telemetry(tracer_provider: &SdkTracerProvider) -> Telemetry {
        Telemetry::new(
            Arc::new(OtelTraceSink::new(tracer_provider.tracer("test"))),
            Arc::new(Noop),
            Arc::new(TracingLogSink),
        )
    }

    #[test]
    fn test_exported_logs_carry_operation_span() {
        let exporter = InMemoryLogExporter::default();
        let logger_provider = SdkLoggerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer_provider = SdkTracerProvider::builder().build();
        let telemetry = otel_telemetry(&tracer_provider);

        let subscriber =
            tracing_subscriber::registry().with(OpenTelemetryTracingBridge::new(&logger_provider));
        let expected = tracing::subscriber::with_default(subscriber, || {
            telemetry
                .instrument("GetTodo", |op| {
                    op.info("Processing GET /todos/1");
                    Ok(op.trace_context())
                })
                .unwrap()
        });

        let logs = exporter.get_emitted_logs().unwrap();
        assert_eq!(logs.len(), 1);
        let exported = logs[0].record.trace_context().expect("log has trace context");
        assert_eq!(exported.trace_id, expected.trace_id);
        assert_eq!(exported.span_id, expected.span_id);
    }

    #[test]
    fn test_failure_log_exported_inside_span() {
        let exporter = InMemoryLogExporter::default();
        let logger_provider = SdkLoggerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let tracer_provider = SdkTracerProvider::builder().build();
        let telemetry = otel_telemetry(&tracer_provider);

        let subscriber =
            tracing_subscriber::registry().with(OpenTelemetryTracingBridge::new(&logger_provider));
        let mut seen = TraceContext::INVALID;
        tracing::subscriber::with_default(subscriber, || {
            let _ = telemetry.instrument::<(), _>("DeleteTodo", |op| {
                seen = op.trace_context();
                Err(crate::observability::OperationError::NotFound("9".into()))
            });
        });

        let logs = exporter.get_emitted_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].record.severity_number(), Some(Severity::Warn));
        let exported = logs[0].record.trace_context().expect("log has trace context");
        assert_eq!(exported.trace_id, seen.trace_id);
        assert_eq!(exported.span_id, seen.span_id);
    }

    #[test]
    fn test_invalid_context_exports_without_trace() {
        let exporter = InMemoryLogExporter::default();
        let logger_provider = SdkLoggerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();

        let subscriber =
            tracing_subscriber::registry().with(OpenTelemetryTracingBridge::new(&logger_provider));
        tracing::subscriber::with_default(subscriber, || {
            TracingLogSink.emit(LogRecord {
                level: LogLevel::Info,
                operation: "ListTodos",
                trace: TraceContext::INVALID,
                message: "Processing GET /todos",
            });
        });

        let logs = exporter.get_emitted_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].record.trace_context().is_none());
    }
}
