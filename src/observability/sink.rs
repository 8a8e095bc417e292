//! Telemetry sink interfaces.
//!
//! The operation wrapper only talks to these three traits. Concrete backends
//! (OpenTelemetry, Prometheus, in-memory recording, no-op) live in sibling
//! modules.

use std::fmt;
use std::sync::Arc;

use opentelemetry::trace::{SpanId, TraceId};

/// Label set attached to a metric point.
pub type Labels<'a> = &'a [(&'static str, &'static str)];

/// Request attributes attached to an operation span when it starts.
pub type SpanAttributes<'a> = &'a [(&'static str, &'a str)];

/// Identity of the span an operation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub sampled: bool,
}

impl TraceContext {
    /// Context for a span that is not recorded anywhere.
    pub const INVALID: TraceContext = TraceContext {
        trace_id: TraceId::INVALID,
        span_id: SpanId::INVALID,
        sampled: false,
    };

    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.trace_id, self.span_id)
    }
}

/// How an instrumented operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    NotFound,
    Error,
}

impl Outcome {
    /// Value used for the `status` metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an operation log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A log line emitted from inside an instrumented operation.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub level: LogLevel,
    pub operation: &'static str,
    pub trace: TraceContext,
    pub message: &'a str,
}

/// A started span. Dropping it without calling `end` leaves it unfinished.
pub trait ActiveSpan: Send {
    fn context(&self) -> TraceContext;
    fn end(self: Box<Self>, outcome: Outcome);
}

/// Trace channel.
pub trait TraceSink: Send + Sync {
    fn start_span(&self, name: &'static str, attributes: SpanAttributes<'_>) -> Box<dyn ActiveSpan>;
}

/// Metric channel: one operation counter and one duration histogram.
pub trait MetricSink: Send + Sync {
    fn increment_counter(&self, labels: Labels<'_>);
    fn record_histogram(&self, seconds: f64, labels: Labels<'_>);
}

/// Log channel.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: LogRecord<'_>);
}

/// The three sinks an instrumented operation writes into.
#[derive(Clone)]
pub struct Telemetry {
    pub(crate) traces: Arc<dyn TraceSink>,
    pub(crate) metrics: Arc<dyn MetricSink>,
    pub(crate) logs: Arc<dyn LogSink>,
}

impl Telemetry {
    pub fn new(
        traces: Arc<dyn TraceSink>,
        metrics: Arc<dyn MetricSink>,
        logs: Arc<dyn LogSink>,
    ) -> Self {
        Self { traces, metrics, logs }
    }

    /// Telemetry that discards everything.
    pub fn disabled() -> Self {
        let noop = Arc::new(Noop);
        Self::new(noop.clone(), noop.clone(), noop)
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry").finish_non_exhaustive()
    }
}

/// Sink used for pipelines that are switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

struct NoopSpan;

impl ActiveSpan for NoopSpan {
    fn context(&self) -> TraceContext {
        TraceContext::INVALID
    }

    fn end(self: Box<Self>, _outcome: Outcome) {}
}

impl TraceSink for Noop {
    fn start_span(&self, _name: &'static str, _attributes: SpanAttributes<'_>) -> Box<dyn ActiveSpan> {
        Box::new(NoopSpan)
    }
}

impl MetricSink for Noop {
    fn increment_counter(&self, _labels: Labels<'_>) {}
    fn record_histogram(&self, _seconds: f64, _labels: Labels<'_>) {}
}

impl LogSink for Noop {
    fn emit(&self, _record: LogRecord<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Success.as_str(), "success");
        assert_eq!(Outcome::NotFound.as_str(), "not_found");
        assert_eq!(Outcome::Error.to_string(), "error");
    }

    #[test]
    fn test_invalid_context() {
        assert!(!TraceContext::INVALID.is_valid());
        let ctx = TraceContext {
            trace_id: TraceId::from_bytes([1; 16]),
            span_id: SpanId::from_bytes([2; 8]),
            sampled: true,
        };
        assert!(ctx.is_valid());
        assert_eq!(
            ctx.to_string(),
            "01010101010101010101010101010101/0202020202020202"
        );
    }

    #[test]
    fn test_noop_span_has_invalid_context() {
        let span = Noop.start_span("ListTodos", &[]);
        assert_eq!(span.context(), TraceContext::INVALID);
        span.end(Outcome::Success);
    }
}
