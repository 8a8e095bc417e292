//! In-memory telemetry backend.
//!
//! Implements all three sinks and appends every emission to one ordered
//! journal, so tests can count spans, metric points and log lines and check
//! the order they were produced in.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use opentelemetry::trace::{SpanId, TraceId};

use crate::observability::operation::{OPERATION_LABEL, STATUS_LABEL};
use crate::observability::sink::{
    ActiveSpan, Labels, LogLevel, LogRecord, LogSink, MetricSink, Outcome, SpanAttributes, Telemetry,
    TraceContext, TraceSink,
};

type OwnedLabels = Vec<(&'static str, &'static str)>;

/// A log line as the recorder saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLog {
    pub level: LogLevel,
    pub operation: &'static str,
    pub trace: TraceContext,
    pub message: String,
}

/// One entry of the journal.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryEvent {
    SpanStarted {
        name: &'static str,
        trace: TraceContext,
        attributes: Vec<(&'static str, String)>,
    },
    SpanEnded { name: &'static str, trace: TraceContext, outcome: Outcome },
    Log(RecordedLog),
    Counter { labels: OwnedLabels },
    Histogram { seconds: f64, labels: OwnedLabels },
}

impl TelemetryEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryEvent::SpanStarted { .. } => "span_started",
            TelemetryEvent::SpanEnded { .. } => "span_ended",
            TelemetryEvent::Log(_) => "log",
            TelemetryEvent::Counter { .. } => "counter",
            TelemetryEvent::Histogram { .. } => "histogram",
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    journal: Mutex<Vec<TelemetryEvent>>,
    next_id: AtomicU64,
}

impl Shared {
    fn push(&self, event: TelemetryEvent) {
        self.journal().push(event);
    }

    fn journal(&self) -> MutexGuard<'_, Vec<TelemetryEvent>> {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Recording backend. Clones share the same journal.
#[derive(Debug, Clone, Default)]
pub struct RecordingTelemetry {
    shared: Arc<Shared>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`Telemetry`] whose three sinks all write into this recorder.
    pub fn telemetry(&self) -> Telemetry {
        let sink = Arc::new(self.clone());
        Telemetry::new(sink.clone(), sink.clone(), sink)
    }

    /// Full journal in emission order.
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.shared.journal().clone()
    }

    pub fn clear(&self) {
        self.shared.journal().clear();
    }

    pub fn started_spans(&self) -> Vec<(&'static str, TraceContext)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::SpanStarted { name, trace, .. } => Some((name, trace)),
                _ => None,
            })
            .collect()
    }

    /// Start attributes of every span, in start order.
    pub fn span_attributes(&self) -> Vec<(&'static str, Vec<(&'static str, String)>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::SpanStarted { name, attributes, .. } => Some((name, attributes)),
                _ => None,
            })
            .collect()
    }

    pub fn spans_started(&self) -> usize {
        self.started_spans().len()
    }

    pub fn spans_ended(&self) -> usize {
        self.span_outcomes().len()
    }

    /// Outcomes of ended spans, in the order they ended.
    pub fn span_outcomes(&self) -> Vec<Outcome> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::SpanEnded { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect()
    }

    pub fn counters(&self) -> Vec<OwnedLabels> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::Counter { labels } => Some(labels),
                _ => None,
            })
            .collect()
    }

    /// Number of counter increments labelled with `operation` and `status`.
    pub fn counter_total(&self, operation: &str, status: &str) -> usize {
        self.counters()
            .iter()
            .filter(|labels| {
                let has = |key: &str, value: &str| labels.iter().any(|(k, v)| *k == key && *v == value);
                has(OPERATION_LABEL, operation) && has(STATUS_LABEL, status)
            })
            .count()
    }

    pub fn histograms(&self) -> Vec<(f64, OwnedLabels)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::Histogram { seconds, labels } => Some((seconds, labels)),
                _ => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<RecordedLog> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::Log(log) => Some(log),
                _ => None,
            })
            .collect()
    }

    fn next_context(&self) -> TraceContext {
        let n = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        TraceContext {
            trace_id: TraceId::from_bytes(u128::from(n).to_be_bytes()),
            span_id: SpanId::from_bytes(n.to_be_bytes()),
            sampled: true,
        }
    }
}

struct RecordingSpan {
    name: &'static str,
    trace: TraceContext,
    shared: Arc<Shared>,
}

impl ActiveSpan for RecordingSpan {
    fn context(&self) -> TraceContext {
        self.trace
    }

    fn end(self: Box<Self>, outcome: Outcome) {
        self.shared.push(TelemetryEvent::SpanEnded {
            name: self.name,
            trace: self.trace,
            outcome,
        });
    }
}

impl TraceSink for RecordingTelemetry {
    fn start_span(&self, name: &'static str, attributes: SpanAttributes<'_>) -> Box<dyn ActiveSpan> {
        let trace = self.next_context();
        self.shared.push(TelemetryEvent::SpanStarted {
            name,
            trace,
            attributes: attributes
                .iter()
                .map(|(key, value)| (*key, value.to_string()))
                .collect(),
        });
        Box::new(RecordingSpan {
            name,
            trace,
            shared: self.shared.clone(),
        })
    }
}

impl MetricSink for RecordingTelemetry {
    fn increment_counter(&self, labels: Labels<'_>) {
        self.shared.push(TelemetryEvent::Counter {
            labels: labels.to_vec(),
        });
    }

    fn record_histogram(&self, seconds: f64, labels: Labels<'_>) {
        self.shared.push(TelemetryEvent::Histogram {
            seconds,
            labels: labels.to_vec(),
        });
    }
}

impl LogSink for RecordingTelemetry {
    fn emit(&self, record: LogRecord<'_>) {
        self.shared.push(TelemetryEvent::Log(RecordedLog {
            level: record.level,
            operation: record.operation,
            trace: record.trace,
            message: record.message.to_string(),
        }));
    }
}
