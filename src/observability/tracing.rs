//! OpenTelemetry trace sink.
//!
//! # Responsibilities
//! - Start one SDK span per instrumented operation
//! - Expose the span's trace/span ids to the operation
//! - Copy request attributes onto the span
//! - Tag the span with its outcome and end it
//!
//! # Design Decisions
//! - Spans are started against an empty parent context: the operation's
//!   identity is carried explicitly, never picked up from ambient state
//! - Only `error` outcomes set an error status; `not_found` is a normal result

use opentelemetry::trace::{Span as _, SpanKind, Status, Tracer as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::{SdkTracer, Span};

use crate::observability::operation::OPERATION_LABEL;
use crate::observability::sink::{ActiveSpan, Outcome, SpanAttributes, TraceContext, TraceSink};

/// Trace sink backed by an SDK tracer.
#[derive(Debug, Clone)]
pub struct OtelTraceSink {
    tracer: SdkTracer,
}

impl OtelTraceSink {
    pub fn new(tracer: SdkTracer) -> Self {
        Self { tracer }
    }
}

impl TraceSink for OtelTraceSink {
    fn start_span(&self, name: &'static str, attributes: SpanAttributes<'_>) -> Box<dyn ActiveSpan> {
        let attributes = std::iter::once(KeyValue::new(OPERATION_LABEL, name)).chain(
            attributes
                .iter()
                .map(|(key, value)| KeyValue::new(*key, value.to_string())),
        );
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(SpanKind::Server)
            .with_attributes(attributes)
            .start_with_context(&self.tracer, &Context::new());

        Box::new(OtelSpan { inner: span })
    }
}

struct OtelSpan {
    inner: Span,
}

impl ActiveSpan for OtelSpan {
    fn context(&self) -> TraceContext {
        let span_context = self.inner.span_context();
        TraceContext {
            trace_id: span_context.trace_id(),
            span_id: span_context.span_id(),
            sampled: span_context.is_sampled(),
        }
    }

    fn end(mut self: Box<Self>, outcome: Outcome) {
        self.inner
            .set_attribute(KeyValue::new("outcome", outcome.as_str()));
        if outcome == Outcome::Error {
            self.inner.set_status(Status::error("operation failed"));
        }
        self.inner.end();
    }
}
