//! Instrumented operation wrapper.
//!
//! # Responsibilities
//! - Open one span per operation and hand its identity to the work explicitly
//! - Measure wall-clock duration of the work
//! - Record exactly one histogram point and one counter increment
//! - Close the span on every exit path, including unwinding panics
//!
//! # Ordering
//! ```text
//! start span → start clock → work (logs carry span ids)
//!     → failure log (if any) → histogram → counter → end span
//! ```
//!
//! Everything after the work runs from `OperationScope::drop`, which is what
//! makes the envelope exactly-once regardless of how the work exits.

use std::time::Instant;

use thiserror::Error;

use crate::observability::sink::{
    ActiveSpan, LogLevel, LogRecord, LogSink, Outcome, SpanAttributes, Telemetry, TraceContext,
};
use crate::store::StoreError;

/// Label key carrying the operation name.
pub const OPERATION_LABEL: &str = "operation";

/// Label key carrying the outcome.
pub const STATUS_LABEL: &str = "status";

/// Errors an instrumented operation can end with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Requested task does not exist. Recoverable, not a fault.
    #[error("task {0} not found")]
    NotFound(String),

    /// Unexpected failure inside the work.
    #[error("internal fault: {0}")]
    Internal(String),
}

impl OperationError {
    pub fn outcome(&self) -> Outcome {
        match self {
            OperationError::NotFound(_) => Outcome::NotFound,
            OperationError::Internal(_) => Outcome::Error,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            OperationError::NotFound(_) => LogLevel::Warn,
            OperationError::Internal(_) => LogLevel::Error,
        }
    }
}

impl From<StoreError> for OperationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => OperationError::NotFound(id),
        }
    }
}

/// Handle given to the work of an instrumented operation.
///
/// Carries the active span's identity; log lines written through it are
/// attributed to that span.
#[derive(Clone, Copy)]
pub struct OperationContext<'a> {
    operation: &'static str,
    trace: TraceContext,
    logs: &'a dyn LogSink,
}

impl<'a> OperationContext<'a> {
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn trace_context(&self) -> TraceContext {
        self.trace
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        self.logs.emit(LogRecord {
            level,
            operation: self.operation,
            trace: self.trace,
            message,
        });
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message.as_ref());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message.as_ref());
    }
}

/// Scope guard pairing span start/end and the metric records.
struct OperationScope<'a> {
    telemetry: &'a Telemetry,
    operation: &'static str,
    span: Option<Box<dyn ActiveSpan>>,
    trace: TraceContext,
    started: Instant,
    outcome: Option<Outcome>,
}

impl<'a> OperationScope<'a> {
    fn start(telemetry: &'a Telemetry, operation: &'static str, attributes: SpanAttributes<'_>) -> Self {
        let span = telemetry.traces.start_span(operation, attributes);
        let trace = span.context();
        Self {
            telemetry,
            operation,
            span: Some(span),
            trace,
            started: Instant::now(),
            outcome: None,
        }
    }

    fn context(&self) -> OperationContext<'a> {
        OperationContext {
            operation: self.operation,
            trace: self.trace,
            logs: self.telemetry.logs.as_ref(),
        }
    }

    fn finish(mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for OperationScope<'_> {
    fn drop(&mut self) {
        // No outcome means the work unwound.
        let outcome = match self.outcome {
            Some(outcome) => outcome,
            None => {
                self.context().error("operation aborted by panic");
                Outcome::Error
            }
        };

        let duration = self.started.elapsed().as_secs_f64();
        let metrics = &self.telemetry.metrics;
        metrics.record_histogram(duration, &[(OPERATION_LABEL, self.operation)]);
        metrics.increment_counter(&[
            (OPERATION_LABEL, self.operation),
            (STATUS_LABEL, outcome.as_str()),
        ]);

        if let Some(span) = self.span.take() {
            span.end(outcome);
        }
    }
}

impl Telemetry {
    /// Run `work` inside the observability envelope for `operation`.
    ///
    /// The work receives an [`OperationContext`] for correlated logging. Its
    /// result is returned unchanged; an `Err` is logged inside the span and
    /// classified as `not_found` or `error`.
    pub fn instrument<T, F>(&self, operation: &'static str, work: F) -> Result<T, OperationError>
    where
        F: FnOnce(&OperationContext<'_>) -> Result<T, OperationError>,
    {
        self.instrument_with(operation, &[], work)
    }

    /// Like [`Telemetry::instrument`], with extra attributes on the span.
    pub fn instrument_with<T, F>(
        &self,
        operation: &'static str,
        attributes: SpanAttributes<'_>,
        work: F,
    ) -> Result<T, OperationError>
    where
        F: FnOnce(&OperationContext<'_>) -> Result<T, OperationError>,
    {
        let scope = OperationScope::start(self, operation, attributes);
        let ctx = scope.context();

        let result = work(&ctx);

        let outcome = match &result {
            Ok(_) => Outcome::Success,
            Err(err) => {
                ctx.log(err.log_level(), &err.to_string());
                err.outcome()
            }
        };
        scope.finish(outcome);
        result
    }
}
