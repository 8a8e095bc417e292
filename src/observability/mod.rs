//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler
//!     → Telemetry::instrument (operation.rs)
//!         → TraceSink   (tracing.rs: one span per operation)
//!         → LogSink     (logging.rs: log lines tagged with span ids)
//!         → MetricSink  (metrics.rs: counter + duration histogram)
//!
//! pipeline.rs builds the OpenTelemetry providers behind those sinks and
//! exports over OTLP/HTTP; recording.rs is the in-memory stand-in for tests.
//! ```
//!
//! # Design Decisions
//! - The wrapper only sees the traits in sink.rs, never an SDK type
//! - Span identity is passed explicitly through `OperationContext`
//! - Sinks never return errors; export failures stay inside the SDK

pub mod logging;
pub mod metrics;
pub mod operation;
pub mod pipeline;
pub mod recording;
pub mod sink;
pub mod tracing;

pub use operation::{OperationContext, OperationError, OPERATION_LABEL, STATUS_LABEL};
pub use pipeline::{TelemetryError, TelemetryPipeline};
pub use recording::RecordingTelemetry;
pub use sink::{LogLevel, Outcome, Telemetry, TraceContext};
