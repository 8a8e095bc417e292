//! Metric sinks.
//!
//! # Metrics
//! - `todo.operations` (counter): operations by `operation`, `status`
//! - `todo.duration` (histogram, seconds): operation latency by `operation`
//!
//! The Prometheus flavour exposes the same instruments as
//! `todo_operations_total` and `todo_duration_seconds` on a scrape endpoint.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;

use crate::observability::sink::{Labels, MetricSink};

pub const OPERATIONS_COUNTER: &str = "todo.operations";
pub const DURATION_HISTOGRAM: &str = "todo.duration";

pub const PROMETHEUS_OPERATIONS_COUNTER: &str = "todo_operations_total";
pub const PROMETHEUS_DURATION_HISTOGRAM: &str = "todo_duration_seconds";

fn key_values(labels: Labels<'_>) -> Vec<KeyValue> {
    labels
        .iter()
        .map(|(key, value)| KeyValue::new(*key, *value))
        .collect()
}

/// Metric sink backed by OpenTelemetry instruments.
#[derive(Debug, Clone)]
pub struct OtelMetricSink {
    operations: Counter<u64>,
    duration: Histogram<f64>,
}

impl OtelMetricSink {
    pub fn new(meter: &Meter) -> Self {
        let operations = meter
            .u64_counter(OPERATIONS_COUNTER)
            .with_description("Number of todo operations")
            .build();
        let duration = meter
            .f64_histogram(DURATION_HISTOGRAM)
            .with_description("Duration of todo operations")
            .with_unit("s")
            .build();

        Self { operations, duration }
    }
}

impl MetricSink for OtelMetricSink {
    fn increment_counter(&self, labels: Labels<'_>) {
        self.operations.add(1, &key_values(labels));
    }

    fn record_histogram(&self, seconds: f64, labels: Labels<'_>) {
        self.duration.record(seconds, &key_values(labels));
    }
}

/// Metric sink writing to the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusMetricSink;

impl MetricSink for PrometheusMetricSink {
    fn increment_counter(&self, labels: Labels<'_>) {
        metrics::counter!(PROMETHEUS_OPERATIONS_COUNTER, prometheus_labels(labels)).increment(1);
    }

    fn record_histogram(&self, seconds: f64, labels: Labels<'_>) {
        metrics::histogram!(PROMETHEUS_DURATION_HISTOGRAM, prometheus_labels(labels)).record(seconds);
    }
}

fn prometheus_labels(labels: Labels<'_>) -> Vec<metrics::Label> {
    labels
        .iter()
        .map(|(key, value)| metrics::Label::new(*key, *value))
        .collect()
}

/// Builder carrying the histogram buckets for operation latency.
fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(PROMETHEUS_DURATION_HISTOGRAM.to_string()),
        &[0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
    )
}

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_prometheus(addr: SocketAddr) -> Result<(), BuildError> {
    prometheus_builder()?.with_http_listener(addr).install()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider as _;
    use opentelemetry_sdk::metrics::data::{AggregatedMetrics, MetricData};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    #[test]
    fn test_key_values() {
        let kv = key_values(&[("operation", "GetTodo"), ("status", "not_found")]);
        assert_eq!(kv.len(), 2);
        assert_eq!(kv[0].key.as_str(), "operation");
        assert_eq!(kv[1].value.as_str(), "not_found");
    }

    fn sorted_attributes<'a>(attributes: impl Iterator<Item = &'a KeyValue>) -> Vec<(String, String)> {
        let mut attributes: Vec<_> = attributes
            .map(|kv| (kv.key.to_string(), kv.value.to_string()))
            .collect();
        attributes.sort();
        attributes
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_otel_sink_exports_labelled_points() {
        let exporter = InMemoryMetricExporter::default();
        let provider = SdkMeterProvider::builder()
            .with_reader(PeriodicReader::builder(exporter.clone()).build())
            .build();
        let sink = OtelMetricSink::new(&provider.meter("test"));

        sink.increment_counter(&[("operation", "DeleteTodo"), ("status", "not_found")]);
        sink.record_histogram(0.002, &[("operation", "DeleteTodo")]);
        provider.force_flush().unwrap();

        let exported = exporter.get_finished_metrics().unwrap();
        let metrics: Vec<_> = exported
            .iter()
            .flat_map(|resource| resource.scope_metrics())
            .flat_map(|scope| scope.metrics())
            .collect();

        let counter = metrics
            .iter()
            .find(|metric| metric.name() == OPERATIONS_COUNTER)
            .expect("counter exported");
        match counter.data() {
            AggregatedMetrics::U64(MetricData::Sum(sum)) => {
                let points: Vec<_> = sum.data_points().collect();
                assert_eq!(points.len(), 1);
                assert_eq!(points[0].value(), 1);
                assert_eq!(
                    sorted_attributes(points[0].attributes()),
                    vec![pair("operation", "DeleteTodo"), pair("status", "not_found")]
                );
            }
            other => panic!("unexpected counter data: {other:?}"),
        }

        let histogram = metrics
            .iter()
            .find(|metric| metric.name() == DURATION_HISTOGRAM)
            .expect("histogram exported");
        assert_eq!(histogram.unit(), "s");
        match histogram.data() {
            AggregatedMetrics::F64(MetricData::Histogram(data)) => {
                let points: Vec<_> = data.data_points().collect();
                assert_eq!(points.len(), 1);
                assert_eq!(points[0].count(), 1);
                assert_eq!(
                    sorted_attributes(points[0].attributes()),
                    vec![pair("operation", "DeleteTodo")]
                );
            }
            other => panic!("unexpected histogram data: {other:?}"),
        }
    }

    #[test]
    fn test_prometheus_sink_renders_labelled_series() {
        let recorder = prometheus_builder().unwrap().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            PrometheusMetricSink.increment_counter(&[("operation", "AddTodo"), ("status", "success")]);
            PrometheusMetricSink.record_histogram(0.003, &[("operation", "AddTodo")]);
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"todo_operations_total{operation="AddTodo",status="success"} 1"#));
        assert!(rendered.contains(r#"todo_duration_seconds_bucket{operation="AddTodo",le="0.005"} 1"#));
        assert!(rendered.contains(r#"todo_duration_seconds_count{operation="AddTodo"} 1"#));
    }
}
