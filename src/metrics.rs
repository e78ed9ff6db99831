//! Metrics and tracing helpers.
//!
//! Counters live in the global [`METRICS`] (feature `metrics`) and are exported
//! through a Prometheus registry; spans come from [`tracing_helpers`]
//! (feature `tracing`).

#[cfg(feature = "metrics")]
pub use otel::{InventoryMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider};
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<InventoryMetrics> = Lazy::new(InventoryMetrics::init);

    pub struct InventoryMetrics {
        pub registry: Registry,
        pub provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub snapshot_loads_total: Counter<u64>,
        pub snapshot_load_failures_total: Counter<u64>,
        pub degraded_rows_total: Counter<u64>,
        pub returns_total: Counter<u64>,
        pub penalties_charged: Counter<f64>,
        pub registrations_total: Counter<u64>,
        pub validation_rejections_total: Counter<u64>,
    }

    impl InventoryMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let exporter = opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            let meter = provider.meter("leogas");

            Self {
                registry,
                provider,
                queries_total: meter
                    .u64_counter("leogas_queries_total")
                    .with_description("Total statements sent to the record store")
                    .build(),
                query_errors_total: meter
                    .u64_counter("leogas_query_errors_total")
                    .with_description("Statements that failed at the record store")
                    .build(),
                query_duration: meter
                    .f64_histogram("leogas_query_duration_seconds")
                    .with_description("Duration of record store statements")
                    .build(),
                snapshot_loads_total: meter
                    .u64_counter("leogas_snapshot_loads_total")
                    .with_description("Successful snapshot loads")
                    .build(),
                snapshot_load_failures_total: meter
                    .u64_counter("leogas_snapshot_load_failures_total")
                    .with_description("Snapshot loads that kept the previous snapshot")
                    .build(),
                degraded_rows_total: meter
                    .u64_counter("leogas_degraded_rows_total")
                    .with_description("Rows loaded with data-quality warnings")
                    .build(),
                returns_total: meter
                    .u64_counter("leogas_returns_total")
                    .with_description("Cylinder returns recorded")
                    .build(),
                penalties_charged: meter
                    .f64_counter("leogas_penalties_charged")
                    .with_description("Sum of penalties charged on return")
                    .build(),
                registrations_total: meter
                    .u64_counter("leogas_registrations_total")
                    .with_description("Cylinders registered")
                    .build(),
                validation_rejections_total: meter
                    .u64_counter("leogas_validation_rejections_total")
                    .with_description("Form submissions rejected before reaching the store")
                    .build(),
            }
        }

        pub fn record_query_duration(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_snapshot_load(&self, degraded_rows: usize) {
            self.snapshot_loads_total.add(1, &[]);
            self.degraded_rows_total.add(degraded_rows as u64, &[]);
        }

        pub fn record_snapshot_failure(&self) {
            self.snapshot_load_failures_total.add(1, &[]);
        }

        pub fn record_return(&self, penalty: f64) {
            self.returns_total.add(1, &[]);
            self.penalties_charged.add(penalty, &[]);
        }

        pub fn record_registration(&self) {
            self.registrations_total.add(1, &[]);
        }

        pub fn record_rejection(&self) {
            self.validation_rejections_total.add(1, &[]);
        }

        /// Current values in the Prometheus text format.
        pub fn render(&self) -> String {
            TextEncoder::new()
                .encode_to_string(&self.registry.gather())
                .unwrap_or_else(|e| {
                    log::warn!("Failed to encode metrics: {}", e);
                    String::new()
                })
        }
    }

}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    pub fn load_snapshot_span(table: &str) -> Span {
        tracing::info_span!("leogas.load_snapshot", table = table)
    }

    pub fn return_cylinder_span(cylinder_id: &str) -> Span {
        tracing::info_span!("leogas.return_cylinder", cylinder_id = cylinder_id)
    }

    pub fn register_cylinder_span(cylinder_id: &str) -> Span {
        tracing::info_span!("leogas.register_cylinder", cylinder_id = cylinder_id)
    }

    pub fn execute_query_span(query: &str) -> Span {
        // Statement text can be long; keep the verb only.
        let verb = query.split_whitespace().next().unwrap_or("");
        tracing::debug_span!("leogas.execute_query", verb = verb)
    }
}
