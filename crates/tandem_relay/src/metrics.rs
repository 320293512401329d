//! OpenTelemetry instruments for relay runs.
//!
//! Instruments come from the global meter and are no-ops until a meter
//! provider is installed.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;

static METRICS: OnceLock<RelayMetrics> = OnceLock::new();

/// Counters and histograms for comparison runs, labeled by provider.
#[derive(Clone)]
pub struct RelayMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Runs started
    pub runs_started: Counter<u64>,
    /// Branches that completed successfully
    pub branch_completions: Counter<u64>,
    /// Branches that failed
    pub branch_errors: Counter<u64>,
    /// Results that could not be persisted
    pub save_failures: Counter<u64>,
    /// Branch wall-clock duration in seconds
    pub branch_duration: Histogram<f64>,
    /// Estimated tokens streamed
    pub tokens: Counter<u64>,
}

impl RelayMetrics {
    fn init() -> Self {
        let meter = global::meter("tandem_relay");

        Self {
            _meter: meter.clone(),
            runs_started: meter
                .u64_counter("relay.runs")
                .with_description("Comparison runs started")
                .build(),
            branch_completions: meter
                .u64_counter("relay.branch.completions")
                .with_description("Branches that completed successfully")
                .build(),
            branch_errors: meter
                .u64_counter("relay.branch.errors")
                .with_description("Branches that failed")
                .build(),
            save_failures: meter
                .u64_counter("relay.save_failures")
                .with_description("Provider results that could not be persisted")
                .build(),
            branch_duration: meter
                .f64_histogram("relay.branch.duration")
                .with_unit("seconds")
                .with_description("Branch wall-clock duration")
                .build(),
            tokens: meter
                .u64_counter("relay.tokens")
                .with_description("Estimated tokens streamed")
                .build(),
        }
    }

    /// Get the global relay metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a new run.
    pub fn record_run_started(&self) {
        self.runs_started.add(1, &[]);
    }

    /// Record a successful branch.
    pub fn record_completion(&self, provider: &str, model: &str, duration_secs: f64, tokens: u64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.branch_completions.add(1, labels);
        self.branch_duration.record(duration_secs, labels);
        self.tokens.add(tokens, labels);
    }

    /// Record a failed branch.
    pub fn record_error(&self, provider: &str, model: &str, error_class: &'static str) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("error_type", error_class),
        ];
        self.branch_errors.add(1, labels);
    }

    /// Record a result that could not be saved.
    pub fn record_save_failure(&self, provider: &str) {
        self.save_failures
            .add(1, &[KeyValue::new("provider", provider.to_string())]);
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}
