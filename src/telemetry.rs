use std::path::Path;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up in the dump).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("enrich_rows_total", "Rows handed to a batch task.");
        describe_counter!(
            "enrich_rows_skipped_total",
            "Rows skipped because they carry no name."
        );
        describe_counter!(
            "enrich_degraded_total",
            "Rows written as {name, error} or {name, raw_response}."
        );
        describe_counter!(
            "enrich_write_failures_total",
            "Rows whose append to the output file failed."
        );
        describe_histogram!(
            "enrich_request_ms",
            "Completion request latency in milliseconds."
        );
        describe_gauge!("enrich_in_flight", "Row tasks currently holding a slot.");
        describe_gauge!("enrich_last_run_ts", "Unix ts when the last batch finished.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Stamp the run time and write the exposition text to `path`.
    pub fn dump_to(&self, path: &Path) -> Result<()> {
        gauge!("enrich_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        std::fs::write(path, self.render())
            .with_context(|| format!("writing metrics to {}", path.display()))
    }
}
