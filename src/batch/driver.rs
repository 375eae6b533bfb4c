// src/batch/driver.rs
//! # Batch Driver
//! Wires source → limiter → enricher → writer for one run.
//!
//! Phases: read every row (fatal on failure, output untouched), open the
//! output and write `[`, fan out one limited task per row, wait for all of
//! them, write `]`. A failing row never aborts its siblings.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use metrics::counter;
use serde::Serialize;
use tokio::io::AsyncWrite;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use super::limiter::ConcurrencyLimiter;
use super::writer::{OutputWriter, SeparatorPolicy};
use crate::enrich::{ProfileEnricher, ProfileEntry};
use crate::source::{InputRecord, RowSource};

/// Per-run counters, logged at the end and returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total_rows: usize,
    pub skipped: usize,
    pub enriched: usize,
    pub degraded: usize,
    pub write_failures: usize,
    pub written: usize,
    pub peak_in_flight: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    Skipped,
    Enriched,
    Degraded,
    WriteFailed,
}

pub struct BatchDriver {
    source: RowSource,
    enricher: ProfileEnricher,
    limiter: ConcurrencyLimiter,
    policy: SeparatorPolicy,
}

impl BatchDriver {
    pub fn new(enricher: ProfileEnricher, concurrency: usize, policy: SeparatorPolicy) -> Self {
        Self {
            source: RowSource::default(),
            enricher,
            limiter: ConcurrencyLimiter::new(concurrency),
            policy,
        }
    }

    pub fn with_source(mut self, source: RowSource) -> Self {
        self.source = source;
        self
    }

    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Full run: CSV at `input` → JSON array at `output` (overwritten).
    pub async fn run(&self, input: &Path, output: &Path) -> Result<BatchReport> {
        let rows = self.source.read_path(input)?;
        info!(rows = rows.len(), input = %input.display(), "input loaded");

        let writer = OutputWriter::create(output, self.policy).await?;
        let report = self.run_rows(rows, writer).await?;
        info!(
            output = %output.display(),
            written = report.written,
            degraded = report.degraded,
            skipped = report.skipped,
            write_failures = report.write_failures,
            elapsed_ms = report.elapsed_ms,
            "Done! Output written"
        );
        Ok(report)
    }

    /// Fan the rows out through the limiter into an already opened writer,
    /// then close the array.
    pub async fn run_rows<W>(
        &self,
        rows: Vec<InputRecord>,
        writer: OutputWriter<W>,
    ) -> Result<BatchReport>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        crate::telemetry::ensure_metrics_described();
        let t0 = Instant::now();
        let writer = Arc::new(writer);
        let mut report = BatchReport {
            total_rows: rows.len(),
            ..BatchReport::default()
        };

        let mut tasks = JoinSet::new();
        for (idx, record) in rows.into_iter().enumerate() {
            let limiter = self.limiter.clone();
            let enricher = self.enricher.clone();
            let writer = Arc::clone(&writer);
            tasks.spawn(async move {
                limiter
                    .run(process_row(idx, record, enricher, writer))
                    .await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(RowOutcome::Skipped) => report.skipped += 1,
                Ok(RowOutcome::Enriched) => report.enriched += 1,
                Ok(RowOutcome::Degraded) => report.degraded += 1,
                Ok(RowOutcome::WriteFailed) => report.write_failures += 1,
                Err(e) => {
                    error!(error = %e, "row task aborted");
                    report.write_failures += 1;
                }
            }
        }

        report.written = writer.finish().await.context("closing output array")?;
        report.peak_in_flight = self.limiter.peak_in_flight();
        report.elapsed_ms = t0.elapsed().as_millis() as u64;
        Ok(report)
    }
}

async fn process_row<W>(
    idx: usize,
    record: InputRecord,
    enricher: ProfileEnricher,
    writer: Arc<OutputWriter<W>>,
) -> RowOutcome
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    counter!("enrich_rows_total").increment(1);
    let Some(name) = record.name().map(str::to_string) else {
        debug!(row = idx, "row without name skipped");
        counter!("enrich_rows_skipped_total").increment(1);
        return RowOutcome::Skipped;
    };
    info!(row = idx, "Processing: {name}");

    // A panic while enriching is contained here and written as an error entry.
    let entry = match tokio::spawn(async move { enricher.enrich(&record).await }).await {
        Ok(entry) => entry,
        Err(e) => {
            error!(artisan = %name, error = %e, "enrichment task failed");
            ProfileEntry::Failed {
                name: name.clone(),
                error: e.to_string(),
            }
        }
    };

    let degraded = entry.is_degraded();
    if degraded {
        counter!("enrich_degraded_total").increment(1);
    }

    match writer.append(&entry, idx == 0).await {
        Ok(()) if degraded => RowOutcome::Degraded,
        Ok(()) => RowOutcome::Enriched,
        Err(e) => {
            error!(artisan = %name, error = %format!("{e:#}"), "failed to append profile");
            counter!("enrich_write_failures_total").increment(1);
            RowOutcome::WriteFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{ChatPrompt, CompletionProvider, PromptTemplate};
    use async_trait::async_trait;
    use serde_json::Value;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        async fn complete(&self, _p: &ChatPrompt) -> anyhow::Result<String> {
            Ok(r#"{"craft_details":{"craft_category":"Lace"}}"#.to_string())
        }
        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn driver() -> BatchDriver {
        let enricher = ProfileEnricher::new(Arc::new(Echo), PromptTemplate::default());
        BatchDriver::new(enricher, 5, SeparatorPolicy::WriteOrder)
    }

    #[tokio::test]
    async fn end_to_end_single_row() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.json");
        std::fs::write(
            &input,
            "Name,City,State,Email,Phone Number 1,Phone Number 2\nMaria,Recife,PE,maria@x.com,111,\n",
        )
        .unwrap();

        let report = driver().run(&input, &output).await.unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(report.enriched, 1);

        let v: Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let first = &v.as_array().unwrap()[0];
        assert_eq!(first["artisan_profile"]["contact"]["phone"], "111");
        assert_eq!(first["artisan_profile"]["location"]["country"], "Brazil");
        assert_eq!(first["craft_details"]["craft_category"], "Lace");
    }

    #[tokio::test]
    async fn missing_input_does_not_touch_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.json");
        std::fs::write(&output, "previous run").unwrap();

        let err = driver()
            .run(&dir.path().join("missing.csv"), &output)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("missing.csv"));
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous run");
    }

    #[tokio::test]
    async fn nameless_rows_are_skipped() {
        let rows = vec![
            InputRecord::from_pairs([("Name", "Ana")]),
            InputRecord::from_pairs([("Name", ""), ("City", "Recife")]),
            InputRecord::from_pairs([("name", "Zé")]),
        ];
        let writer = OutputWriter::open(Vec::new(), SeparatorPolicy::WriteOrder)
            .await
            .unwrap();
        let report = driver().run_rows(rows, writer).await.unwrap();
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.written, 2);
    }
}
