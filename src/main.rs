//! Ludi artisan enrichment binary.
//! Reads the artisan contact sheet, asks the completion model for a craft
//! profile per row and writes one JSON array.
//!
//! Usage: `ludi-enrich [INPUT_CSV] [OUTPUT_JSON]`

use std::path::PathBuf;

use ludi_enrich::telemetry::Metrics;
use ludi_enrich::{EnrichConfig, EnrichRuntime};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ludi_enrich=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; OPENAI_API_KEY usually lives there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut cfg = EnrichConfig::load_default()?;
    let mut args = std::env::args().skip(1);
    if let Some(input) = args.next() {
        cfg.input_path = PathBuf::from(input);
    }
    if let Some(output) = args.next() {
        cfg.output_path = PathBuf::from(output);
    }

    let metrics = match std::env::var("ENRICH_METRICS_PATH") {
        Ok(p) => Some((Metrics::init()?, PathBuf::from(p))),
        Err(_) => None,
    };

    let runtime = EnrichRuntime::from_config(cfg)?;
    let report = runtime.run().await?;

    if let Some((m, path)) = metrics {
        if let Err(e) = m.dump_to(&path) {
            tracing::warn!(error = %format!("{e:#}"), "metrics dump failed");
        }
    }

    println!(
        "Done! Output written to {} ({} profiles, {} degraded, {} skipped)",
        runtime.output_path().display(),
        report.written,
        report.degraded,
        report.skipped
    );
    Ok(())
}
