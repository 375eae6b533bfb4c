// src/bootstrap.rs
use crate::batch::{BatchDriver, BatchReport};
use crate::config::enrich::EnrichConfig;
use crate::enrich::provider::mock_mode;
use crate::enrich::{build_provider, ProfileEnricher, PromptTemplate};
use std::path::PathBuf;
use tracing::info;

/// Everything one batch run needs, built from config.
pub struct EnrichRuntime {
    pub cfg: EnrichConfig,
    pub driver: BatchDriver,
}

impl EnrichRuntime {
    pub fn from_config(cfg: EnrichConfig) -> anyhow::Result<Self> {
        let cfg = if mock_mode() {
            cfg
        } else {
            cfg.resolve_api_key()?
        };

        let provider = build_provider(&cfg)?;
        // Safe diagnostics: only provider + model + key length
        info!(
            "enrich cfg loaded: provider={}, model={}, web_search={}, concurrency={}, key_len={}",
            provider.name(),
            cfg.model,
            cfg.web_search,
            cfg.concurrency,
            cfg.api_key.len()
        );

        let template = PromptTemplate::new(cfg.language.clone(), cfg.country.clone());
        let enricher = ProfileEnricher::new(provider, template);
        let driver = BatchDriver::new(enricher, cfg.concurrency, cfg.separator_policy);
        Ok(Self { cfg, driver })
    }

    pub fn input_path(&self) -> &PathBuf {
        &self.cfg.input_path
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.cfg.output_path
    }

    pub async fn run(&self) -> anyhow::Result<BatchReport> {
        self.driver
            .run(&self.cfg.input_path, &self.cfg.output_path)
            .await
    }
}
