// src/config/enrich.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::batch::SeparatorPolicy;

pub const ENV_CONFIG_PATH: &str = "ENRICH_CONFIG_PATH";
pub const ENV_INPUT_PATH: &str = "ENRICH_INPUT_PATH";
pub const ENV_OUTPUT_PATH: &str = "ENRICH_OUTPUT_PATH";
pub const ENV_MODEL: &str = "ENRICH_MODEL";
pub const ENV_CONCURRENCY: &str = "ENRICH_CONCURRENCY";

fn default_input_path() -> PathBuf {
    PathBuf::from("data/INDIVIDUAL_PE.csv")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("output.json")
}
fn default_model() -> String {
    "gpt-4o-search-preview".to_string()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_true() -> bool {
    true
}
fn default_concurrency() -> usize {
    5
}
fn default_country() -> String {
    "Brazil".to_string()
}
fn default_language() -> String {
    "English".to_string()
}
fn default_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_true")]
    pub web_search: bool,
    /// Max in-flight completion requests.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Country stamped on every profile.
    #[serde(default = "default_country")]
    pub country: String,
    /// Language the model must answer in.
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub separator_policy: SeparatorPolicy,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_path: default_output_path(),
            model: default_model(),
            api_base: default_api_base(),
            api_key: default_api_key(),
            web_search: true,
            concurrency: default_concurrency(),
            country: default_country(),
            language: default_language(),
            request_timeout_secs: default_timeout(),
            separator_policy: SeparatorPolicy::default(),
        }
    }
}

impl EnrichConfig {
    /// Load from an explicit path. Supports TOML or JSON (by extension).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading enrich config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: EnrichConfig = if ext == "toml" {
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        } else {
            serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
        };
        Ok(cfg.sanitized())
    }

    /// Lookup order:
    /// 1) $ENRICH_CONFIG_PATH (must exist)
    /// 2) config/enrich.toml
    /// 3) config/enrich.json
    /// 4) built-in defaults
    ///
    /// Env overrides are applied on top in every case.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            Self::load_from_file(&pb)?
        } else if Path::new("config/enrich.toml").exists() {
            Self::load_from_file("config/enrich.toml")?
        } else if Path::new("config/enrich.json").exists() {
            Self::load_from_file("config/enrich.json")?
        } else {
            Self::default()
        };
        base.with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(v) = env::var(ENV_INPUT_PATH) {
            self.input_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_OUTPUT_PATH) {
            self.output_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var(ENV_MODEL) {
            if !v.trim().is_empty() {
                self.model = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var(ENV_CONCURRENCY) {
            self.concurrency = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("{ENV_CONCURRENCY} must be a positive integer, got {v:?}"))?;
        }
        Ok(self.sanitized())
    }

    /// Resolve `api_key = "ENV"` against OPENAI_API_KEY.
    pub fn resolve_api_key(mut self) -> Result<Self> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow!("Missing OPENAI_API_KEY env var"))?;
        }
        Ok(self)
    }

    fn sanitized(mut self) -> Self {
        if self.concurrency == 0 {
            self.concurrency = default_concurrency();
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_timeout();
        }
        self
    }
}
