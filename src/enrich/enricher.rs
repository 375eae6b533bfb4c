// src/enrich/enricher.rs
use std::time::Instant;

use metrics::histogram;
use tracing::{debug, warn};

use super::profile::{apply_overlay, ProfileEntry};
use super::prompt::{PromptBuilder, PromptTemplate};
use super::provider::DynProvider;
use super::response::parse_profile_json;
use crate::source::InputRecord;

/// Turns one `InputRecord` into one `ProfileEntry` with a single provider call.
#[derive(Clone)]
pub struct ProfileEnricher {
    provider: DynProvider,
    prompts: PromptBuilder,
}

impl ProfileEnricher {
    pub fn new(provider: DynProvider, template: PromptTemplate) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::new(template),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Ask the model and parse its answer. Never fails: a provider error
    /// becomes `{name, error}`, an unparseable answer `{name, raw_response}`.
    pub async fn generate(&self, record: &InputRecord) -> ProfileEntry {
        let name = record.name().unwrap_or_default().to_string();
        let prompt = self.prompts.build(record);

        let t0 = Instant::now();
        let out = self.provider.complete(&prompt).await;
        histogram!("enrich_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let text = match out {
            Ok(t) => t,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(artisan = %name, provider = self.provider.name(), %error, "completion failed");
                return ProfileEntry::Failed { name, error };
            }
        };
        debug!(provider = self.provider.name(), bytes = text.len(), "completion received");

        match parse_profile_json(&text) {
            Ok(v) => ProfileEntry::Full(v),
            Err(e) => {
                let raw_response = format!("{e:#}");
                warn!(artisan = %name, error = %raw_response, "failed to parse JSON profile");
                ProfileEntry::RawResponse { name, raw_response }
            }
        }
    }

    /// `generate` followed by the identity/contact overlay.
    pub async fn enrich(&self, record: &InputRecord) -> ProfileEntry {
        match self.generate(record).await {
            ProfileEntry::Full(v) => {
                ProfileEntry::Full(apply_overlay(v, record, &self.prompts.template().country))
            }
            degraded => degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use crate::enrich::prompt::ChatPrompt;
    use crate::enrich::provider::CompletionProvider;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Fixed(&'static str);

    #[async_trait]
    impl CompletionProvider for Fixed {
        async fn complete(&self, _p: &ChatPrompt) -> Result<String> {
            Ok(self.0.to_string())
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Down;

    #[async_trait]
    impl CompletionProvider for Down {
        async fn complete(&self, _p: &ChatPrompt) -> Result<String> {
            anyhow::bail!("connection refused")
        }
        fn name(&self) -> &'static str {
            "down"
        }
    }

    fn rec() -> InputRecord {
        InputRecord::from_pairs([("Name", "Maria"), ("City", "Recife")])
    }

    #[tokio::test]
    async fn fenced_answer_is_parsed_and_overlaid() {
        let e = ProfileEnricher::new(
            Arc::new(Fixed("```json\n{\"artisan_profile\":{\"name\":\"X\"}}\n```")),
            PromptTemplate::default(),
        );
        match e.enrich(&rec()).await {
            ProfileEntry::Full(v) => {
                assert_eq!(v["artisan_profile"]["name"], "Maria");
                assert_eq!(v["artisan_profile"]["location"]["country"], "Brazil");
            }
            other => panic!("expected full profile, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_becomes_raw_response() {
        let e = ProfileEnricher::new(Arc::new(Fixed("I cannot help")), PromptTemplate::default());
        match e.enrich(&rec()).await {
            ProfileEntry::RawResponse { name, raw_response } => {
                assert_eq!(name, "Maria");
                assert!(raw_response.contains("not valid JSON"));
            }
            other => panic!("expected raw_response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn degraded_entries_carry_no_overlay() {
        let e = ProfileEnricher::new(Arc::new(Fixed("not json")), PromptTemplate::default());
        let v = serde_json::to_value(e.enrich(&rec()).await).unwrap();
        let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["name", "raw_response"]);
    }

    #[tokio::test]
    async fn transport_error_becomes_error_entry() {
        let e = ProfileEnricher::new(Arc::new(Down), PromptTemplate::default());
        match e.enrich(&rec()).await {
            ProfileEntry::Failed { name, error } => {
                assert_eq!(name, "Maria");
                assert!(error.contains("connection refused"));
            }
            other => panic!("expected error entry, got {other:?}"),
        }
    }
}
