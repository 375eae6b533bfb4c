//! Completion providers: the remote chat-completion call behind a trait, so the
//! batch can run against a scripted double in tests or `ENRICH_TEST_MODE=mock`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::prompt::ChatPrompt;
use crate::config::enrich::EnrichConfig;

/// One request in, the raw assistant text out. Implementations must not retry.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn CompletionProvider>;

/// True when `ENRICH_TEST_MODE=mock`: no network, no API key needed.
pub fn mock_mode() -> bool {
    std::env::var("ENRICH_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
}

/// Factory: mock mode wins, otherwise the OpenAI provider.
pub fn build_provider(config: &EnrichConfig) -> Result<DynProvider> {
    if mock_mode() {
        return Ok(Arc::new(MockProvider::default()));
    }
    Ok(Arc::new(OpenAiProvider::from_config(config)?))
}

// ------------------------------------------------------------
// OpenAI Chat Completions
// ------------------------------------------------------------

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    web_search: bool,
}

impl OpenAiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("missing OpenAI API key (set OPENAI_API_KEY)");
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("ludi-enrich/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self {
            http,
            api_key,
            api_base: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            web_search: true,
        })
    }

    pub fn from_config(cfg: &EnrichConfig) -> Result<Self> {
        Ok(Self::new(
            cfg.api_key.clone(),
            cfg.model.clone(),
            Duration::from_secs(cfg.request_timeout_secs),
        )?
        .with_api_base(cfg.api_base.clone())
        .with_web_search(cfg.web_search))
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    fn request_body<'a>(&'a self, prompt: &'a ChatPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &prompt.system,
                },
                Msg {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            web_search_options: self.web_search.then(WebSearchOptions::default),
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize, Default)]
struct WebSearchOptions {}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_search_options: Option<WebSearchOptions>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .context("chat completion request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(anyhow!("chat completion HTTP {status}: {snippet}"));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .context("unreadable chat completion body")?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| anyhow!("chat completion returned no content"))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Returns a fixed body for every prompt; used for local dry runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        let body = serde_json::json!({
            "artisan_profile": {},
            "craft_details": {
                "craft_category": "Handicraft (mock)",
                "subcategory": null,
                "cultural_heritage": null,
                "primary_materials": [],
                "techniques_used": [],
                "tools_used": [],
                "product_photos": []
            }
        });
        Self {
            fixed: body.to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, _prompt: &ChatPrompt) -> Result<String> {
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
