// tests/common/mod.rs
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use ludi_enrich::enrich::{ChatPrompt, CompletionProvider};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What the scripted provider does for one artisan name.
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail(String),
    Delay(Duration, String),
    Panic,
}

/// Test double keyed by the artisan name found in the prompt. Tracks how many
/// calls are outstanding at once.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    default_reply: Arc<Mutex<Option<String>>>,
    default_delay: Arc<Mutex<Duration>>,
    pub calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    pub peak: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn replying(body: &str) -> Self {
        let p = Self::default();
        *p.default_reply.lock() = Some(body.to_string());
        p
    }

    pub fn with_delay(self, d: Duration) -> Self {
        *self.default_delay.lock() = d;
        self
    }

    pub fn script(&self, name: &str, s: Script) {
        self.scripts.lock().insert(name.to_string(), s);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn lookup(&self, prompt: &ChatPrompt) -> Option<Script> {
        let scripts = self.scripts.lock();
        scripts
            .iter()
            .find(|(name, _)| prompt.user.contains(&format!("\"{name}\"")))
            .map(|(_, s)| s.clone())
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let default_delay = *self.default_delay.lock();
        let script = self.lookup(prompt);
        let out = match script {
            Some(Script::Panic) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("provider blew up");
            }
            Some(Script::Fail(msg)) => {
                tokio::time::sleep(default_delay).await;
                Err(anyhow::anyhow!(msg))
            }
            Some(Script::Delay(d, body)) => {
                tokio::time::sleep(d).await;
                Ok(body)
            }
            Some(Script::Reply(body)) => {
                tokio::time::sleep(default_delay).await;
                Ok(body)
            }
            None => {
                tokio::time::sleep(default_delay).await;
                match self.default_reply.lock().clone() {
                    Some(b) => Ok(b),
                    None => Err(anyhow::anyhow!("no scripted reply")),
                }
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// A model answer that tries to override every CSV-owned field.
pub fn lying_profile() -> String {
    serde_json::json!({
        "artisan_profile": {
            "name": "Someone Else",
            "location": { "city": "Lisbon", "state": "LX", "country": "Portugal" },
            "contact": { "email": "fake@model.ai", "phone": "000" }
        },
        "craft_details": {
            "craft_category": "Ceramics",
            "subcategory": "Figurative clay",
            "cultural_heritage": "Alto do Moura",
            "primary_materials": ["clay"],
            "techniques_used": ["modelling"],
            "tools_used": ["spatula"],
            "product_photos": []
        }
    })
    .to_string()
}

pub fn csv_with_rows(n: usize) -> String {
    let mut s = String::from("Name,City,State,Email,Phone Number 1,Phone Number 2\n");
    for i in 0..n {
        s.push_str(&format!("Artisan {i},City {i},PE,a{i}@x.com,{i}{i}{i},\n"));
    }
    s
}
