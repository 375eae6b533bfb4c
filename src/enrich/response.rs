// src/enrich/response.rs
//! Strict two-stage parse of free-form model output: strip an optional code
//! fence, then parse the remainder as JSON or fail.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;

fn fence_open() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n?").expect("valid fence regex"))
}

/// Remove a surrounding ``` fence (with optional language tag) if present.
pub fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    if !t.starts_with("```") {
        return t;
    }
    let body = match fence_open().find(t) {
        Some(m) => &t[m.end()..],
        None => t,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_profile_json(text: &str) -> Result<Value> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).context("model response is not valid JSON")
}
