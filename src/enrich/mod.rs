// src/enrich/mod.rs
//! Profile enrichment: prompt → provider → strict parse → CSV overlay.

pub mod enricher;
pub mod profile;
pub mod prompt;
pub mod provider;
pub mod response;

pub use enricher::ProfileEnricher;
pub use profile::{apply_overlay, ArtisanProfile, ProfileEntry};
pub use prompt::{ChatPrompt, PromptBuilder, PromptTemplate};
pub use provider::{build_provider, CompletionProvider, DynProvider, MockProvider, OpenAiProvider};
pub use response::{parse_profile_json, strip_code_fence};
