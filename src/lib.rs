// src/lib.rs
// Public library surface for the CLI and integration tests.

pub mod batch;
pub mod bootstrap;
pub mod config;
pub mod enrich;
pub mod source;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::batch::{
    BatchDriver, BatchReport, ConcurrencyLimiter, OutputWriter, SeparatorPolicy,
};
pub use crate::bootstrap::EnrichRuntime;
pub use crate::config::EnrichConfig;
pub use crate::enrich::{CompletionProvider, ProfileEnricher, ProfileEntry};
pub use crate::source::{InputRecord, RowSource};
