// src/batch/mod.rs
pub mod driver;
pub mod limiter;
pub mod writer;

pub use driver::{BatchDriver, BatchReport};
pub use limiter::ConcurrencyLimiter;
pub use writer::{OutputWriter, SeparatorPolicy};
