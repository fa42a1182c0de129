//! sqlgate - A safety gate and bounded executor for LLM-generated SQL.
//!
//! Turns natural-language prompts into SQL through a fixed pipeline:
//! the model's output is normalized, checked against a safety policy,
//! stamped with a row ceiling, and optionally executed under a hard row
//! cap and statement timeout. Unsafe statements are rejected, never
//! repaired.

pub mod config;
pub mod db;
pub mod error;
pub mod limit;
pub mod llm;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod safety;

pub use error::{Error, Result};
pub use pipeline::{GeneratedSql, QueryResponse, Text2SqlService};
