//! Ollama provider implementation (local models)
//!
//! Streaming text generation against `/api/generate`.

pub mod generate;
pub mod types;

pub use generate::{OllamaGenerationProvider, StreamAccumulator};

pub(crate) const PROVIDER: &str = "ollama";
