//! KnowPilot LLM - Text Generation Providers
//!
//! Provider-agnostic trait for turning a prompt into text, plus the Ollama
//! implementation used in production.

use async_trait::async_trait;
use knowpilot_core::{GenerationSettings, LlmError};
use serde::{Deserialize, Serialize};

pub mod providers;

pub use providers::OllamaGenerationProvider;

// ============================================================================
// GENERATION OPTIONS
// ============================================================================

/// Per-call generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model name; `None` uses the provider's configured model.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

impl GenerationOptions {
    pub fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            model: None,
            temperature,
            max_output_tokens,
        }
    }

    /// Options using the configured temperature and the given token cap.
    pub fn from_settings(settings: &GenerationSettings, max_output_tokens: u32) -> Self {
        Self::new(settings.temperature, max_output_tokens)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::new(0.1, 100)
    }
}

// ============================================================================
// GENERATION PROVIDER TRAIT
// ============================================================================

/// Trait for text-generation providers.
/// Implementations must be thread-safe (Send + Sync).
///
/// # Example
/// ```ignore
/// let provider: Arc<dyn GenerationProvider> = Arc::new(
///     OllamaGenerationProvider::new("http://localhost:11434", "llama3.2"),
/// );
/// let text = provider.generate("Summarize: ...", &GenerationOptions::default()).await?;
/// ```
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate the full response text for `prompt`, trimmed.
    ///
    /// # Returns
    /// * `Ok(String)` - The assembled response
    /// * `Err(LlmError)` - Transport, status, timeout or decoding failure
    async fn generate(&self, prompt: &str, options: &GenerationOptions)
        -> Result<String, LlmError>;

    /// Name of the provider, used in logs and metrics.
    fn provider_name(&self) -> &str;

    /// Model used when the options do not name one.
    fn model_id(&self) -> &str;

    /// Check that the provider can serve its configured model.
    async fn health_check(&self) -> Result<(), LlmError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_settings() {
        let settings = GenerationSettings::default();
        let options = GenerationOptions::from_settings(&settings, 200);
        assert_eq!(options.temperature, 0.1);
        assert_eq!(options.max_output_tokens, 200);
        assert!(options.model.is_none());
    }

    #[test]
    fn test_options_with_model() {
        let options = GenerationOptions::default().with_model("mistral");
        assert_eq!(options.model.as_deref(), Some("mistral"));
    }
}
