//! Text-generation provider implementations

use knowpilot_core::LlmError;

pub mod ollama;

pub use ollama::OllamaGenerationProvider;

/// Build a [`LlmError::RequestFailed`]. Use status 0 when no response was
/// received at all.
pub(crate) fn request_failed(provider: &str, status: i32, message: impl Into<String>) -> LlmError {
    LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    }
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> LlmError {
    LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}
