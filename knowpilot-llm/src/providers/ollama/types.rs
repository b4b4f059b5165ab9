//! Ollama API request and response types

use serde::{Deserialize, Serialize};

// ============================================================================
// GENERATE TYPES
// ============================================================================

/// Body of `POST /api/generate`.
///
/// `temperature` and `max_tokens` are sent at the top level as well as in
/// `options`; older Ollama builds only read the former.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// One newline-delimited fragment of a streamed generate response.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    /// Set by Ollama when generation failed mid-stream.
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// MODEL TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListModelsResponse {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}
