//! Ollama generation provider implementation (local models)

use super::types::{GenerateChunk, GenerateOptions, GenerateRequest, ListModelsResponse};
use super::PROVIDER;
use crate::providers::{invalid_response, request_failed};
use crate::{GenerationOptions, GenerationProvider};
use async_trait::async_trait;
use futures_util::StreamExt;
use knowpilot_core::{GenerationSettings, LlmError};
use reqwest::Client;
use std::time::{Duration, Instant};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Ollama text-generation provider.
pub struct OllamaGenerationProvider {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaGenerationProvider {
    /// Create a new Ollama generation provider.
    ///
    /// # Arguments
    /// * `base_url` - Ollama server URL (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "llama3.2", "mistral")
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a provider from the configured endpoint, model and timeout.
    pub fn from_settings(settings: &GenerationSettings) -> Self {
        Self::new(settings.endpoint.clone(), settings.model.clone()).with_timeout(settings.timeout())
    }

    /// Bound on the whole call, from connect to the last streamed fragment.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check if the configured model is available on the server.
    pub async fn check_model_available(&self) -> Result<bool, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = tokio::time::timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| {
                request_failed(PROVIDER, 0, format!("Failed to connect to Ollama: {}", e))
            })?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let list: ListModelsResponse = response.json().await.map_err(|e| {
            invalid_response(PROVIDER, format!("Failed to parse models list: {}", e))
        })?;

        Ok(list.models.iter().any(|m| m.name.contains(&self.model)))
    }

    fn timeout_error(&self) -> LlmError {
        LlmError::Timeout {
            provider: PROVIDER.to_string(),
            timeout: self.timeout,
        }
    }

    async fn stream_generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: options.model.clone().unwrap_or_else(|| self.model.clone()),
            prompt: prompt.to_string(),
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
            stream: true,
            options: GenerateOptions {
                temperature: options.temperature,
                num_predict: options.max_output_tokens,
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_failed(PROVIDER, 0, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(request_failed(PROVIDER, status.as_u16() as i32, error_text));
        }

        let mut stream = response.bytes_stream();
        let mut accumulator = StreamAccumulator::default();
        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| {
                request_failed(
                    PROVIDER,
                    status.as_u16() as i32,
                    format!("Failed to read response stream: {}", e),
                )
            })?;
            if accumulator.push_chunk(&bytes)? {
                break;
            }
        }

        accumulator.finish()
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerationProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.stream_generate(prompt, options))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(self.timeout_error()),
        };

        match &result {
            Ok(text) => tracing::debug!(
                provider = PROVIDER,
                model = %self.model,
                elapsed_ms = started.elapsed().as_millis() as u64,
                response_chars = text.chars().count(),
                "Generation completed"
            ),
            Err(e) => tracing::warn!(
                provider = PROVIDER,
                model = %self.model,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Generation failed"
            ),
        }

        result
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.check_model_available().await? {
            Ok(())
        } else {
            Err(LlmError::ModelUnavailable {
                provider: PROVIDER.to_string(),
                model: self.model.clone(),
            })
        }
    }
}

impl std::fmt::Debug for OllamaGenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaGenerationProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// STREAM DECODING
// ============================================================================

/// Reassembles a newline-delimited JSON generate stream.
///
/// Bytes are buffered until a full line is available, so fragments split
/// across network chunks (including inside a UTF-8 sequence) decode fine.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buffer: Vec<u8>,
    text: String,
    done: bool,
}

impl StreamAccumulator {
    /// Feed one network chunk. Returns `true` once the final fragment has
    /// been seen; later input is ignored.
    pub fn push_chunk(&mut self, bytes: &[u8]) -> Result<bool, LlmError> {
        if self.done {
            return Ok(true);
        }
        self.buffer.extend_from_slice(bytes);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.process_line(&line)?;
            if self.done {
                self.buffer.clear();
                break;
            }
        }

        Ok(self.done)
    }

    /// Process any trailing unterminated line and return the trimmed text.
    pub fn finish(mut self) -> Result<String, LlmError> {
        if !self.done && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.process_line(&rest)?;
        }
        Ok(self.text.trim().to_string())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn process_line(&mut self, line: &[u8]) -> Result<(), LlmError> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(());
        }

        let chunk: GenerateChunk = serde_json::from_slice(line).map_err(|e| {
            invalid_response(PROVIDER, format!("Malformed stream fragment: {}", e))
        })?;

        if let Some(error) = chunk.error {
            return Err(invalid_response(PROVIDER, error));
        }

        self.text.push_str(&chunk.response);
        if chunk.done {
            self.done = true;
        }
        Ok(())
    }
}
