//! Service Layer
//!
//! Business logic behind the HTTP handlers. Services talk to storage and the
//! generation provider through their traits and return core results; the
//! route layer turns those into API errors.

mod enrichment;
mod grouping;

pub use enrichment::*;
pub use grouping::*;

use knowpilot_core::LlmError;
use knowpilot_llm::{GenerationOptions, GenerationProvider};
use std::time::Instant;

use crate::telemetry::with_metrics;

/// Call the provider and record latency and outcome.
pub(crate) async fn generate_recorded(
    provider: &dyn GenerationProvider,
    prompt: &str,
    options: &GenerationOptions,
) -> Result<String, LlmError> {
    let start = Instant::now();
    let result = provider.generate(prompt, options).await;
    let elapsed = start.elapsed();

    with_metrics(|m| {
        m.record_generation(provider.provider_name(), result.is_ok(), elapsed.as_secs_f64())
    });

    match &result {
        Ok(text) => tracing::debug!(
            provider = provider.provider_name(),
            duration_ms = elapsed.as_millis() as u64,
            response_chars = text.chars().count(),
            "Generation call succeeded"
        ),
        Err(e) => tracing::warn!(
            provider = provider.provider_name(),
            duration_ms = elapsed.as_millis() as u64,
            error = %e,
            "Generation call failed"
        ),
    }
    result
}
