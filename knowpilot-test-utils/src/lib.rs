//! KnowPilot Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - A scripted generation provider that replays canned responses
//! - Item fixtures and a pre-seeded in-memory storage
//! - Proptest generators for item content and model responses
//! - Assertions on `KnowPilotResult`

// Re-export mock storage from its source crate
pub use knowpilot_storage::{ContentStorage, MockStorage};

// Re-export core types for convenience
pub use knowpilot_core::{
    EnrichmentKind, EntityType, Item, ItemId, KnowPilotConfig, KnowPilotError, KnowPilotResult,
    LlmError, NewItem, StorageError, Timestamp,
};
pub use knowpilot_llm::{GenerationOptions, GenerationProvider};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

/// One prompt the scripted provider received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Generation provider that answers from a queue of scripted results.
///
/// When the queue runs dry the fallback result is returned (an error unless
/// one was set with [`ScriptedGenerationProvider::with_fallback`]).
#[derive(Debug)]
pub struct ScriptedGenerationProvider {
    model_id: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Result<String, LlmError>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A `RequestFailed` error as the Ollama client would produce it.
pub fn service_error(message: &str) -> LlmError {
    LlmError::RequestFailed {
        provider: "scripted".to_string(),
        status: 500,
        message: message.to_string(),
    }
}

impl ScriptedGenerationProvider {
    pub fn new() -> Self {
        Self {
            model_id: "scripted-model".to_string(),
            script: Mutex::new(VecDeque::new()),
            fallback: Err(service_error("script exhausted")),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider replaying `responses` in order, all successful.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for response in responses {
            provider.push_ok(response);
        }
        provider
    }

    /// Result returned once the script is exhausted.
    pub fn with_fallback(mut self, fallback: Result<String, LlmError>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn push_ok(&self, response: impl Into<String>) {
        lock(&self.script).push_back(Ok(response.into()));
    }

    pub fn push_err(&self, error: LlmError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.prompt.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl Default for ScriptedGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedGenerationProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        lock(&self.calls).push(RecordedCall {
            prompt: prompt.to_string(),
            options: options.clone(),
        });
        let next = lock(&self.script).pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for KnowPilot inputs.

    use super::*;
    use proptest::prelude::*;

    /// Valid item content: non-empty, well under the length limit.
    pub fn arb_content() -> impl Strategy<Value = String> {
        prop_oneof![
            "[A-Z][a-z ]{10,80}\\.",
            "([A-Z][a-z ]{5,30}\\. ){1,4}",
            "[A-Za-z0-9 ]{1,20}",
        ]
    }

    pub fn arb_new_item() -> impl Strategy<Value = NewItem> {
        (arb_content(), proptest::option::of("Section [0-9]{1,2}")).prop_map(
            |(content, section)| NewItem {
                section,
                ..NewItem::new(content)
            },
        )
    }

    /// Well-formed QA response with optional chatter around it.
    pub fn arb_qa_response() -> impl Strategy<Value = (String, String, String)> {
        (
            "[A-Z][a-z ]{3,40}\\?",
            "[A-Z][a-z ]{3,40}\\.",
            prop_oneof![Just(String::new()), Just("Sure!\n".to_string())],
        )
            .prop_map(|(question, answer, lead)| {
                let text = format!("{lead}Question: {question}\nAnswer: {answer}");
                (text, question.trim().to_string(), answer.trim().to_string())
            })
    }

    /// Group size in the supported range.
    pub fn arb_group_size() -> impl Strategy<Value = i64> {
        knowpilot_core::MIN_GROUP_SIZE..=knowpilot_core::MAX_GROUP_SIZE
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;

    /// Study content used across tests.
    pub const WEATHER_FACTS: [&str; 5] = [
        "Cumulonimbus clouds can produce hail, lightning and heavy rain.",
        "A cold front moves faster than a warm front.",
        "Fog is a cloud whose base is at or near the ground.",
        "Wind shear is a sudden change in wind speed or direction.",
        "The dew point is the temperature at which air becomes saturated.",
    ];

    /// Storage seeded with the first `n` weather facts, ids `1..=n`.
    pub async fn seeded_storage(n: usize) -> MockStorage {
        let storage = MockStorage::new();
        for content in WEATHER_FACTS.iter().cycle().take(n) {
            storage
                .item_insert(&NewItem::new(*content).with_section("Meteorology"))
                .await
                .unwrap_or_else(|e| panic!("failed to seed storage: {e}"));
        }
        storage
    }

    /// A QA response in the expected format.
    pub fn qa_response(question: &str, answer: &str) -> String {
        format!("Question: {question}\nAnswer: {answer}")
    }

    /// Default configuration with short, recognisable templates.
    pub fn test_config() -> KnowPilotConfig {
        let mut config = KnowPilotConfig::default();
        config.prompts.qa_template = "QA<{content}>".to_string();
        config.prompts.knowledge_template = "KP<{content}>".to_string();
        config.prompts.content_group_question_template = "SC<{content}>".to_string();
        config
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on `KnowPilotResult` variants.

    use super::*;

    /// Assert that a result is a NotFound error for `entity`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &KnowPilotResult<T>, entity: EntityType) {
        match result {
            Err(KnowPilotError::NotFound { entity: found, .. }) => {
                assert_eq!(*found, entity, "Wrong entity type in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", entity, other),
        }
    }

    /// Assert that a result is a validation error.
    #[track_caller]
    pub fn assert_invalid_argument<T: std::fmt::Debug>(result: &KnowPilotResult<T>) {
        match result {
            Err(KnowPilotError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a result is a storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &KnowPilotResult<T>) {
        match result {
            Err(KnowPilotError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_provider_replays_then_falls_back() {
        let provider = ScriptedGenerationProvider::with_responses(["one"]);
        provider.push_err(service_error("down"));

        let options = GenerationOptions::default();
        assert_eq!(provider.generate("p1", &options).await.unwrap(), "one");
        assert!(provider.generate("p2", &options).await.is_err());
        assert!(provider.generate("p3", &options).await.is_err());
        assert_eq!(provider.prompts(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn test_seeded_storage_assigns_sequential_ids() {
        let storage = fixtures::seeded_storage(7).await;
        let items = storage.item_list().await.unwrap();
        assert_eq!(items.len(), 7);
        assert_eq!(items[6].id, 7);
        assert_eq!(items[5].content, fixtures::WEATHER_FACTS[0]);
    }
}
