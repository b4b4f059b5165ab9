//! Prompt templates and generation settings.
//!
//! Loaded once at startup by the binary and handed to the services
//! explicitly; nothing in here reads the environment or the filesystem.

use crate::{ConfigError, EnrichmentKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Token every prompt template must contain; replaced by the item content.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

const DEFAULT_QA_TEMPLATE: &str = "Read the following study content and write one exam question about it \
together with its answer.\n\
Respond exactly in this format:\n\
Question: <question>\n\
Answer: <answer>\n\n\
Content: {content}";

const DEFAULT_KNOWLEDGE_TEMPLATE: &str = "Summarize the key knowledge point of the following study content \
in one short sentence. Reply with the sentence only.\n\n\
Content: {content}";

const DEFAULT_CHOICE_QUESTION_TEMPLATE: &str = "Create a single-choice question based on this content: \"{content}\"\n\n\
The question should test the understanding of this specific content.\n\n\
Format your response exactly as follows:\n\
Question: [your question here]";

/// Prompt templates, one per generation task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub qa_template: String,
    pub knowledge_template: String,
    pub content_group_question_template: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            qa_template: DEFAULT_QA_TEMPLATE.to_string(),
            knowledge_template: DEFAULT_KNOWLEDGE_TEMPLATE.to_string(),
            content_group_question_template: DEFAULT_CHOICE_QUESTION_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Template used for an enrichment kind.
    pub fn for_kind(&self, kind: EnrichmentKind) -> &str {
        match kind {
            EnrichmentKind::Qa => &self.qa_template,
            EnrichmentKind::KnowledgePoint => &self.knowledge_template,
        }
    }

    /// Substitute `content` into `template`.
    pub fn render(template: &str, content: &str) -> String {
        template.replace(CONTENT_PLACEHOLDER, content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, template) in [
            ("prompts.qa_template", &self.qa_template),
            ("prompts.knowledge_template", &self.knowledge_template),
            (
                "prompts.content_group_question_template",
                &self.content_group_question_template,
            ),
        ] {
            if template.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    field: field.to_string(),
                });
            }
            if !template.contains(CONTENT_PLACEHOLDER) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: truncate_for_display(template),
                    reason: format!("template must contain {}", CONTENT_PLACEHOLDER),
                });
            }
        }
        Ok(())
    }
}

/// Settings for calls to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of the Ollama server.
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub qa_max_tokens: u32,
    pub knowledge_max_tokens: u32,
    pub choice_question_max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.1,
            qa_max_tokens: 200,
            knowledge_max_tokens: 100,
            choice_question_max_tokens: 200,
            timeout_secs: 60,
        }
    }
}

impl GenerationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_tokens_for(&self, kind: EnrichmentKind) -> u32 {
        match kind {
            EnrichmentKind::Qa => self.qa_max_tokens,
            EnrichmentKind::KnowledgePoint => self.knowledge_max_tokens,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "generation.endpoint".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "generation.model".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "generation.temperature".to_string(),
                value: self.temperature.to_string(),
                reason: "must be between 0.0 and 2.0".to_string(),
            });
        }
        for (field, value) in [
            ("generation.qa_max_tokens", self.qa_max_tokens),
            ("generation.knowledge_max_tokens", self.knowledge_max_tokens),
            (
                "generation.choice_question_max_tokens",
                self.choice_question_max_tokens,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "must be positive".to_string(),
                });
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "generation.timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Application-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowPilotConfig {
    #[serde(default)]
    pub prompts: PromptTemplates,
    #[serde(default)]
    pub generation: GenerationSettings,
}

impl KnowPilotConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prompts.validate()?;
        self.generation.validate()
    }
}

fn truncate_for_display(value: &str) -> String {
    const MAX: usize = 40;
    if value.chars().count() <= MAX {
        value.to_string()
    } else {
        let head: String = value.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
