//! KnowPilot Core - Entity Types
//!
//! Data structures shared by every other crate, plus the pure (I/O free)
//! pieces of the enrichment pipeline: response parsing and group-table
//! schema building.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod config;
pub mod error;
pub mod grouping;
pub mod parse;

pub use config::{GenerationSettings, KnowPilotConfig, PromptTemplates, CONTENT_PLACEHOLDER};
pub use error::{
    ConfigError, KnowPilotError, KnowPilotResult, LlmError, ParseError, StorageError,
    ValidationError,
};
pub use grouping::{
    content_column_name, content_column_ordinal, group_table_name, partition_into_groups,
    ColumnDescriptor, ColumnKind, ContentSlot, GroupRow, GroupRowUpdate, GroupTableSchema,
    TableDescription, MAX_GROUP_SIZE, MIN_GROUP_SIZE,
};
pub use parse::{
    extract_choice_question, extract_qa, parse_knowledge_point, parse_qa, QaPair,
    KNOWLEDGE_PREFIXES,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Item identifier. Assigned by storage, increases with insertion order.
pub type ItemId = i64;

/// Group-table row identifier.
pub type RowId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Maximum length of an item's content, in characters.
pub const MAX_CONTENT_CHARS: usize = 1000;

/// Placeholder text older databases store in derived columns that were never
/// enriched. Read-side only: it is mapped to `None` and never written back.
pub const PENDING_PLACEHOLDER: &str = "To be added";

/// Map a stored derived-field value to its typed form.
///
/// Empty strings and the legacy placeholder both mean "not enriched yet".
pub fn normalize_derived(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let trimmed = v.trim();
        !trimmed.is_empty() && trimmed != PENDING_PLACEHOLDER
    })
}

// ============================================================================
// ENUMS
// ============================================================================

/// Entity type discriminator used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Item,
    GroupTable,
    GroupRow,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Item => "Question",
            EntityType::GroupTable => "Table",
            EntityType::GroupRow => "Row",
        };
        f.write_str(name)
    }
}

/// Which derived field(s) an enrichment run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentKind {
    /// Question + answer pair.
    Qa,
    /// Single knowledge point sentence.
    KnowledgePoint,
}

impl EnrichmentKind {
    /// Label used for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentKind::Qa => "qa",
            EnrichmentKind::KnowledgePoint => "knowledge_point",
        }
    }

    /// Whether a bulk run leaves already-enriched items alone by default.
    ///
    /// QA runs are idempotent; knowledge-point runs regenerate every item.
    pub fn skips_enriched_by_default(&self) -> bool {
        matches!(self, EnrichmentKind::Qa)
    }
}

impl fmt::Display for EnrichmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// One unit of study content with its derived question/answer/knowledge point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Item {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: ItemId,
    /// Free text grouping label (e.g. "Section 3 - Radar").
    pub section: Option<String>,
    /// Display-order label within the section.
    pub sequence: Option<String>,
    /// Page the content was taken from.
    pub page_name: Option<String>,
    /// Originating media, e.g. an audio file name.
    pub source_reference: Option<String>,
    pub content: String,
    pub knowledge_point: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Item {
    /// True once both question and answer have been generated.
    pub fn has_qa(&self) -> bool {
        self.question.is_some() && self.answer.is_some()
    }

    /// True once a knowledge point has been generated.
    pub fn has_knowledge_point(&self) -> bool {
        self.knowledge_point.is_some()
    }

    /// Whether this item already carries the output of `kind`.
    pub fn is_enriched(&self, kind: EnrichmentKind) -> bool {
        match kind {
            EnrichmentKind::Qa => self.has_qa(),
            EnrichmentKind::KnowledgePoint => self.has_knowledge_point(),
        }
    }
}

/// Payload for creating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewItem {
    pub content: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub page_name: Option<String>,
    #[serde(default)]
    pub source_reference: Option<String>,
    /// Pre-filled answer, used when seeding sample data.
    #[serde(default)]
    pub answer: Option<String>,
}

impl NewItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Check the content invariant: non-empty and at most
    /// [`MAX_CONTENT_CHARS`] characters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.content.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "content".to_string(),
            });
        }
        let chars = self.content.chars().count();
        if chars > MAX_CONTENT_CHARS {
            return Err(ValidationError::InvalidValue {
                field: "content".to_string(),
                reason: format!(
                    "must be at most {} characters, got {}",
                    MAX_CONTENT_CHARS, chars
                ),
            });
        }
        Ok(())
    }
}

/// Partial update of an item's derived fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUpdate {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub knowledge_point: Option<String>,
}

impl ItemUpdate {
    pub fn qa(pair: QaPair) -> Self {
        Self {
            question: Some(pair.question),
            answer: Some(pair.answer),
            knowledge_point: None,
        }
    }

    pub fn knowledge_point(point: impl Into<String>) -> Self {
        Self {
            knowledge_point: Some(point.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.question.is_none() && self.answer.is_none() && self.knowledge_point.is_none()
    }

    /// Overwrite the populated fields onto `item`.
    pub fn apply_to(&self, item: &mut Item) {
        if let Some(question) = &self.question {
            item.question = Some(question.clone());
        }
        if let Some(answer) = &self.answer {
            item.answer = Some(answer.clone());
        }
        if let Some(point) = &self.knowledge_point {
            item.knowledge_point = Some(point.clone());
        }
    }
}
