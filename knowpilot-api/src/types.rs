//! API Request and Response Types
//!
//! Response bodies keep the field names existing KnowPilot clients read
//! (`updated_question`, `total_questions`, `processed_rows`, ...).

use knowpilot_core::{Item, ItemId, RowId};
use serde::{Deserialize, Serialize};

// ============================================================================
// ITEM ENRICHMENT
// ============================================================================

/// Result of enriching one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EnrichSingleResponse {
    /// Always `"success"`
    pub status: String,
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub question_id: ItemId,
    /// The item after the write
    pub updated_question: Item,
    /// Present for knowledge-point runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_point: Option<String>,
}

impl EnrichSingleResponse {
    pub fn new(item: Item) -> Self {
        Self {
            status: "success".to_string(),
            question_id: item.id,
            updated_question: item,
            knowledge_point: None,
        }
    }

    pub fn with_knowledge_point(item: Item) -> Self {
        let knowledge_point = item.knowledge_point.clone();
        Self {
            knowledge_point,
            ..Self::new(item)
        }
    }
}

/// One item a bulk run could not enrich.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemFailure {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: ItemId,
    pub error: String,
    /// Raw generated text, kept when it could not be parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

/// Outcome of a bulk enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkResult {
    /// Items visited
    pub total: usize,
    pub updated_count: usize,
    /// Items left alone because they were already enriched
    pub skipped_count: usize,
    pub failures: Vec<ItemFailure>,
}

/// Query parameters accepted by the bulk knowledge endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct BulkOptionsQuery {
    /// Leave items that already have a knowledge point untouched
    #[serde(default)]
    pub skip_existing: Option<bool>,
}

/// Response body of the bulk endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BulkEnrichResponse {
    /// Always `"complete"`
    pub status: String,
    pub total_questions: usize,
    pub updated_count: usize,
    /// Same value as `updated_count`
    pub success_count: usize,
    pub skipped_count: usize,
    /// `null` when every visited item succeeded
    pub failures: Option<Vec<ItemFailure>>,
}

impl From<BulkResult> for BulkEnrichResponse {
    fn from(result: BulkResult) -> Self {
        Self {
            status: "complete".to_string(),
            total_questions: result.total,
            updated_count: result.updated_count,
            success_count: result.updated_count,
            skipped_count: result.skipped_count,
            failures: if result.failures.is_empty() {
                None
            } else {
                Some(result.failures)
            },
        }
    }
}

// ============================================================================
// KNOWLEDGE
// ============================================================================

/// Knowledge view of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct KnowledgeEntry {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub id: ItemId,
    pub content: String,
    pub knowledge_point: Option<String>,
}

impl From<Item> for KnowledgeEntry {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            content: item.content,
            knowledge_point: item.knowledge_point,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClearKnowledgeResponse {
    pub status: String,
    /// Items that had a knowledge point before the reset
    pub cleared_count: u64,
}

// ============================================================================
// GROUPING PREVIEW
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct GroupPreviewQuery {
    /// Items per group
    pub num: i64,
}

/// One preview group; `group_id` starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FactGroup {
    pub group_id: usize,
    pub facts: Vec<Item>,
}

// ============================================================================
// CONTENT GROUP TABLES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct GroupSizeQuery {
    /// Content columns per row, 1 to 20
    pub k: i64,
}

/// Whether a table operation changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Created,
    NotModified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTableResponse {
    pub status: TableStatus,
    pub message: String,
    pub table_name: String,
    /// Column names in table order
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FillTableResponse {
    pub status: TableStatus,
    pub message: String,
    pub table_name: String,
    pub groups_inserted: u64,
    /// Items copied into the table
    pub items_consumed: usize,
    pub total_items: usize,
}

/// Per-row outcome of question generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProcessedRow {
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub row_id: RowId,
    pub status: RowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Why a row was skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Why a row failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessedRow {
    pub fn success(row_id: RowId, question: String, correct_answer: String) -> Self {
        Self {
            row_id,
            status: RowStatus::Success,
            question: Some(question),
            correct_answer: Some(correct_answer),
            reason: None,
            error: None,
        }
    }

    pub fn skipped(row_id: RowId, reason: impl Into<String>) -> Self {
        Self {
            row_id,
            status: RowStatus::Skipped,
            question: None,
            correct_answer: None,
            reason: Some(reason.into()),
            error: None,
        }
    }

    pub fn failed(row_id: RowId, error: impl Into<String>) -> Self {
        Self {
            row_id,
            status: RowStatus::Failed,
            question: None,
            correct_answer: None,
            reason: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GenerateQuestionsResponse {
    /// Always `"completed"`
    pub status: String,
    pub table: String,
    pub total_rows: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub skipped_count: usize,
    pub processed_rows: Vec<ProcessedRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SingleQuestionResponse {
    pub status: String,
    pub table: String,
    #[cfg_attr(feature = "openapi", schema(value_type = i64))]
    pub row_id: RowId,
    pub question: String,
    /// Ordinal of the content column the question was written for
    pub correct_answer: String,
}
