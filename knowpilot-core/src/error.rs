//! Error types for KnowPilot operations

use crate::EntityType;
use std::time::Duration;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed {
        entity_type: EntityType,
        reason: String,
    },

    #[error("Update failed for {entity_type:?} with id {id}: {reason}")]
    UpdateFailed {
        entity_type: EntityType,
        id: String,
        reason: String,
    },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Schema operation on {table} failed: {reason}")]
    SchemaFailed { table: String, reason: String },

    #[error("Storage backend unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Text-generation provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Request to {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Model {model} is not available on {provider}")]
    ModelUnavailable { provider: String, model: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// Errors turning generated text into typed fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Could not extract {fields:?} from generated text")]
    MissingFields { fields: Vec<&'static str> },

    #[error("Generated {field} was empty")]
    EmptyOutput { field: &'static str },
}

/// Master error type for all KnowPilot errors.
#[derive(Debug, Clone, Error)]
pub enum KnowPilotError {
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: EntityType, id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation service error: {0}")]
    Llm(#[from] LlmError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Enrichment failed: {0}")]
    Parse(#[from] ParseError),
}

impl KnowPilotError {
    pub fn not_found(entity: EntityType, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type alias for KnowPilot operations.
pub type KnowPilotResult<T> = Result<T, KnowPilotError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_uses_entity_label() {
        let err = KnowPilotError::not_found(EntityType::Item, 42);
        assert_eq!(err.to_string(), "Question with ID 42 not found");

        let err = KnowPilotError::not_found(EntityType::GroupTable, "content_group_3");
        assert!(err.to_string().contains("content_group_3"));
    }

    #[test]
    fn test_llm_error_display_timeout() {
        let err = LlmError::Timeout {
            provider: "ollama".to_string(),
            timeout: Duration::from_secs(60),
        };
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("ollama"));
        assert!(msg.contains("60s"));
    }

    #[test]
    fn test_validation_error_display_out_of_range() {
        let err = ValidationError::OutOfRange {
            field: "k".to_string(),
            value: 21,
            min: 1,
            max: 20,
        };
        assert_eq!(err.to_string(), "k must be between 1 and 20, got 21");
    }

    #[test]
    fn test_parse_error_display_missing_fields() {
        let err = ParseError::MissingFields {
            fields: vec!["question", "answer"],
        };
        let msg = err.to_string();
        assert!(msg.contains("question"));
        assert!(msg.contains("answer"));
    }

    #[test]
    fn test_knowpilot_error_from_variants() {
        let storage = KnowPilotError::from(StorageError::LockPoisoned);
        assert!(matches!(storage, KnowPilotError::Storage(_)));

        let llm = KnowPilotError::from(LlmError::InvalidResponse {
            provider: "ollama".to_string(),
            reason: "bad json".to_string(),
        });
        assert!(matches!(llm, KnowPilotError::Llm(_)));

        let validation = KnowPilotError::from(ValidationError::RequiredFieldMissing {
            field: "content".to_string(),
        });
        assert!(matches!(validation, KnowPilotError::Validation(_)));

        let config = KnowPilotError::from(ConfigError::MissingRequired {
            field: "prompts.qa_template".to_string(),
        });
        assert!(matches!(config, KnowPilotError::Config(_)));

        let parse = KnowPilotError::from(ParseError::EmptyOutput {
            field: "knowledge_point",
        });
        assert!(matches!(parse, KnowPilotError::Parse(_)));
    }
}
