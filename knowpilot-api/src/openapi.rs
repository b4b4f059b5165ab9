//! OpenAPI Specification for the KnowPilot API
//!
//! Built by utoipa from the route annotations and DTO schemas.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{ComponentHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{content, content_group, health, knowledge, qa};
use crate::types::*;

use knowpilot_core::{EnrichmentKind, EntityType, Item, NewItem};

/// OpenAPI document for the KnowPilot API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "KnowPilot API",
        version = "0.3.0",
        description = "Study-content enrichment: question/answer and knowledge-point generation, content grouping and single-choice quizzes",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local Development")
    ),
    tags(
        (name = "Content", description = "Study items"),
        (name = "QA", description = "Question and answer generation"),
        (name = "Knowledge", description = "Knowledge point generation"),
        (name = "Content Group", description = "Grouped content tables and single-choice questions"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        // === Content Routes ===
        content::list_contents,
        content::create_content,
        content::get_content,
        content::grouped_facts,

        // === QA Routes ===
        qa::generate_qa_single,
        qa::generate_qa_all,

        // === Knowledge Routes ===
        knowledge::generate_knowledge_single,
        knowledge::generate_knowledge_all,
        knowledge::list_knowledge,
        knowledge::clear_knowledge,

        // === Content Group Routes ===
        content_group::create_table,
        content_group::create_and_fill_table,
        content_group::generate_questions_for_all,
        content_group::generate_single_choice_question,
        content_group::get_data,

        // === Health & Metrics ===
        health::ping,
        health::liveness,
        health::readiness,
        crate::telemetry::metrics::metrics_handler,
    ),
    components(
        schemas(
            // === Error Types ===
            ApiError, ErrorCode,

            // === Item Types ===
            Item, NewItem, EntityType, EnrichmentKind,
            EnrichSingleResponse, ItemFailure, BulkResult, BulkEnrichResponse,
            KnowledgeEntry, ClearKnowledgeResponse, FactGroup,

            // === Content Group Types ===
            TableStatus, CreateTableResponse, FillTableResponse, RowStatus, ProcessedRow,
            GenerateQuestionsResponse, SingleQuestionResponse,

            // === Health Types ===
            HealthResponse, HealthStatus, HealthDetails, ComponentHealth
        )
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        let openapi = Self::openapi();
        serde_json::to_string_pretty(&openapi)
    }

    /// Generate OpenAPI spec as YAML string.
    pub fn to_yaml() -> Result<String, String> {
        let openapi = Self::openapi();
        serde_yaml::to_string(&openapi).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() -> Result<(), String> {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "KnowPilot API");

        let tags = openapi
            .tags
            .as_ref()
            .ok_or_else(|| "OpenAPI tags missing".to_string())?;
        assert_eq!(tags.len(), 6);

        let components = openapi
            .components
            .as_ref()
            .ok_or_else(|| "OpenAPI components missing".to_string())?;
        assert!(components.schemas.contains_key("BulkEnrichResponse"));
        assert!(components.schemas.contains_key("ApiError"));
        Ok(())
    }

    #[test]
    fn test_openapi_json_serialization() -> Result<(), String> {
        let json = ApiDoc::to_json().map_err(|e| format!("Failed to serialize OpenAPI: {}", e))?;
        serde_json::from_str::<serde_json::Value>(&json)
            .map_err(|e| format!("Generated JSON invalid: {}", e))?;
        assert!(json.contains("KnowPilot API"));
        Ok(())
    }

    #[test]
    fn test_openapi_paths_exist() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        assert!(paths.contains_key("/all_contents"));
        assert!(paths.contains_key("/generate-qa-single/{id}"));
        assert!(paths.contains_key("/knowledge/clear-all"));
        assert!(paths.contains_key("/content-group/get-data/{k}"));
        assert!(paths.contains_key("/health/ready"));
        assert!(paths.contains_key("/metrics"));
    }

    #[test]
    fn test_openapi_yaml() -> Result<(), String> {
        let yaml = ApiDoc::to_yaml()?;
        assert!(yaml.contains("KnowPilot API"));
        Ok(())
    }
}
