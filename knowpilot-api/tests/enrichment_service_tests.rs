//! Enrichment service tests against in-memory storage and a scripted model.

use std::sync::Arc;

use knowpilot_api::{BulkOptions, EnrichmentService};
use knowpilot_core::{EnrichmentKind, EntityType, KnowPilotError, NewItem, MAX_CONTENT_CHARS};
use knowpilot_test_utils::assertions::{
    assert_invalid_argument, assert_not_found, assert_storage_error,
};
use knowpilot_test_utils::fixtures::{qa_response, seeded_storage, test_config, WEATHER_FACTS};
use knowpilot_test_utils::{service_error, ContentStorage, MockStorage, ScriptedGenerationProvider};

fn service(storage: &MockStorage, provider: &Arc<ScriptedGenerationProvider>) -> EnrichmentService {
    EnrichmentService::new(
        Arc::new(storage.clone()),
        provider.clone(),
        Arc::new(test_config()),
    )
}

// ============================================================================
// SINGLE ITEM
// ============================================================================

#[tokio::test]
async fn test_enrich_one_qa_writes_both_fields() {
    let storage = seeded_storage(1).await;
    let provider = Arc::new(ScriptedGenerationProvider::with_responses([qa_response(
        "What can cumulonimbus clouds produce?",
        "Hail, lightning and heavy rain.",
    )]));

    let item = service(&storage, &provider)
        .enrich_one(1, EnrichmentKind::Qa)
        .await
        .unwrap();

    assert_eq!(
        item.question.as_deref(),
        Some("What can cumulonimbus clouds produce?")
    );
    assert_eq!(item.answer.as_deref(), Some("Hail, lightning and heavy rain."));

    let stored = storage.item_get(1).await.unwrap().unwrap();
    assert_eq!(stored, item);

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, format!("QA<{}>", WEATHER_FACTS[0]));
    assert_eq!(calls[0].options.max_output_tokens, 200);
    assert_eq!(calls[0].options.temperature, 0.1);
}

#[tokio::test]
async fn test_enrich_one_knowledge_point_strips_prefix() {
    let storage = seeded_storage(2).await;
    let provider = Arc::new(ScriptedGenerationProvider::with_responses([
        "The key knowledge point is cold fronts move faster than warm fronts.",
    ]));

    let item = service(&storage, &provider)
        .enrich_one(2, EnrichmentKind::KnowledgePoint)
        .await
        .unwrap();

    assert_eq!(
        item.knowledge_point.as_deref(),
        Some("Cold fronts move faster than warm fronts.")
    );
    assert!(item.question.is_none());
    assert_eq!(provider.calls()[0].options.max_output_tokens, 100);
    assert_eq!(provider.prompts()[0], format!("KP<{}>", WEATHER_FACTS[1]));
}

#[tokio::test]
async fn test_enrich_one_missing_item() {
    let storage = seeded_storage(1).await;
    let provider = Arc::new(ScriptedGenerationProvider::new());

    let result = service(&storage, &provider)
        .enrich_one(42, EnrichmentKind::Qa)
        .await;

    assert_not_found(&result, EntityType::Item);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_enrich_one_unparseable_response_writes_nothing() {
    let storage = seeded_storage(1).await;
    let provider = Arc::new(ScriptedGenerationProvider::with_responses([
        "I am not sure what you mean.",
    ]));

    let result = service(&storage, &provider)
        .enrich_one(1, EnrichmentKind::Qa)
        .await;

    assert!(matches!(result, Err(KnowPilotError::Parse(_))));
    let stored = storage.item_get(1).await.unwrap().unwrap();
    assert!(stored.question.is_none());
    assert!(stored.answer.is_none());
}

#[tokio::test]
async fn test_enrich_one_empty_knowledge_point_is_a_parse_failure() {
    let storage = seeded_storage(1).await;
    let provider = Arc::new(ScriptedGenerationProvider::with_responses(["   \n  "]));

    let result = service(&storage, &provider)
        .enrich_one(1, EnrichmentKind::KnowledgePoint)
        .await;

    assert!(matches!(result, Err(KnowPilotError::Parse(_))));
}

#[tokio::test]
async fn test_enrich_one_generation_error_propagates() {
    let storage = seeded_storage(1).await;
    let provider = Arc::new(ScriptedGenerationProvider::new());
    provider.push_err(service_error("model not loaded"));

    let result = service(&storage, &provider)
        .enrich_one(1, EnrichmentKind::KnowledgePoint)
        .await;

    assert!(matches!(result, Err(KnowPilotError::Llm(_))));
    assert!(storage
        .item_get(1)
        .await
        .unwrap()
        .unwrap()
        .knowledge_point
        .is_none());
}

// ============================================================================
// BULK
// ============================================================================

#[tokio::test]
async fn test_enrich_all_isolates_item_failures() {
    let storage = seeded_storage(3).await;
    let provider = Arc::new(ScriptedGenerationProvider::new());
    provider.push_ok(qa_response("Q1?", "A1."));
    provider.push_err(service_error("connection reset"));
    provider.push_ok(qa_response("Q3?", "A3."));

    let result = service(&storage, &provider)
        .enrich_all(EnrichmentKind::Qa, BulkOptions::default())
        .await
        .unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.updated_count, 2);
    assert_eq!(result.skipped_count, 0);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].id, 2);
    assert!(result.failures[0].error.contains("connection reset"));
    assert!(result.failures[0].response.is_none());

    let items = storage.item_list().await.unwrap();
    assert_eq!(items[0].question.as_deref(), Some("Q1?"));
    assert!(items[1].question.is_none());
    assert_eq!(items[2].answer.as_deref(), Some("A3."));
}

#[tokio::test]
async fn test_enrich_all_records_raw_response_on_parse_failure() {
    let storage = seeded_storage(2).await;
    let provider = Arc::new(ScriptedGenerationProvider::with_responses([
        qa_response("Q1?", "A1."),
        "no markers here".to_string(),
    ]));

    let result = service(&storage, &provider)
        .enrich_all(EnrichmentKind::Qa, BulkOptions::default())
        .await
        .unwrap();

    assert_eq!(result.updated_count, 1);
    let failure = &result.failures[0];
    assert_eq!(failure.id, 2);
    assert_eq!(failure.error, "Failed to parse LLM response");
    assert_eq!(failure.response.as_deref(), Some("no markers here"));
}

#[tokio::test]
async fn test_enrich_all_records_empty_knowledge_point() {
    let storage = seeded_storage(2).await;
    let provider = Arc::new(ScriptedGenerationProvider::with_responses([
        "Knowledge point: ",
        "Warm fronts bring steady rain.",
    ]));

    let result = service(&storage, &provider)
        .enrich_all(EnrichmentKind::KnowledgePoint, BulkOptions::default())
        .await
        .unwrap();

    assert_eq!(result.updated_count, 1);
    assert_eq!(result.failures.len(), 1);
    let failure = &result.failures[0];
    assert_eq!(failure.id, 1);
    assert_eq!(failure.error, "Failed to generate knowledge point");
    assert_eq!(failure.response.as_deref(), Some("Knowledge point: "));

    let items = storage.item_list().await.unwrap();
    assert!(items[0].knowledge_point.is_none());
    assert_eq!(
        items[1].knowledge_point.as_deref(),
        Some("Warm fronts bring steady rain.")
    );
}

#[tokio::test]
async fn test_enrich_all_qa_is_idempotent() {
    let storage = seeded_storage(3).await;
    let provider = Arc::new(
        ScriptedGenerationProvider::new().with_fallback(Ok(qa_response("Q?", "A."))),
    );
    let service = service(&storage, &provider);

    let first = service
        .enrich_all(EnrichmentKind::Qa, BulkOptions::default())
        .await
        .unwrap();
    assert_eq!(first.updated_count, 3);

    let second = service
        .enrich_all(EnrichmentKind::Qa, BulkOptions::default())
        .await
        .unwrap();
    assert_eq!(second.updated_count, 0);
    assert_eq!(second.skipped_count, 3);
    assert!(second.failures.is_empty());
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_enrich_all_knowledge_regenerates_unless_asked_to_skip() {
    let storage = seeded_storage(2).await;
    let provider = Arc::new(
        ScriptedGenerationProvider::new().with_fallback(Ok("Fronts bring weather.".to_string())),
    );
    let service = service(&storage, &provider);

    service
        .enrich_all(EnrichmentKind::KnowledgePoint, BulkOptions::default())
        .await
        .unwrap();
    let rerun = service
        .enrich_all(EnrichmentKind::KnowledgePoint, BulkOptions::default())
        .await
        .unwrap();
    assert_eq!(rerun.updated_count, 2);
    assert_eq!(provider.call_count(), 4);

    let skipping = service
        .enrich_all(EnrichmentKind::KnowledgePoint, BulkOptions::skip_existing(true))
        .await
        .unwrap();
    assert_eq!(skipping.updated_count, 0);
    assert_eq!(skipping.skipped_count, 2);
    assert_eq!(provider.call_count(), 4);
}

#[tokio::test]
async fn test_enrich_all_commit_failure_rolls_back_everything() {
    let storage = seeded_storage(2).await;
    let provider = Arc::new(
        ScriptedGenerationProvider::new().with_fallback(Ok(qa_response("Q?", "A."))),
    );
    storage.fail_next_commit();

    let result = service(&storage, &provider)
        .enrich_all(EnrichmentKind::Qa, BulkOptions::default())
        .await;

    assert_storage_error(&result);
    assert!(storage
        .item_list()
        .await
        .unwrap()
        .iter()
        .all(|item| item.question.is_none()));
}

#[tokio::test]
async fn test_enrich_all_on_empty_storage() {
    let storage = MockStorage::new();
    let provider = Arc::new(ScriptedGenerationProvider::new());

    let result = service(&storage, &provider)
        .enrich_all(EnrichmentKind::Qa, BulkOptions::default())
        .await
        .unwrap();

    assert_eq!(result.total, 0);
    assert_eq!(result.updated_count, 0);
    assert_eq!(provider.call_count(), 0);
}

// ============================================================================
// ITEMS AND KNOWLEDGE
// ============================================================================

#[tokio::test]
async fn test_create_item_validates_content() {
    let storage = MockStorage::new();
    let provider = Arc::new(ScriptedGenerationProvider::new());
    let service = service(&storage, &provider);

    assert_invalid_argument(&service.create_item(NewItem::new("  ")).await);
    assert_invalid_argument(
        &service
            .create_item(NewItem::new("x".repeat(MAX_CONTENT_CHARS + 1)))
            .await,
    );

    let created = service
        .create_item(NewItem::new("Squall lines precede cold fronts.").with_section("Fronts"))
        .await
        .unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.section.as_deref(), Some("Fronts"));
    assert_eq!(service.list_items().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_item_not_found() {
    let storage = MockStorage::new();
    let provider = Arc::new(ScriptedGenerationProvider::new());
    assert_not_found(&service(&storage, &provider).get_item(3).await, EntityType::Item);
}

#[tokio::test]
async fn test_clear_knowledge_counts_and_resets() {
    let storage = seeded_storage(3).await;
    let provider = Arc::new(ScriptedGenerationProvider::with_responses([
        "Hail comes from cumulonimbus clouds.",
    ]));
    let service = service(&storage, &provider);
    service
        .enrich_one(1, EnrichmentKind::KnowledgePoint)
        .await
        .unwrap();

    assert_eq!(service.clear_knowledge().await.unwrap(), 1);
    let entries = service.list_knowledge().await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.knowledge_point.is_none()));
    assert_eq!(entries[0].content, WEATHER_FACTS[0]);
}

#[tokio::test]
async fn test_group_preview_chunks_in_order() {
    let storage = seeded_storage(5).await;
    let provider = Arc::new(ScriptedGenerationProvider::new());
    let service = service(&storage, &provider);

    let groups = service.group_preview(2).await.unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].group_id, 1);
    assert_eq!(groups[2].group_id, 3);
    assert_eq!(groups[2].facts.len(), 1);
    assert_eq!(groups[2].facts[0].id, 5);

    assert_invalid_argument(&service.group_preview(0).await);
    assert_invalid_argument(&service.group_preview(-3).await);
}
