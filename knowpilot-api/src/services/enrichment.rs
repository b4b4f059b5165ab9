//! Item Enrichment Service
//!
//! Fills an item's derived fields (question/answer or knowledge point) from
//! generated text. Single runs fail loudly; bulk runs record per-item
//! failures and commit every successful update in one batch.

use knowpilot_core::{
    parse_knowledge_point, parse_qa, partition_into_groups, EnrichmentKind, EntityType, Item,
    ItemId, ItemUpdate, KnowPilotConfig, KnowPilotError, KnowPilotResult, LlmError, NewItem,
    ParseError, PromptTemplates, ValidationError,
};
use knowpilot_llm::{GenerationOptions, GenerationProvider};
use knowpilot_storage::ContentStorage;
use std::sync::Arc;

use super::generate_recorded;
use crate::telemetry::with_metrics;
use crate::types::{BulkResult, FactGroup, ItemFailure, KnowledgeEntry};

/// Error text stored for items whose question/answer text could not be parsed.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse LLM response";

/// Error text stored for items whose knowledge point came back empty.
pub const KNOWLEDGE_FAILURE_MESSAGE: &str = "Failed to generate knowledge point";

fn parse_failure_message(kind: EnrichmentKind) -> &'static str {
    match kind {
        EnrichmentKind::Qa => PARSE_FAILURE_MESSAGE,
        EnrichmentKind::KnowledgePoint => KNOWLEDGE_FAILURE_MESSAGE,
    }
}

/// Options for a bulk run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOptions {
    /// Leave already-enriched items alone. `None` uses the kind's default.
    pub skip_existing: Option<bool>,
}

impl BulkOptions {
    pub fn skip_existing(skip: bool) -> Self {
        Self {
            skip_existing: Some(skip),
        }
    }

    fn skips_enriched(&self, kind: EnrichmentKind) -> bool {
        self.skip_existing
            .unwrap_or_else(|| kind.skips_enriched_by_default())
    }
}

/// Why one item could not be enriched.
#[derive(Debug)]
enum EnrichmentFailure {
    Generation(LlmError),
    Parse { error: ParseError, response: String },
}

impl EnrichmentFailure {
    fn into_record(self, id: ItemId, kind: EnrichmentKind) -> ItemFailure {
        match self {
            EnrichmentFailure::Generation(e) => ItemFailure {
                id,
                error: e.to_string(),
                response: None,
            },
            EnrichmentFailure::Parse { response, .. } => ItemFailure {
                id,
                error: parse_failure_message(kind).to_string(),
                response: Some(response),
            },
        }
    }
}

impl From<EnrichmentFailure> for KnowPilotError {
    fn from(failure: EnrichmentFailure) -> Self {
        match failure {
            EnrichmentFailure::Generation(e) => e.into(),
            EnrichmentFailure::Parse { error, .. } => error.into(),
        }
    }
}

/// Turn generated text into the update for `kind`.
fn parse_update(kind: EnrichmentKind, text: &str) -> Result<ItemUpdate, ParseError> {
    match kind {
        EnrichmentKind::Qa => parse_qa(text).map(ItemUpdate::qa),
        EnrichmentKind::KnowledgePoint => {
            let point = parse_knowledge_point(text);
            if point.is_empty() {
                Err(ParseError::EmptyOutput {
                    field: "knowledge_point",
                })
            } else {
                Ok(ItemUpdate::knowledge_point(point))
            }
        }
    }
}

/// Orchestrates enrichment of stored items.
#[derive(Clone)]
pub struct EnrichmentService {
    storage: Arc<dyn ContentStorage>,
    provider: Arc<dyn GenerationProvider>,
    config: Arc<KnowPilotConfig>,
}

impl EnrichmentService {
    pub fn new(
        storage: Arc<dyn ContentStorage>,
        provider: Arc<dyn GenerationProvider>,
        config: Arc<KnowPilotConfig>,
    ) -> Self {
        Self {
            storage,
            provider,
            config,
        }
    }

    async fn generate_for(
        &self,
        item: &Item,
        kind: EnrichmentKind,
    ) -> Result<ItemUpdate, EnrichmentFailure> {
        let prompt = PromptTemplates::render(self.config.prompts.for_kind(kind), &item.content);
        let settings = &self.config.generation;
        let options = GenerationOptions::from_settings(settings, settings.max_tokens_for(kind));

        let text = generate_recorded(self.provider.as_ref(), &prompt, &options)
            .await
            .map_err(EnrichmentFailure::Generation)?;

        parse_update(kind, &text).map_err(|error| EnrichmentFailure::Parse {
            error,
            response: text,
        })
    }

    /// Enrich one item and return it with the new field values.
    pub async fn enrich_one(&self, id: ItemId, kind: EnrichmentKind) -> KnowPilotResult<Item> {
        let mut item = self.get_item(id).await?;

        let update = match self.generate_for(&item, kind).await {
            Ok(update) => update,
            Err(failure) => {
                tracing::warn!(item_id = id, kind = %kind, error = ?failure, "Enrichment failed");
                with_metrics(|m| m.record_enrichment(kind.as_str(), "failed"));
                return Err(failure.into());
            }
        };

        self.storage.item_update(id, &update).await?;
        update.apply_to(&mut item);

        with_metrics(|m| m.record_enrichment(kind.as_str(), "updated"));
        tracing::info!(item_id = id, kind = %kind, "Item enriched");
        Ok(item)
    }

    /// Enrich every item in insertion order, one generation call at a time.
    pub async fn enrich_all(
        &self,
        kind: EnrichmentKind,
        options: BulkOptions,
    ) -> KnowPilotResult<BulkResult> {
        let items = self.storage.item_list().await?;
        let skip_enriched = options.skips_enriched(kind);

        let mut result = BulkResult {
            total: items.len(),
            ..BulkResult::default()
        };
        let mut updates = Vec::new();

        for item in &items {
            if skip_enriched && item.is_enriched(kind) {
                result.skipped_count += 1;
                with_metrics(|m| m.record_enrichment(kind.as_str(), "skipped"));
                continue;
            }

            match self.generate_for(item, kind).await {
                Ok(update) => updates.push((item.id, update)),
                Err(failure) => {
                    tracing::warn!(item_id = item.id, kind = %kind, error = ?failure, "Enrichment failed");
                    with_metrics(|m| m.record_enrichment(kind.as_str(), "failed"));
                    result.failures.push(failure.into_record(item.id, kind));
                }
            }
        }

        let committed = self.storage.item_update_batch(&updates).await?;
        result.updated_count = committed as usize;
        with_metrics(|m| {
            for _ in 0..committed {
                m.record_enrichment(kind.as_str(), "updated");
            }
        });

        tracing::info!(
            kind = %kind,
            total = result.total,
            updated = result.updated_count,
            skipped = result.skipped_count,
            failed = result.failures.len(),
            "Bulk enrichment complete"
        );
        Ok(result)
    }

    /// All items in insertion order.
    pub async fn list_items(&self) -> KnowPilotResult<Vec<Item>> {
        self.storage.item_list().await
    }

    pub async fn get_item(&self, id: ItemId) -> KnowPilotResult<Item> {
        self.storage
            .item_get(id)
            .await?
            .ok_or_else(|| KnowPilotError::not_found(EntityType::Item, id))
    }

    pub async fn create_item(&self, item: NewItem) -> KnowPilotResult<Item> {
        item.validate()?;
        let created = self.storage.item_insert(&item).await?;
        tracing::info!(item_id = created.id, "Item created");
        Ok(created)
    }

    pub async fn list_knowledge(&self) -> KnowPilotResult<Vec<KnowledgeEntry>> {
        let items = self.storage.item_list().await?;
        Ok(items.into_iter().map(KnowledgeEntry::from).collect())
    }

    /// Reset every knowledge point; returns how many items had one.
    pub async fn clear_knowledge(&self) -> KnowPilotResult<u64> {
        let cleared = self.storage.item_clear_knowledge().await?;
        tracing::info!(cleared, "Knowledge points cleared");
        Ok(cleared)
    }

    /// Consecutive groups of `num` items, numbered from 1. Nothing is stored.
    pub async fn group_preview(&self, num: i64) -> KnowPilotResult<Vec<FactGroup>> {
        if num <= 0 {
            return Err(ValidationError::InvalidValue {
                field: "num".to_string(),
                reason: "group size must be positive".to_string(),
            }
            .into());
        }
        let size = usize::try_from(num).map_err(|_| ValidationError::InvalidValue {
            field: "num".to_string(),
            reason: format!("group size {} is too large", num),
        })?;

        let items = self.storage.item_list().await?;
        Ok(partition_into_groups(&items, size)
            .into_iter()
            .enumerate()
            .map(|(idx, facts)| FactGroup {
                group_id: idx + 1,
                facts,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_qa() {
        let update = parse_update(EnrichmentKind::Qa, "Question: Why?\nAnswer: Because.").unwrap();
        assert_eq!(update.question.as_deref(), Some("Why?"));
        assert_eq!(update.answer.as_deref(), Some("Because."));
        assert!(update.knowledge_point.is_none());
    }

    #[test]
    fn test_parse_update_empty_knowledge_point_fails() {
        let result = parse_update(EnrichmentKind::KnowledgePoint, "   ");
        assert!(matches!(result, Err(ParseError::EmptyOutput { .. })));
    }

    #[test]
    fn test_bulk_options_defaults_follow_kind() {
        let defaults = BulkOptions::default();
        assert!(defaults.skips_enriched(EnrichmentKind::Qa));
        assert!(!defaults.skips_enriched(EnrichmentKind::KnowledgePoint));
        assert!(BulkOptions::skip_existing(true).skips_enriched(EnrichmentKind::KnowledgePoint));
    }

    #[test]
    fn test_failure_records() {
        let parse = EnrichmentFailure::Parse {
            error: ParseError::MissingFields {
                fields: vec!["question", "answer"],
            },
            response: "gibberish".to_string(),
        }
        .into_record(3, EnrichmentKind::Qa);
        assert_eq!(parse.error, PARSE_FAILURE_MESSAGE);
        assert_eq!(parse.response.as_deref(), Some("gibberish"));

        let empty = EnrichmentFailure::Parse {
            error: ParseError::EmptyOutput {
                field: "knowledge_point",
            },
            response: "Key knowledge: ".to_string(),
        }
        .into_record(5, EnrichmentKind::KnowledgePoint);
        assert_eq!(empty.error, KNOWLEDGE_FAILURE_MESSAGE);
        assert_eq!(empty.response.as_deref(), Some("Key knowledge: "));

        let generation = EnrichmentFailure::Generation(LlmError::InvalidResponse {
            provider: "ollama".to_string(),
            reason: "truncated".to_string(),
        })
        .into_record(4, EnrichmentKind::Qa);
        assert!(generation.error.contains("truncated"));
        assert!(generation.response.is_none());
    }
}
