//! Content Group Service
//!
//! Manages the `content_group_{k}` tables: each row packs `k` consecutive
//! items, and question generation picks one populated slot per row as the
//! correct answer of a single-choice question.
//!
//! Table lifecycle per `k`: absent, created (empty), filled, annotated.
//! Every transition is safe to repeat.

use chrono::Utc;
use knowpilot_core::{
    extract_choice_question, group_table_name, partition_into_groups, EntityType, GroupRow,
    GroupRowUpdate, GroupTableSchema, KnowPilotConfig, KnowPilotError, KnowPilotResult, ParseError,
    PromptTemplates, StorageError,
};
use knowpilot_llm::{GenerationOptions, GenerationProvider};
use knowpilot_storage::ContentStorage;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

use super::generate_recorded;
use crate::types::{
    CreateTableResponse, FillTableResponse, GenerateQuestionsResponse, ProcessedRow, RowStatus,
    SingleQuestionResponse, TableStatus,
};

/// Reason recorded for rows with fewer than two populated slots.
pub const INSUFFICIENT_CONTENT_REASON: &str = "Insufficient content columns with data";

/// Rows need at least this many populated slots to make a question.
const MIN_POPULATED_SLOTS: usize = 2;

/// Storage reports a missing group table as a storage error; callers of this
/// service see it as a plain not-found.
fn surface_not_found(err: KnowPilotError) -> KnowPilotError {
    match err {
        KnowPilotError::Storage(StorageError::NotFound { entity_type, id }) => {
            KnowPilotError::NotFound {
                entity: entity_type,
                id,
            }
        }
        other => other,
    }
}

/// Schema for reading an existing table. No table is ever created outside
/// the valid size range, so such sizes are reported as a missing table.
fn existing_schema(k: i64) -> KnowPilotResult<GroupTableSchema> {
    GroupTableSchema::new(k)
        .map_err(|_| KnowPilotError::not_found(EntityType::GroupTable, group_table_name(k)))
}

/// Creates, fills and annotates group tables.
#[derive(Clone)]
pub struct GroupingService {
    storage: Arc<dyn ContentStorage>,
    provider: Arc<dyn GenerationProvider>,
    config: Arc<KnowPilotConfig>,
    rng: Arc<Mutex<StdRng>>,
}

impl GroupingService {
    pub fn new(
        storage: Arc<dyn ContentStorage>,
        provider: Arc<dyn GenerationProvider>,
        config: Arc<KnowPilotConfig>,
    ) -> Self {
        Self {
            storage,
            provider,
            config,
            rng: Arc::new(Mutex::new(StdRng::from_os_rng())),
        }
    }

    /// Replace the slot/row picker with a deterministic one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    fn choose<'a, T>(&self, candidates: &'a [T]) -> Option<&'a T> {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        candidates.choose(&mut *rng)
    }

    async fn generate_question(&self, correct_content: &str) -> KnowPilotResult<String> {
        let prompt = PromptTemplates::render(
            &self.config.prompts.content_group_question_template,
            correct_content,
        );
        let settings = &self.config.generation;
        let options =
            GenerationOptions::from_settings(settings, settings.choice_question_max_tokens);

        let text = generate_recorded(self.provider.as_ref(), &prompt, &options).await?;
        let question = extract_choice_question(&text);
        if question.is_empty() {
            return Err(ParseError::EmptyOutput { field: "question" }.into());
        }
        Ok(question)
    }

    /// Create `content_group_{k}` unless it already exists.
    pub async fn create_table(&self, k: i64) -> KnowPilotResult<CreateTableResponse> {
        let schema = GroupTableSchema::new(k)?;
        let table = schema.table_name();

        if let Some(existing) = self.storage.group_table_describe(&schema).await? {
            tracing::debug!(k, table = %table, "Group table already exists");
            return Ok(CreateTableResponse {
                status: TableStatus::NotModified,
                message: format!(
                    "Table '{}' already exists with {} content columns",
                    table,
                    existing.content_column_count()
                ),
                table_name: table,
                columns: existing.columns,
            });
        }

        if !self.storage.group_table_create(&schema).await? {
            // Created concurrently between describe and create.
            let columns = self
                .storage
                .group_table_describe(&schema)
                .await?
                .map(|d| d.columns)
                .unwrap_or_else(|| schema.column_names());
            return Ok(CreateTableResponse {
                status: TableStatus::NotModified,
                message: format!("Table '{}' already exists", table),
                table_name: table,
                columns,
            });
        }

        tracing::info!(k, table = %table, "Group table created");
        Ok(CreateTableResponse {
            status: TableStatus::Created,
            message: format!(
                "Table '{}' created successfully with {} content columns",
                table, k
            ),
            table_name: table,
            columns: schema.column_names(),
        })
    }

    /// Create the table if needed and pack all items into it, `k` per row.
    ///
    /// A table that already holds rows is left untouched.
    pub async fn fill_table(&self, k: i64) -> KnowPilotResult<FillTableResponse> {
        let schema = GroupTableSchema::new(k)?;
        let table = schema.table_name();

        if self.storage.group_table_describe(&schema).await?.is_some() {
            let rows = self.storage.group_row_count(&schema).await?;
            if rows > 0 {
                tracing::debug!(k, table = %table, rows, "Group table already filled");
                return Ok(FillTableResponse {
                    status: TableStatus::NotModified,
                    message: format!("Table '{}' already exists. No action taken.", table),
                    table_name: table,
                    groups_inserted: 0,
                    items_consumed: 0,
                    total_items: 0,
                });
            }
        } else {
            self.storage.group_table_create(&schema).await?;
        }

        let items = self.storage.item_list().await?;
        let contents: Vec<String> = items.into_iter().map(|item| item.content).collect();
        let groups = partition_into_groups(&contents, schema.k());
        let inserted = self.storage.group_rows_insert_batch(&schema, &groups).await?;

        tracing::info!(
            k,
            table = %table,
            groups = inserted,
            items = contents.len(),
            "Group table filled"
        );
        Ok(FillTableResponse {
            status: TableStatus::Created,
            message: "Table created and filled with data from questions table".to_string(),
            table_name: table,
            groups_inserted: inserted,
            items_consumed: contents.len(),
            total_items: contents.len(),
        })
    }

    /// Generate a single-choice question for every eligible row.
    ///
    /// Row failures are reported, not raised; all generated questions are
    /// written in one batch at the end.
    pub async fn generate_questions_for_table(
        &self,
        k: i64,
    ) -> KnowPilotResult<GenerateQuestionsResponse> {
        let schema = existing_schema(k)?;
        let table = schema.table_name();

        let description = self
            .storage
            .group_table_describe(&schema)
            .await?
            .ok_or_else(|| KnowPilotError::not_found(EntityType::GroupTable, &table))?;
        if description.content_column_count() == 0 {
            return Err(KnowPilotError::not_found(
                EntityType::GroupTable,
                format!("{} (no content columns)", table),
            ));
        }

        let rows = self
            .storage
            .group_rows_list(&schema)
            .await
            .map_err(surface_not_found)?;
        if rows.is_empty() {
            return Err(KnowPilotError::not_found(
                EntityType::GroupTable,
                format!("{} (no rows)", table),
            ));
        }

        let mut processed = Vec::with_capacity(rows.len());
        let mut updates = Vec::new();

        for row in &rows {
            let slots = row.populated_slots();
            let picked = if slots.len() < MIN_POPULATED_SLOTS {
                None
            } else {
                self.choose(&slots).copied()
            };
            let Some((ordinal, content)) = picked else {
                processed.push(ProcessedRow::skipped(row.id, INSUFFICIENT_CONTENT_REASON));
                continue;
            };

            match self.generate_question(content).await {
                Ok(question) => {
                    let correct_answer = ordinal.to_string();
                    updates.push(GroupRowUpdate {
                        row_id: row.id,
                        question: question.clone(),
                        correct_answer: correct_answer.clone(),
                        updated_at: Utc::now(),
                    });
                    processed.push(ProcessedRow::success(row.id, question, correct_answer));
                }
                Err(e) => {
                    tracing::warn!(table = %table, row_id = row.id, error = %e, "Question generation failed");
                    processed.push(ProcessedRow::failed(row.id, e.to_string()));
                }
            }
        }

        self.storage
            .group_rows_update_batch(&schema, &updates)
            .await?;

        let count = |status: RowStatus| processed.iter().filter(|p| p.status == status).count();
        let response = GenerateQuestionsResponse {
            status: "completed".to_string(),
            table: table.clone(),
            total_rows: rows.len(),
            success_count: count(RowStatus::Success),
            failure_count: count(RowStatus::Failed),
            skipped_count: count(RowStatus::Skipped),
            processed_rows: processed,
        };

        tracing::info!(
            k,
            table = %table,
            total = response.total_rows,
            success = response.success_count,
            failed = response.failure_count,
            skipped = response.skipped_count,
            "Question generation complete"
        );
        Ok(response)
    }

    /// Generate and store a question for one randomly chosen eligible row.
    pub async fn generate_single_question(
        &self,
        k: i64,
    ) -> KnowPilotResult<SingleQuestionResponse> {
        let schema = existing_schema(k)?;
        let table = schema.table_name();

        let rows = self
            .storage
            .group_rows_list(&schema)
            .await
            .map_err(surface_not_found)?;
        let eligible: Vec<&GroupRow> = rows
            .iter()
            .filter(|row| row.populated_slots().len() >= MIN_POPULATED_SLOTS)
            .collect();

        let row = self.choose(&eligible).copied().ok_or_else(|| {
            KnowPilotError::not_found(EntityType::GroupRow, format!("{} (no eligible rows)", table))
        })?;
        let slots = row.populated_slots();
        let (ordinal, content) = self.choose(&slots).copied().ok_or_else(|| {
            KnowPilotError::not_found(EntityType::GroupRow, row.id)
        })?;

        let question = self.generate_question(content).await?;
        let correct_answer = ordinal.to_string();
        self.storage
            .group_rows_update_batch(
                &schema,
                &[GroupRowUpdate {
                    row_id: row.id,
                    question: question.clone(),
                    correct_answer: correct_answer.clone(),
                    updated_at: Utc::now(),
                }],
            )
            .await?;

        tracing::info!(k, table = %table, row_id = row.id, "Single question generated");
        Ok(SingleQuestionResponse {
            status: "success".to_string(),
            table,
            row_id: row.id,
            question,
            correct_answer,
        })
    }

    /// Every row of `content_group_{k}`.
    pub async fn get_table_data(&self, k: i64) -> KnowPilotResult<Vec<GroupRow>> {
        let schema = existing_schema(k)?;
        self.storage
            .group_rows_list(&schema)
            .await
            .map_err(surface_not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_not_found_converts_storage_variant() {
        let err = surface_not_found(
            StorageError::NotFound {
                entity_type: EntityType::GroupTable,
                id: "content_group_4".to_string(),
            }
            .into(),
        );
        assert!(matches!(
            err,
            KnowPilotError::NotFound {
                entity: EntityType::GroupTable,
                ..
            }
        ));
    }

    #[test]
    fn test_existing_schema_reports_out_of_range_as_missing() {
        match existing_schema(25) {
            Err(KnowPilotError::NotFound { entity, id }) => {
                assert_eq!(entity, EntityType::GroupTable);
                assert_eq!(id, "content_group_25");
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert_eq!(existing_schema(4).unwrap().k(), 4);
    }

    #[test]
    fn test_surface_not_found_keeps_other_errors() {
        let err = surface_not_found(StorageError::LockPoisoned.into());
        assert!(matches!(err, KnowPilotError::Storage(StorageError::LockPoisoned)));
    }
}
