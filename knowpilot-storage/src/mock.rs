//! In-memory storage backend.

use crate::ContentStorage;
use ::async_trait::async_trait;
use chrono::Utc;
use knowpilot_core::{
    ContentSlot, EntityType, GroupRow, GroupRowUpdate, GroupTableSchema, Item, ItemId,
    ItemUpdate, KnowPilotResult, NewItem, RowId, StorageError, TableDescription,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct MockGroupTable {
    columns: Vec<String>,
    rows: BTreeMap<RowId, GroupRow>,
}

impl MockGroupTable {
    fn content_slots(&self) -> usize {
        TableDescription {
            table: String::new(),
            columns: self.columns.clone(),
            primary_key: Vec::new(),
        }
        .content_column_count()
    }

    fn next_row_id(&self) -> RowId {
        self.rows.keys().next_back().map_or(1, |id| id + 1)
    }
}

/// In-memory storage for testing.
///
/// Batch writes are validated in full before anything is applied, which
/// gives the same all-or-nothing behaviour as a database transaction.
#[derive(Debug, Clone, Default)]
pub struct MockStorage {
    items: Arc<RwLock<BTreeMap<ItemId, Item>>>,
    group_tables: Arc<RwLock<HashMap<String, MockGroupTable>>>,
    fail_next_commit: Arc<AtomicBool>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StorageError> {
    lock.read().map_err(|_| StorageError::LockPoisoned)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StorageError> {
    lock.write().map_err(|_| StorageError::LockPoisoned)
}

fn table_missing(schema: &GroupTableSchema) -> StorageError {
    StorageError::NotFound {
        entity_type: EntityType::GroupTable,
        id: schema.table_name(),
    }
}

impl MockStorage {
    /// Create a new mock storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next batch write fail without applying anything.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Register a group table with arbitrary columns, e.g. one created by an
    /// older version with a different shape.
    pub fn insert_raw_group_table(
        &self,
        schema: &GroupTableSchema,
        columns: Vec<String>,
    ) -> KnowPilotResult<()> {
        let mut tables = write(&self.group_tables)?;
        tables.insert(
            schema.table_name(),
            MockGroupTable {
                columns,
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Store `row` as is in an existing group table.
    pub fn insert_raw_group_row(
        &self,
        schema: &GroupTableSchema,
        row: GroupRow,
    ) -> KnowPilotResult<()> {
        let mut tables = write(&self.group_tables)?;
        let table = tables
            .get_mut(&schema.table_name())
            .ok_or_else(|| table_missing(schema))?;
        table.rows.insert(row.id, row);
        Ok(())
    }

    /// Get count of stored items.
    pub fn item_count(&self) -> KnowPilotResult<usize> {
        Ok(read(&self.items)?.len())
    }

    fn take_commit_failure(&self) -> Result<(), StorageError> {
        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StorageError::TransactionFailed {
                reason: "injected commit failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStorage for MockStorage {
    // === Item Operations ===

    async fn item_insert(&self, new_item: &NewItem) -> KnowPilotResult<Item> {
        new_item.validate()?;
        let mut items = write(&self.items)?;
        let id = items.keys().next_back().map_or(1, |id| id + 1);
        let item = Item {
            id,
            section: new_item.section.clone(),
            sequence: new_item.sequence.clone(),
            page_name: new_item.page_name.clone(),
            source_reference: new_item.source_reference.clone(),
            content: new_item.content.clone(),
            knowledge_point: None,
            question: None,
            answer: new_item.answer.clone(),
            created_at: Utc::now(),
        };
        items.insert(id, item.clone());
        Ok(item)
    }

    async fn item_get(&self, id: ItemId) -> KnowPilotResult<Option<Item>> {
        Ok(read(&self.items)?.get(&id).cloned())
    }

    async fn item_list(&self) -> KnowPilotResult<Vec<Item>> {
        Ok(read(&self.items)?.values().cloned().collect())
    }

    async fn item_update(&self, id: ItemId, update: &ItemUpdate) -> KnowPilotResult<()> {
        let mut items = write(&self.items)?;
        let item = items.get_mut(&id).ok_or(StorageError::NotFound {
            entity_type: EntityType::Item,
            id: id.to_string(),
        })?;
        update.apply_to(item);
        Ok(())
    }

    async fn item_update_batch(&self, updates: &[(ItemId, ItemUpdate)]) -> KnowPilotResult<u64> {
        let mut items = write(&self.items)?;
        if let Some((missing, _)) = updates.iter().find(|(id, _)| !items.contains_key(id)) {
            return Err(StorageError::UpdateFailed {
                entity_type: EntityType::Item,
                id: missing.to_string(),
                reason: "item does not exist".to_string(),
            }
            .into());
        }
        self.take_commit_failure()?;

        for (id, update) in updates {
            if let Some(item) = items.get_mut(id) {
                update.apply_to(item);
            }
        }
        Ok(updates.len() as u64)
    }

    async fn item_clear_knowledge(&self) -> KnowPilotResult<u64> {
        let mut items = write(&self.items)?;
        let mut cleared = 0;
        for item in items.values_mut() {
            if item.knowledge_point.take().is_some() {
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    // === Group Table Operations ===

    async fn group_table_describe(
        &self,
        schema: &GroupTableSchema,
    ) -> KnowPilotResult<Option<TableDescription>> {
        let tables = read(&self.group_tables)?;
        Ok(tables.get(&schema.table_name()).map(|table| {
            let primary_key = if table.columns.iter().any(|c| c == "id") {
                vec!["id".to_string()]
            } else {
                Vec::new()
            };
            TableDescription {
                table: schema.table_name(),
                columns: table.columns.clone(),
                primary_key,
            }
        }))
    }

    async fn group_table_create(&self, schema: &GroupTableSchema) -> KnowPilotResult<bool> {
        let mut tables = write(&self.group_tables)?;
        let name = schema.table_name();
        if tables.contains_key(&name) {
            return Ok(false);
        }
        tables.insert(
            name,
            MockGroupTable {
                columns: schema.column_names(),
                rows: BTreeMap::new(),
            },
        );
        Ok(true)
    }

    async fn group_row_count(&self, schema: &GroupTableSchema) -> KnowPilotResult<u64> {
        let tables = read(&self.group_tables)?;
        let table = tables
            .get(&schema.table_name())
            .ok_or_else(|| table_missing(schema))?;
        Ok(table.rows.len() as u64)
    }

    async fn group_rows_list(&self, schema: &GroupTableSchema) -> KnowPilotResult<Vec<GroupRow>> {
        let tables = read(&self.group_tables)?;
        let table = tables
            .get(&schema.table_name())
            .ok_or_else(|| table_missing(schema))?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn group_rows_insert_batch(
        &self,
        schema: &GroupTableSchema,
        groups: &[Vec<String>],
    ) -> KnowPilotResult<u64> {
        let mut tables = write(&self.group_tables)?;
        let table = tables
            .get_mut(&schema.table_name())
            .ok_or_else(|| table_missing(schema))?;

        let slots = table.content_slots();
        if let Some(oversized) = groups.iter().find(|g| g.len() > slots) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::GroupRow,
                reason: format!(
                    "group of {} does not fit {} content columns",
                    oversized.len(),
                    slots
                ),
            }
            .into());
        }
        self.take_commit_failure()?;

        let now = Utc::now();
        for group in groups {
            let id = table.next_row_id();
            let mut texts: Vec<Option<String>> = group.iter().cloned().map(Some).collect();
            texts.resize(slots, None);
            let contents = ContentSlot::sequential(texts);
            table.rows.insert(
                id,
                GroupRow {
                    id,
                    contents,
                    question: None,
                    correct_answer: None,
                    created_at: Some(now),
                    updated_at: Some(now),
                },
            );
        }
        Ok(groups.len() as u64)
    }

    async fn group_rows_update_batch(
        &self,
        schema: &GroupTableSchema,
        updates: &[GroupRowUpdate],
    ) -> KnowPilotResult<u64> {
        let mut tables = write(&self.group_tables)?;
        let table = tables
            .get_mut(&schema.table_name())
            .ok_or_else(|| table_missing(schema))?;

        if let Some(missing) = updates.iter().find(|u| !table.rows.contains_key(&u.row_id)) {
            return Err(StorageError::UpdateFailed {
                entity_type: EntityType::GroupRow,
                id: missing.row_id.to_string(),
                reason: "row does not exist".to_string(),
            }
            .into());
        }
        self.take_commit_failure()?;

        for update in updates {
            if let Some(row) = table.rows.get_mut(&update.row_id) {
                row.question = Some(update.question.clone());
                row.correct_answer = Some(update.correct_answer.clone());
                row.updated_at = Some(update.updated_at);
            }
        }
        Ok(updates.len() as u64)
    }

    async fn health_check(&self) -> KnowPilotResult<()> {
        read(&self.items)?;
        read(&self.group_tables)?;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
