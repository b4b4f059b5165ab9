//! KnowPilot Storage - Storage Abstraction
//!
//! The async trait every storage backend implements, plus an in-memory
//! backend for tests and local experiments.
//!
//! Batch operations are atomic: either every entry is applied or none is.

use ::async_trait::async_trait;
use knowpilot_core::{
    GroupRow, GroupRowUpdate, GroupTableSchema, Item, ItemId, ItemUpdate, KnowPilotResult,
    NewItem, TableDescription,
};

mod mock;

pub use mock::MockStorage;

/// Async storage trait for items and group tables.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    // ========================================================================
    // ITEM OPERATIONS
    // ========================================================================

    /// Insert a new item and return it with its assigned id.
    async fn item_insert(&self, item: &NewItem) -> KnowPilotResult<Item>;

    /// Get an item by ID.
    async fn item_get(&self, id: ItemId) -> KnowPilotResult<Option<Item>>;

    /// All items in insertion order.
    async fn item_list(&self) -> KnowPilotResult<Vec<Item>>;

    /// Overwrite derived fields of one item.
    async fn item_update(&self, id: ItemId, update: &ItemUpdate) -> KnowPilotResult<()>;

    /// Apply many updates in one transaction. Returns the number applied.
    async fn item_update_batch(&self, updates: &[(ItemId, ItemUpdate)]) -> KnowPilotResult<u64>;

    /// Reset every knowledge point. Returns how many items had one.
    async fn item_clear_knowledge(&self) -> KnowPilotResult<u64>;

    // ========================================================================
    // GROUP TABLE OPERATIONS
    // ========================================================================

    /// Describe the physical table for `schema`, `None` if it does not exist.
    async fn group_table_describe(
        &self,
        schema: &GroupTableSchema,
    ) -> KnowPilotResult<Option<TableDescription>>;

    /// Create the table if absent. Returns `true` if it was created.
    async fn group_table_create(&self, schema: &GroupTableSchema) -> KnowPilotResult<bool>;

    /// Number of rows in the table.
    async fn group_row_count(&self, schema: &GroupTableSchema) -> KnowPilotResult<u64>;

    /// All rows ordered by id, content slots as found in the table.
    async fn group_rows_list(&self, schema: &GroupTableSchema) -> KnowPilotResult<Vec<GroupRow>>;

    /// Insert one row per group, in order, in one transaction.
    async fn group_rows_insert_batch(
        &self,
        schema: &GroupTableSchema,
        groups: &[Vec<String>],
    ) -> KnowPilotResult<u64>;

    /// Store generated questions in one transaction.
    async fn group_rows_update_batch(
        &self,
        schema: &GroupTableSchema,
        updates: &[GroupRowUpdate],
    ) -> KnowPilotResult<u64>;

    // ========================================================================
    // HEALTH
    // ========================================================================

    /// Verify the backend is reachable.
    async fn health_check(&self) -> KnowPilotResult<()>;
}
