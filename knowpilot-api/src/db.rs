//! Database Connection Pool Module
//!
//! PostgreSQL storage backend built on deadpool-postgres. `DbClient`
//! implements [`ContentStorage`] over the `questions` table and the dynamic
//! `content_group_{k}` tables.
//!
//! Group-table DDL is rendered from the column list computed by
//! `GroupTableSchema`; identifiers never come from request input.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use knowpilot_core::{
    content_column_ordinal, normalize_derived, ColumnDescriptor, ColumnKind, ContentSlot,
    EntityType, GroupRow, GroupRowUpdate, GroupTableSchema, Item, ItemId, ItemUpdate,
    KnowPilotError, KnowPilotResult, NewItem, StorageError, TableDescription,
    PENDING_PLACEHOLDER,
};
use knowpilot_storage::ContentStorage;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

/// Sample item stored when the `questions` table is first created.
pub const SAMPLE_CONTENT: &str = "What is AI?";
pub const SAMPLE_ANSWER: &str = "AI is Artificial Intelligence.";

const ITEM_COLUMNS: &str = "id, section, sequence, page_name, source_reference, content, \
                            knowledge_point, question, answer, created_at";

const CREATE_QUESTIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS questions (
    id BIGSERIAL PRIMARY KEY,
    section TEXT,
    sequence TEXT,
    page_name TEXT,
    source_reference TEXT,
    content VARCHAR(1000) NOT NULL,
    knowledge_point TEXT,
    question TEXT,
    answer TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create timeout for pooled connections
    pub timeout: Duration,
    /// Insert the sample item when the schema is first created
    pub seed_sample_data: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "knowpilot".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
            seed_sample_data: true,
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("KNOWPILOT_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("KNOWPILOT_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("KNOWPILOT_DB_NAME").unwrap_or_else(|_| "knowpilot".to_string()),
            user: std::env::var("KNOWPILOT_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("KNOWPILOT_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("KNOWPILOT_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("KNOWPILOT_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            seed_sample_data: std::env::var("KNOWPILOT_DB_SEED")
                .map(|s| !matches!(s.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        pool_cfg.timeouts.create = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn pool_error(err: PoolError) -> KnowPilotError {
    tracing::error!("Connection pool error: {:?}", err);
    let reason = match err {
        PoolError::Timeout(_) => "connection pool exhausted",
        PoolError::Closed => "connection pool is closed",
        _ => "failed to acquire database connection",
    };
    StorageError::Unavailable {
        reason: reason.to_string(),
    }
    .into()
}

/// Log the driver error in full and keep only a short reason.
fn db_reason(operation: &str, err: &tokio_postgres::Error) -> String {
    tracing::error!(operation, "Database error: {:?}", err);
    match err.as_db_error() {
        Some(db) => db.message().to_string(),
        None => err.to_string(),
    }
}

fn query_failed(operation: &str, err: tokio_postgres::Error) -> KnowPilotError {
    StorageError::QueryFailed {
        reason: db_reason(operation, &err),
    }
    .into()
}

fn transaction_failed(operation: &str, err: tokio_postgres::Error) -> KnowPilotError {
    StorageError::TransactionFailed {
        reason: db_reason(operation, &err),
    }
    .into()
}

fn table_missing(schema: &GroupTableSchema) -> KnowPilotError {
    StorageError::NotFound {
        entity_type: EntityType::GroupTable,
        id: schema.table_name(),
    }
    .into()
}

fn is_undefined_table(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNDEFINED_TABLE)
}

// ============================================================================
// ROW MAPPING AND SQL RENDERING
// ============================================================================

fn item_from_row(row: &Row) -> Result<Item, tokio_postgres::Error> {
    Ok(Item {
        id: row.try_get("id")?,
        section: row.try_get("section")?,
        sequence: row.try_get("sequence")?,
        page_name: row.try_get("page_name")?,
        source_reference: row.try_get("source_reference")?,
        content: row.try_get("content")?,
        knowledge_point: normalize_derived(row.try_get("knowledge_point")?),
        question: normalize_derived(row.try_get("question")?),
        answer: normalize_derived(row.try_get("answer")?),
        created_at: row.try_get("created_at")?,
    })
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_sql(column: &ColumnDescriptor) -> String {
    let ty = match column.kind {
        ColumnKind::Identity => "BIGSERIAL PRIMARY KEY",
        ColumnKind::Text => "TEXT",
        ColumnKind::Timestamp => "TIMESTAMPTZ",
    };
    format!("{} {}", quote_ident(&column.name), ty)
}

/// `CREATE TABLE` statement for a group table.
pub(crate) fn create_group_table_sql(schema: &GroupTableSchema) -> String {
    let columns: Vec<String> = schema.columns().iter().map(column_sql).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&schema.table_name()),
        columns.join(", ")
    )
}

/// Columns a stored group table actually has, split by role.
struct StoredGroupColumns {
    /// `(ordinal, name)` of each `contentN` column, sorted by ordinal
    contents: Vec<(usize, String)>,
    has_question: bool,
    has_correct_answer: bool,
    has_created_at: bool,
    has_updated_at: bool,
}

impl StoredGroupColumns {
    fn from_description(description: &TableDescription) -> Self {
        let mut contents: Vec<(usize, String)> = description
            .columns
            .iter()
            .filter_map(|c| content_column_ordinal(c).map(|ordinal| (ordinal, c.clone())))
            .collect();
        contents.sort_by_key(|(ordinal, _)| *ordinal);
        let has = |name: &str| description.columns.iter().any(|c| c == name);
        Self {
            contents,
            has_question: has("question"),
            has_correct_answer: has("correct_answer"),
            has_created_at: has("created_at"),
            has_updated_at: has("updated_at"),
        }
    }

    fn select_sql(&self, table: &str) -> String {
        let mut select = vec!["id::bigint AS id".to_string()];
        select.extend(
            self.contents
                .iter()
                .map(|(_, c)| format!("{}::text AS {}", quote_ident(c), quote_ident(c))),
        );
        let optional = [
            (self.has_question, "question", "text"),
            (self.has_correct_answer, "correct_answer", "text"),
            (self.has_created_at, "created_at", "timestamptz"),
            (self.has_updated_at, "updated_at", "timestamptz"),
        ];
        for (present, name, ty) in optional {
            if present {
                select.push(format!("{}::{} AS {}", name, ty, name));
            }
        }
        format!(
            "SELECT {} FROM {} ORDER BY id",
            select.join(", "),
            quote_ident(table)
        )
    }

    fn row(&self, row: &Row) -> Result<GroupRow, tokio_postgres::Error> {
        let mut contents = Vec::with_capacity(self.contents.len());
        for (ordinal, column) in &self.contents {
            contents.push(ContentSlot {
                ordinal: *ordinal,
                text: row.try_get::<_, Option<String>>(column.as_str())?,
            });
        }
        Ok(GroupRow {
            id: row.try_get("id")?,
            contents,
            question: self.optional(row, self.has_question, "question")?,
            correct_answer: self.optional(row, self.has_correct_answer, "correct_answer")?,
            created_at: self.optional(row, self.has_created_at, "created_at")?,
            updated_at: self.optional(row, self.has_updated_at, "updated_at")?,
        })
    }

    fn optional<'a, T>(
        &self,
        row: &'a Row,
        present: bool,
        name: &str,
    ) -> Result<Option<T>, tokio_postgres::Error>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        if present {
            row.try_get::<_, Option<T>>(name)
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Configured upper bound on pooled connections.
    pub fn pool_max_size(&self) -> usize {
        self.pool.status().max_size
    }

    async fn get_conn(&self) -> KnowPilotResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error)
    }

    /// Create the `questions` table if it does not exist yet.
    ///
    /// When the table is created and `seed` is set, one sample item is
    /// inserted. Returns `true` if the table was created.
    pub async fn migrate(&self, seed: bool) -> ApiResult<bool> {
        let conn = self.pool.get().await?;

        let row = conn
            .query_one(
                "SELECT EXISTS (
                    SELECT FROM information_schema.tables
                    WHERE table_schema = current_schema() AND table_name = 'questions'
                )",
                &[],
            )
            .await?;
        let exists: bool = row.try_get(0)?;
        if exists {
            return Ok(false);
        }

        conn.batch_execute(CREATE_QUESTIONS_TABLE).await?;
        tracing::info!(table = "questions", "Created table");

        if seed {
            conn.execute(
                "INSERT INTO questions (content, answer) VALUES ($1, $2)",
                &[&SAMPLE_CONTENT, &SAMPLE_ANSWER],
            )
            .await?;
            tracing::info!("Inserted sample item");
        }
        Ok(true)
    }
}

// ============================================================================
// STORAGE IMPLEMENTATION
// ============================================================================

#[async_trait]
impl ContentStorage for DbClient {
    // === Item Operations ===

    async fn item_insert(&self, item: &NewItem) -> KnowPilotResult<Item> {
        item.validate()?;
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO questions (section, sequence, page_name, source_reference, content, answer)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            ITEM_COLUMNS
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &item.section,
                    &item.sequence,
                    &item.page_name,
                    &item.source_reference,
                    &item.content,
                    &item.answer,
                ],
            )
            .await
            .map_err(|e| StorageError::InsertFailed {
                entity_type: EntityType::Item,
                reason: db_reason("item_insert", &e),
            })?;
        item_from_row(&row).map_err(|e| query_failed("item_insert", e))
    }

    async fn item_get(&self, id: ItemId) -> KnowPilotResult<Option<Item>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM questions WHERE id = $1", ITEM_COLUMNS);
        let row = conn
            .query_opt(&sql, &[&id])
            .await
            .map_err(|e| query_failed("item_get", e))?;
        row.map(|r| item_from_row(&r))
            .transpose()
            .map_err(|e| query_failed("item_get", e))
    }

    async fn item_list(&self) -> KnowPilotResult<Vec<Item>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM questions ORDER BY id", ITEM_COLUMNS);
        let rows = conn
            .query(&sql, &[])
            .await
            .map_err(|e| query_failed("item_list", e))?;
        rows.iter()
            .map(item_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| query_failed("item_list", e))
    }

    async fn item_update(&self, id: ItemId, update: &ItemUpdate) -> KnowPilotResult<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE questions SET
                    question = COALESCE($2, question),
                    answer = COALESCE($3, answer),
                    knowledge_point = COALESCE($4, knowledge_point)
                 WHERE id = $1",
                &[&id, &update.question, &update.answer, &update.knowledge_point],
            )
            .await
            .map_err(|e| StorageError::UpdateFailed {
                entity_type: EntityType::Item,
                id: id.to_string(),
                reason: db_reason("item_update", &e),
            })?;
        if updated == 0 {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Item,
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn item_update_batch(&self, updates: &[(ItemId, ItemUpdate)]) -> KnowPilotResult<u64> {
        if updates.is_empty() {
            return Ok(0);
        }
        let mut conn = self.get_conn().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| transaction_failed("item_update_batch", e))?;
        let stmt = tx
            .prepare(
                "UPDATE questions SET
                    question = COALESCE($2, question),
                    answer = COALESCE($3, answer),
                    knowledge_point = COALESCE($4, knowledge_point)
                 WHERE id = $1",
            )
            .await
            .map_err(|e| transaction_failed("item_update_batch", e))?;

        for (id, update) in updates {
            let updated = tx
                .execute(
                    &stmt,
                    &[id, &update.question, &update.answer, &update.knowledge_point],
                )
                .await
                .map_err(|e| transaction_failed("item_update_batch", e))?;
            if updated == 0 {
                // Dropping the transaction rolls it back.
                return Err(StorageError::UpdateFailed {
                    entity_type: EntityType::Item,
                    id: id.to_string(),
                    reason: "item does not exist".to_string(),
                }
                .into());
            }
        }

        tx.commit()
            .await
            .map_err(|e| transaction_failed("item_update_batch", e))?;
        Ok(updates.len() as u64)
    }

    async fn item_clear_knowledge(&self) -> KnowPilotResult<u64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "WITH cleared AS (
                    UPDATE questions q SET knowledge_point = NULL
                    FROM questions previous
                    WHERE q.id = previous.id AND previous.knowledge_point IS NOT NULL
                    RETURNING previous.knowledge_point AS knowledge_point
                 )
                 SELECT COUNT(*) FROM cleared
                 WHERE btrim(knowledge_point) <> '' AND knowledge_point <> $1",
                &[&PENDING_PLACEHOLDER],
            )
            .await
            .map_err(|e| query_failed("item_clear_knowledge", e))?;
        let cleared: i64 = row
            .try_get(0)
            .map_err(|e| query_failed("item_clear_knowledge", e))?;
        Ok(cleared as u64)
    }

    // === Group Table Operations ===

    async fn group_table_describe(
        &self,
        schema: &GroupTableSchema,
    ) -> KnowPilotResult<Option<TableDescription>> {
        let conn = self.get_conn().await?;
        let table = schema.table_name();

        let column_rows = conn
            .query(
                "SELECT column_name::text FROM information_schema.columns
                 WHERE table_schema = current_schema() AND table_name = $1
                 ORDER BY ordinal_position",
                &[&table],
            )
            .await
            .map_err(|e| query_failed("group_table_describe", e))?;
        if column_rows.is_empty() {
            return Ok(None);
        }

        let key_rows = conn
            .query(
                "SELECT kcu.column_name::text
                 FROM information_schema.table_constraints tc
                 JOIN information_schema.key_column_usage kcu
                   ON tc.constraint_name = kcu.constraint_name
                  AND tc.table_schema = kcu.table_schema
                  AND tc.table_name = kcu.table_name
                 WHERE tc.constraint_type = 'PRIMARY KEY'
                   AND tc.table_schema = current_schema()
                   AND tc.table_name = $1
                 ORDER BY kcu.ordinal_position",
                &[&table],
            )
            .await
            .map_err(|e| query_failed("group_table_describe", e))?;

        let names = |rows: &[Row]| -> Result<Vec<String>, tokio_postgres::Error> {
            rows.iter().map(|r| r.try_get::<_, String>(0)).collect()
        };

        Ok(Some(TableDescription {
            table,
            columns: names(column_rows.as_slice()).map_err(|e| query_failed("group_table_describe", e))?,
            primary_key: names(key_rows.as_slice()).map_err(|e| query_failed("group_table_describe", e))?,
        }))
    }

    async fn group_table_create(&self, schema: &GroupTableSchema) -> KnowPilotResult<bool> {
        if self.group_table_describe(schema).await?.is_some() {
            return Ok(false);
        }
        let conn = self.get_conn().await?;
        conn.batch_execute(&create_group_table_sql(schema))
            .await
            .map_err(|e| StorageError::SchemaFailed {
                table: schema.table_name(),
                reason: db_reason("group_table_create", &e),
            })?;
        Ok(true)
    }

    async fn group_row_count(&self, schema: &GroupTableSchema) -> KnowPilotResult<u64> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&schema.table_name()));
        let row = conn.query_one(&sql, &[]).await.map_err(|e| {
            if is_undefined_table(&e) {
                table_missing(schema)
            } else {
                query_failed("group_row_count", e)
            }
        })?;
        let count: i64 = row
            .try_get(0)
            .map_err(|e| query_failed("group_row_count", e))?;
        Ok(count as u64)
    }

    async fn group_rows_list(&self, schema: &GroupTableSchema) -> KnowPilotResult<Vec<GroupRow>> {
        let description = self
            .group_table_describe(schema)
            .await?
            .ok_or_else(|| table_missing(schema))?;
        if !description.columns.iter().any(|c| c == "id") {
            return Err(StorageError::SchemaFailed {
                table: description.table,
                reason: "table has no id column".to_string(),
            }
            .into());
        }

        let stored = StoredGroupColumns::from_description(&description);
        let conn = self.get_conn().await?;
        let rows = conn
            .query(&stored.select_sql(&description.table), &[])
            .await
            .map_err(|e| query_failed("group_rows_list", e))?;
        rows.iter()
            .map(|row| stored.row(row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| query_failed("group_rows_list", e))
    }

    async fn group_rows_insert_batch(
        &self,
        schema: &GroupTableSchema,
        groups: &[Vec<String>],
    ) -> KnowPilotResult<u64> {
        if let Some(oversized) = groups.iter().find(|g| g.len() > schema.k()) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::GroupRow,
                reason: format!(
                    "group of {} does not fit {} content columns",
                    oversized.len(),
                    schema.k()
                ),
            }
            .into());
        }
        if groups.is_empty() {
            return Ok(0);
        }

        let table = quote_ident(&schema.table_name());
        let content_columns = schema.content_columns();
        let now = Utc::now();

        let mut conn = self.get_conn().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| transaction_failed("group_rows_insert_batch", e))?;

        for group in groups {
            let mut columns: Vec<String> = content_columns[..group.len()]
                .iter()
                .map(|c| quote_ident(c))
                .collect();
            columns.push("created_at".to_string());
            columns.push("updated_at".to_string());
            let placeholders: Vec<String> = (1..=group.len() + 1).map(|i| format!("${}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({}, ${})",
                table,
                columns.join(", "),
                placeholders.join(", "),
                group.len() + 1
            );

            let mut params: Vec<&(dyn ToSql + Sync)> =
                group.iter().map(|s| s as &(dyn ToSql + Sync)).collect();
            params.push(&now);

            tx.execute(sql.as_str(), &params).await.map_err(|e| {
                if is_undefined_table(&e) {
                    table_missing(schema)
                } else {
                    transaction_failed("group_rows_insert_batch", e)
                }
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| transaction_failed("group_rows_insert_batch", e))?;
        Ok(groups.len() as u64)
    }

    async fn group_rows_update_batch(
        &self,
        schema: &GroupTableSchema,
        updates: &[GroupRowUpdate],
    ) -> KnowPilotResult<u64> {
        if updates.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE {} SET question = $1, correct_answer = $2, updated_at = $3 WHERE id = $4",
            quote_ident(&schema.table_name())
        );

        let mut conn = self.get_conn().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| transaction_failed("group_rows_update_batch", e))?;

        for update in updates {
            let updated = tx
                .execute(
                    sql.as_str(),
                    &[
                        &update.question,
                        &update.correct_answer,
                        &update.updated_at,
                        &update.row_id,
                    ],
                )
                .await
                .map_err(|e| {
                    if is_undefined_table(&e) {
                        table_missing(schema)
                    } else {
                        transaction_failed("group_rows_update_batch", e)
                    }
                })?;
            if updated == 0 {
                return Err(StorageError::UpdateFailed {
                    entity_type: EntityType::GroupRow,
                    id: update.row_id.to_string(),
                    reason: "row does not exist".to_string(),
                }
                .into());
            }
        }

        tx.commit()
            .await
            .map_err(|e| transaction_failed("group_rows_update_batch", e))?;
        Ok(updates.len() as u64)
    }

    // === Health ===

    async fn health_check(&self) -> KnowPilotResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| query_failed("health_check", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_group_table_sql() {
        let schema = GroupTableSchema::new(2).unwrap();
        assert_eq!(
            create_group_table_sql(&schema),
            "CREATE TABLE IF NOT EXISTS \"content_group_2\" (\"id\" BIGSERIAL PRIMARY KEY, \
             \"content1\" TEXT, \"content2\" TEXT, \"question\" TEXT, \"correct_answer\" TEXT, \
             \"created_at\" TIMESTAMPTZ, \"updated_at\" TIMESTAMPTZ)"
        );
    }

    #[test]
    fn test_stored_columns_sorted_by_ordinal() {
        let description = TableDescription {
            table: "content_group_3".to_string(),
            columns: vec![
                "id".to_string(),
                "content10".to_string(),
                "content2".to_string(),
                "content1".to_string(),
                "question".to_string(),
            ],
            primary_key: vec!["id".to_string()],
        };
        let stored = StoredGroupColumns::from_description(&description);
        let ordinals: Vec<usize> = stored.contents.iter().map(|(ordinal, _)| *ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 10]);
        assert_eq!(stored.contents[2].1, "content10");
        assert!(stored.has_question);
        assert!(!stored.has_correct_answer);

        let sql = stored.select_sql("content_group_3");
        assert!(sql.starts_with("SELECT id::bigint AS id, \"content1\"::text AS \"content1\""));
        assert!(sql.contains("question::text AS question"));
        assert!(!sql.contains("correct_answer"));
        assert!(sql.ends_with("FROM \"content_group_3\" ORDER BY id"));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_db_config_default() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "knowpilot");
        assert!(config.seed_sample_data);
    }
}
