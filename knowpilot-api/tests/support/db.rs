use knowpilot_api::db::{DbClient, DbConfig};

pub async fn test_db_client() -> DbClient {
    let config = DbConfig::from_env();
    let db = DbClient::from_config(&config).expect("Failed to create database client");
    db.migrate(false).await.expect("Failed to migrate test database");
    db
}

/// Run raw SQL against the test database, for shapes the client never creates.
pub async fn execute_raw(sql: &str) {
    let pool = DbConfig::from_env()
        .create_pool()
        .expect("Failed to create pool");
    let client = pool.get().await.expect("Failed to get connection");
    client.batch_execute(sql).await.expect("Raw SQL failed");
}
