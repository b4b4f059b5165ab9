//! KnowPilot API Server Entry Point
//!
//! Loads configuration, prepares the database schema and starts the Axum
//! HTTP server.

use std::sync::Arc;

use axum::Router;
use knowpilot_api::telemetry::{init_tracer, TelemetryConfig};
use knowpilot_api::{
    create_api_router, load_knowpilot_config, serve, shutdown_signal, ApiConfig, ApiError,
    ApiResult, AppState, DbClient, DbConfig,
};
use knowpilot_llm::{GenerationProvider, OllamaGenerationProvider};
use knowpilot_storage::ContentStorage;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracer(&telemetry_config)?;

    let config = load_knowpilot_config()
        .map_err(|e| ApiError::internal_error(format!("Invalid configuration: {}", e)))?;
    let config = Arc::new(config);

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;
    let created = db.migrate(db_config.seed_sample_data).await?;
    tracing::info!(
        pool_max_size = db.pool_max_size(),
        schema_created = created,
        "Database ready"
    );

    let provider = OllamaGenerationProvider::from_settings(&config.generation);
    if let Err(e) = provider.health_check().await {
        // Enrichment endpoints fail with 503 until the model is pulled.
        tracing::warn!(error = %e, "Generation model not available at startup");
    }

    let storage: Arc<dyn ContentStorage> = Arc::new(db);
    let provider: Arc<dyn GenerationProvider> = Arc::new(provider);
    let state = AppState::new(storage, provider, config);

    let api_config = ApiConfig::from_env();
    let app: Router = create_api_router(state, &api_config);

    let addr = api_config
        .bind_addr()
        .map_err(|e| ApiError::invalid_input(e.to_string()))?;
    tracing::info!(%addr, "Starting KnowPilot API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    serve(listener, app, shutdown_signal()).await?;
    tracing::info!("Server stopped");

    Ok(())
}
