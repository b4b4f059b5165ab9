//! KnowPilot API - REST Layer
//!
//! Axum endpoints for item enrichment (question/answer and knowledge point
//! generation through Ollama) and for the `content_group_{k}` quiz tables,
//! backed by PostgreSQL.

pub mod config;
pub mod db;
pub mod error;
pub mod macros;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{load_knowpilot_config, ApiConfig};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use server::{serve, shutdown_signal};
pub use services::{BulkOptions, EnrichmentService, GroupingService};
pub use state::AppState;
pub use types::*;
