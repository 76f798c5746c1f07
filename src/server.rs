//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::error::AnalysisError;
use crate::models::{AppConfig, ProcessingSettings};
use crate::services::{
    AnalysisService, Batch, BatchScheduler, HttpAnalysisClient, ImagePipeline, ItemProcessor,
    KnowledgeProvider, SharedBatch, StampKnowledge,
};

/// Largest accepted request body. Uploads are base64 JSON.
pub const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub type SharedSettings = Arc<RwLock<ProcessingSettings>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub batch: SharedBatch,
    pub scheduler: Arc<BatchScheduler>,
    pub settings: SharedSettings,
    pub config: Arc<AppConfig>,
}

impl FromRef<AppState> for SharedBatch {
    fn from_ref(state: &AppState) -> Self {
        state.batch.clone()
    }
}

impl FromRef<AppState> for Arc<BatchScheduler> {
    fn from_ref(state: &AppState) -> Self {
        state.scheduler.clone()
    }
}

impl FromRef<AppState> for SharedSettings {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Build the analysis client the config asks for, if any.
///
/// A knowledge base that fails to load is logged and left out; analysis
/// still runs without hints.
pub fn analysis_from_config(
    config: &AppConfig,
) -> Result<Option<Arc<dyn AnalysisService>>, AnalysisError> {
    let client = match HttpAnalysisClient::from_config(&config.analysis) {
        Ok(client) => client,
        Err(AnalysisError::NotConfigured) => {
            tracing::info!("No analysis endpoint configured, analysis disabled");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let knowledge = match &config.analysis.knowledge_file {
        Some(path) => StampKnowledge::from_file(path),
        None => StampKnowledge::builtin(),
    };
    if let Err(e) = knowledge.initialize() {
        tracing::warn!(error = %e, "Stamp knowledge unavailable");
    }

    tracing::info!(endpoint = client.endpoint(), "Analysis service configured");
    Ok(Some(Arc::new(client.with_knowledge(Arc::new(knowledge)))))
}

/// Create application state with the production pipeline and the analysis
/// client from `config`.
pub fn create_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let analyzer = analysis_from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to create analysis client: {e}"))?;
    Ok(create_app_state_with(
        config,
        Arc::new(ImagePipeline::new()),
        analyzer,
    ))
}

/// Create application state around explicit collaborators.
pub fn create_app_state_with(
    config: AppConfig,
    processor: Arc<dyn ItemProcessor>,
    analyzer: Option<Arc<dyn AnalysisService>>,
) -> AppState {
    let mut scheduler = BatchScheduler::new(config.scheduler.concurrency, processor);
    if let Some(analyzer) = analyzer {
        scheduler = scheduler.with_analyzer(analyzer);
    }

    AppState {
        batch: Batch::new(config.batch.max_items).into_shared(),
        scheduler: Arc::new(scheduler),
        settings: Arc::new(RwLock::new(config.processing.clone())),
        config: Arc::new(config),
    }
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Items
        .route(
            "/api/items",
            get(api::list_items)
                .post(api::upload_items)
                .delete(api::clear_items),
        )
        .route(
            "/api/items/:id",
            get(api::get_item).delete(api::delete_item),
        )
        .route("/api/items/:id/edits", put(api::update_edits))
        .route("/api/items/:id/retry", post(api::retry_item))
        .route("/api/items/:id/image", get(api::get_item_image))
        .route("/api/items/:id/blobs", get(api::detect_item_blobs))
        .route("/api/items/:id/split", post(api::split_item))
        // Batch passes
        .route("/api/batch/process", post(api::process_batch))
        .route("/api/batch/analyze", post(api::analyze_batch))
        .route("/api/batch/export", get(api::export_batch))
        // Settings
        .route(
            "/api/settings",
            get(api::get_settings).put(api::update_settings),
        )
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Add state and tracing
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
}
