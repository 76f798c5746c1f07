use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::models::{AnalysisMode, AppConfig, ExportRecord};
use crate::server::SharedSettings;
use crate::services::{BatchScheduler, PassReport, SharedBatch};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AnalyzeParams {
    /// Overrides `analysis.mode` from the config
    pub mode: Option<AnalysisMode>,
}

/// Run a transform pass over pending and errored items
///
/// Returns once every eligible item has settled.
#[utoipa::path(
    post,
    path = "/api/batch/process",
    responses(
        (status = 200, description = "Pass finished", body = PassReport),
    ),
    tag = "Batch"
)]
pub async fn process_batch(
    State(batch): State<SharedBatch>,
    State(scheduler): State<Arc<BatchScheduler>>,
    State(settings): State<SharedSettings>,
) -> Json<PassReport> {
    let settings = settings.read().await.clone();
    Json(scheduler.process_pending(&batch, &settings).await)
}

/// Run an analysis pass over completed items that have no result yet
#[utoipa::path(
    post,
    path = "/api/batch/analyze",
    params(AnalyzeParams),
    responses(
        (status = 200, description = "Pass finished", body = PassReport),
        (status = 503, description = "No analysis service configured"),
    ),
    tag = "Batch"
)]
pub async fn analyze_batch(
    State(batch): State<SharedBatch>,
    State(scheduler): State<Arc<BatchScheduler>>,
    State(config): State<Arc<AppConfig>>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<PassReport>, ApiError> {
    let mode = params.mode.unwrap_or(config.analysis.mode);
    let report = scheduler.analyze_completed(&batch, mode).await?;
    Ok(Json(report))
}

/// Export records for every completed item, in batch order
#[utoipa::path(
    get,
    path = "/api/batch/export",
    responses(
        (status = 200, description = "Export records", content_type = "application/json"),
    ),
    tag = "Batch"
)]
pub async fn export_batch(State(batch): State<SharedBatch>) -> Json<Vec<ExportRecord>> {
    Json(batch.read().await.export_records())
}
