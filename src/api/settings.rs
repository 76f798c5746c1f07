use axum::{extract::State, response::Json};

use crate::error::{ApiError, PipelineError};
use crate::models::ProcessingSettings;
use crate::server::SharedSettings;

/// Current processing settings
#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Processing settings", body = ProcessingSettings),
    ),
    tag = "Settings"
)]
pub async fn get_settings(State(settings): State<SharedSettings>) -> Json<ProcessingSettings> {
    Json(settings.read().await.clone())
}

/// Replace the processing settings
///
/// Applies to the next transform pass. A pass already running keeps the
/// settings it started with.
#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = ProcessingSettings,
    responses(
        (status = 200, description = "Settings stored", body = ProcessingSettings),
        (status = 400, description = "Value out of range"),
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    State(settings): State<SharedSettings>,
    Json(update): Json<ProcessingSettings>,
) -> Result<Json<ProcessingSettings>, ApiError> {
    update.validate().map_err(PipelineError::from)?;
    tracing::info!(
        auto_enhance = update.auto_enhance,
        expand_before_crop = update.expand_before_crop,
        expansion_percentage = update.expansion_percentage,
        "Processing settings updated"
    );
    *settings.write().await = update.clone();
    Ok(Json(update))
}
