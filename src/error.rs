use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use canvas_ops::CanvasError;
use serde_json::json;
use thiserror::Error;

use crate::models::ErrorKind;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures inside the batch pipeline.
///
/// Everything except [`CapacityExceeded`](Self::CapacityExceeded) and
/// [`Config`](Self::Config) is caught per item by the scheduler and recorded
/// on that item.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Geometry error: {0}")]
    Geometry(#[from] CanvasError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error(
        "Batch capacity exceeded: {requested} requested, {available} of {capacity} slots available"
    )]
    CapacityExceeded {
        requested: usize,
        available: usize,
        capacity: usize,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Task failed: {0}")]
    Task(String),
}

impl PipelineError {
    /// Item-level classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Geometry(_) => ErrorKind::Geometry,
            PipelineError::Decode(_) => ErrorKind::Decode,
            PipelineError::Encode(_) => ErrorKind::Encode,
            PipelineError::Analysis(_) => ErrorKind::Analysis,
            PipelineError::CapacityExceeded { .. }
            | PipelineError::Config(_)
            | PipelineError::Task(_) => ErrorKind::Internal,
        }
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        PipelineError::Task(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Analysis service not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Analysis service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Knowledge base error: {0}")]
    Knowledge(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Network(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Pipeline(PipelineError::CapacityExceeded { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ApiError::Pipeline(PipelineError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(PipelineError::Config(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pipeline(PipelineError::Analysis(AnalysisError::NotConfigured)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Pipeline(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
