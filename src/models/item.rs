use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AnalysisResult, Operation};
use crate::error::PipelineError;
use crate::services::content_hash::compute_content_hash;

/// Batch item identifier: 12 upper-case hex characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn generate() -> Self {
        use rand::Rng;
        let bytes: [u8; 6] = rand::thread_rng().gen();
        Self(hex::encode_upper(bytes))
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transform lifecycle of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

/// Analysis sub-phase, tracked separately from [`ItemStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPhase {
    #[default]
    Idle,
    Analyzing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Geometry,
    Decode,
    Encode,
    Analysis,
    Internal,
}

/// Error recorded on a single item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for ItemError {
    fn from(e: &PipelineError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

/// A raw file handed to the batch
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Original upload, kept unchanged for the life of the item
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceImage {
    /// Filename without its extension.
    pub fn stem(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }
}

/// Finished transform output, always PNG
#[derive(Debug, Clone)]
pub struct ProcessedOutput {
    pub png: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
}

/// Crop region as chosen in the editor.
///
/// Coordinates are signed and may reach outside the image; the pipeline
/// clamps them to the buffer before cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CropRegion {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Per-item editor choices
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct EditPlan {
    /// Clockwise rotation in degrees
    #[serde(default)]
    pub rotation: f64,

    /// Crop in the coordinates of the expanded and rotated image
    #[serde(default)]
    pub crop: Option<CropRegion>,
}

/// One image in the batch
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub id: ItemId,
    pub source: SourceImage,
    pub content_hash: String,
    pub is_duplicate: bool,
    pub status: ItemStatus,
    pub operations: Vec<Operation>,
    pub output: Option<ProcessedOutput>,
    pub edits: EditPlan,
    pub analysis: Option<AnalysisResult>,
    pub analysis_phase: AnalysisPhase,
    pub analysis_error: Option<String>,
    pub error: Option<ItemError>,
    pub created_at: DateTime<Utc>,
}

impl BatchItem {
    /// Create a pending item, hashing the upload bytes.
    pub fn new(upload: Upload) -> Self {
        let content_hash = compute_content_hash(&upload.bytes);
        Self::from_source(
            SourceImage {
                filename: upload.filename,
                mime_type: upload.mime_type,
                bytes: upload.bytes.into(),
            },
            content_hash,
        )
    }

    /// Fresh pending item for an existing source. Used by retry.
    pub(crate) fn from_source(source: SourceImage, content_hash: String) -> Self {
        Self {
            id: ItemId::generate(),
            source,
            content_hash,
            is_duplicate: false,
            status: ItemStatus::Pending,
            operations: Vec::new(),
            output: None,
            edits: EditPlan::default(),
            analysis: None,
            analysis_phase: AnalysisPhase::Idle,
            analysis_error: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Eligible for the next transform pass.
    pub fn needs_transform(&self) -> bool {
        matches!(self.status, ItemStatus::Pending | ItemStatus::Error)
    }

    /// Eligible for the next analysis pass.
    pub fn needs_analysis(&self) -> bool {
        self.status == ItemStatus::Completed
            && self.analysis.is_none()
            && self.analysis_phase != AnalysisPhase::Analyzing
            && self.output.is_some()
    }
}
