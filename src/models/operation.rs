use chrono::{DateTime, Utc};
use serde::Serialize;

/// A transform that was actually applied, with its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "params", rename_all = "lowercase")]
pub enum OperationKind {
    Expand {
        percentage: f64,
        width: u32,
        height: u32,
    },
    Rotate {
        degrees: f64,
        width: u32,
        height: u32,
    },
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Enhance {
        brightness: f32,
        contrast: f32,
        saturation: f32,
    },
}

/// Operation log entry.
///
/// Serializes as `{"type": ..., "params": {...}, "timestamp": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    #[serde(flatten)]
    pub kind: OperationKind,
    pub timestamp: DateTime<Utc>,
}

impl Operation {
    pub fn now(kind: OperationKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            OperationKind::Expand { .. } => "expand",
            OperationKind::Rotate { .. } => "rotate",
            OperationKind::Crop { .. } => "crop",
            OperationKind::Enhance { .. } => "enhance",
        }
    }
}
