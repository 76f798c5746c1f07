pub mod analysis;
pub mod config;
pub mod export;
pub mod item;
pub mod operation;

pub use analysis::{AnalysisMode, AnalysisResult, CollectibleDetails, ParsedAnalysis, ValueRange};
pub use config::{
    AnalysisConfig, AppConfig, BatchConfig, DetectionConfig, ProcessingSettings, SchedulerConfig,
};
pub use export::{ExportRecord, MetadataValue};
pub use item::{
    AnalysisPhase, BatchItem, CropRegion, EditPlan, ErrorKind, ItemError, ItemId, ItemStatus,
    ProcessedOutput, SourceImage, Upload,
};
pub use operation::{Operation, OperationKind};
