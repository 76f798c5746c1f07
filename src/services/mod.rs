pub mod analysis_client;
pub mod auto_detect;
pub mod batch;
pub mod codec;
pub mod content_hash;
pub mod export;
pub mod knowledge;
pub mod pipeline;
pub mod scheduler;

pub use analysis_client::{AnalysisRequest, AnalysisService, HttpAnalysisClient};
pub use batch::{Batch, SharedBatch};
pub use content_hash::compute_content_hash;
pub use knowledge::{KnowledgeProvider, StampKnowledge};
pub use pipeline::{ImagePipeline, ItemProcessor};
pub use scheduler::{BatchScheduler, PassKind, PassReport};
