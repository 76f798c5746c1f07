//! Per-item transform pipeline: decode, expand, rotate, crop, enhance, encode.

use async_trait::async_trait;
use canvas_ops::{self as ops, CanvasError, RasterBuffer, Rectangle};

use crate::error::PipelineError;
use crate::models::{CropRegion, EditPlan, Operation, OperationKind, ProcessingSettings};
use crate::services::batch::{TransformJob, TransformOutput};
use crate::services::codec;

/// Work performed for one item in a transform pass
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    async fn process(
        &self,
        job: TransformJob,
        settings: &ProcessingSettings,
    ) -> Result<TransformOutput, PipelineError>;
}

/// Production processor backed by canvas-ops
#[derive(Debug, Default, Clone, Copy)]
pub struct ImagePipeline;

impl ImagePipeline {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ItemProcessor for ImagePipeline {
    async fn process(
        &self,
        job: TransformJob,
        settings: &ProcessingSettings,
    ) -> Result<TransformOutput, PipelineError> {
        let raster = codec::decode(job.source.bytes.clone(), &job.source.mime_type).await?;

        let settings = settings.clone();
        let edits = job.edits;
        let (raster, operations) =
            tokio::task::spawn_blocking(move || apply_transforms(raster, &settings, &edits))
                .await??;

        let (width, height) = (raster.width(), raster.height());
        let png = codec::encode(raster).await?;

        tracing::debug!(
            item = %job.id,
            width,
            height,
            operations = operations.len(),
            "Transforms applied"
        );

        Ok(TransformOutput {
            png,
            width,
            height,
            operations,
        })
    }
}

fn saturate(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

/// Clamp an editor crop region into the buffer.
pub fn resolve_crop(region: &CropRegion, buffer: &RasterBuffer) -> Result<Rectangle, CanvasError> {
    Rectangle::clamp_to(
        region.x,
        region.y,
        region.width,
        region.height,
        buffer.width(),
        buffer.height(),
    )
    .ok_or(CanvasError::OutOfBounds {
        rect: Rectangle::new(
            saturate(region.x),
            saturate(region.y),
            saturate(region.width),
            saturate(region.height),
        ),
        width: buffer.width(),
        height: buffer.height(),
    })
}

/// Apply the enabled transforms in the fixed order expand, rotate, crop,
/// enhance. Each transform that actually runs appends one operation.
pub fn apply_transforms(
    mut raster: RasterBuffer,
    settings: &ProcessingSettings,
    edits: &EditPlan,
) -> Result<(RasterBuffer, Vec<Operation>), CanvasError> {
    let mut operations = Vec::new();

    if settings.expand_before_crop && settings.expansion_percentage > 0.0 {
        raster = ops::expand(&raster, settings.expansion_percentage)?;
        operations.push(Operation::now(OperationKind::Expand {
            percentage: settings.expansion_percentage,
            width: raster.width(),
            height: raster.height(),
        }));
    }

    if !edits.rotation.is_finite() {
        return Err(CanvasError::NonFiniteAngle(edits.rotation));
    }
    if edits.rotation.rem_euclid(360.0) != 0.0 {
        raster = ops::rotate(&raster, edits.rotation)?;
        operations.push(Operation::now(OperationKind::Rotate {
            degrees: edits.rotation,
            width: raster.width(),
            height: raster.height(),
        }));
    }

    if let Some(region) = &edits.crop {
        let rect = resolve_crop(region, &raster)?;
        if rect != raster.bounds() {
            raster = ops::crop(&raster, rect)?;
            operations.push(Operation::now(OperationKind::Crop {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            }));
        }
    }

    if settings.auto_enhance {
        raster = ops::enhance(&raster);
        operations.push(Operation::now(OperationKind::Enhance {
            brightness: ops::BRIGHTNESS,
            contrast: ops::CONTRAST,
            saturation: ops::SATURATION,
        }));
    }

    Ok((raster, operations))
}
