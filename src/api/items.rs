use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::models::{
    AnalysisPhase, AppConfig, BatchItem, EditPlan, ItemError, ItemId, ItemStatus, Upload,
};
use crate::services::{auto_detect, codec, SharedBatch};

/// Compact view of a batch item
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemSummary {
    pub id: String,
    pub filename: String,
    pub mime_type: String,
    pub status: ItemStatus,
    pub analysis_phase: AnalysisPhase,
    /// SHA-256 of the uploaded bytes
    pub content_hash: String,
    /// True when an earlier item has the same content hash
    pub is_duplicate: bool,
    pub operation_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ItemError>,
    /// RFC 3339 creation time
    pub created_at: String,
}

impl From<&BatchItem> for ItemSummary {
    fn from(item: &BatchItem) -> Self {
        Self {
            id: item.id.to_string(),
            filename: item.source.filename.clone(),
            mime_type: item.source.mime_type.clone(),
            status: item.status,
            analysis_phase: item.analysis_phase,
            content_hash: item.content_hash.clone(),
            is_duplicate: item.is_duplicate,
            operation_count: item.operations.len(),
            width: item.output.as_ref().map(|o| o.width),
            height: item.output.as_ref().map(|o| o.height),
            error: item.error.clone(),
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

/// Full view of a batch item
#[derive(Debug, Serialize, ToSchema)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub summary: ItemSummary,
    pub edits: EditPlan,
    /// Applied transforms, oldest first
    #[schema(value_type = Vec<Object>)]
    pub operations: Vec<crate::models::Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub analysis: Option<crate::models::AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,
}

impl From<&BatchItem> for ItemDetail {
    fn from(item: &BatchItem) -> Self {
        Self {
            summary: item.into(),
            edits: item.edits.clone(),
            operations: item.operations.clone(),
            analysis: item.analysis.clone(),
            analysis_error: item.analysis_error.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<ItemSummary>,
    pub count: usize,
    pub capacity: usize,
}

/// One file in an upload request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadFile {
    pub filename: String,
    /// Defaults to the type implied by the filename extension
    #[serde(default, alias = "mimeType")]
    pub mime_type: Option<String>,
    /// Standard base64 of the file bytes
    pub data: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadRequest {
    pub files: Vec<UploadFile>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemIds {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearResponse {
    pub removed: usize,
}

/// Detected object bounds in image pixels
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegionList {
    pub regions: Vec<Region>,
}

fn ids(ids: Vec<ItemId>) -> ItemIds {
    ItemIds {
        ids: ids.into_iter().map(|id| id.to_string()).collect(),
    }
}

fn decode_upload(file: UploadFile) -> Result<Upload, ApiError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(file.data.trim())
        .map_err(|e| ApiError::BadRequest(format!("{}: invalid base64: {e}", file.filename)))?;
    let mime_type = match file.mime_type {
        Some(m) if !m.trim().is_empty() => m,
        _ => codec::mime_for_path(std::path::Path::new(&file.filename)).to_string(),
    };
    Ok(Upload::new(file.filename, mime_type, bytes))
}

/// Clone an item out of the batch so async work can run without the lock.
async fn snapshot(batch: &SharedBatch, id: &ItemId) -> Result<BatchItem, ApiError> {
    batch
        .read()
        .await
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))
}

/// List items in batch order
#[utoipa::path(
    get,
    path = "/api/items",
    responses(
        (status = 200, description = "Items in batch order", body = ItemList),
    ),
    tag = "Items"
)]
pub async fn list_items(State(batch): State<SharedBatch>) -> Json<ItemList> {
    let batch = batch.read().await;
    Json(ItemList {
        items: batch.items().iter().map(ItemSummary::from).collect(),
        count: batch.len(),
        capacity: batch.capacity(),
    })
}

/// Add images to the batch
///
/// Every file becomes a pending item. If the batch cannot take all of them,
/// none is added.
#[utoipa::path(
    post,
    path = "/api/items",
    request_body = UploadRequest,
    responses(
        (status = 201, description = "Items created", body = ItemIds),
        (status = 400, description = "Invalid base64 or empty request"),
        (status = 413, description = "Batch capacity exceeded"),
    ),
    tag = "Items"
)]
pub async fn upload_items(
    State(batch): State<SharedBatch>,
    Json(request): Json<UploadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.files.is_empty() {
        return Err(ApiError::BadRequest("no files in request".to_string()));
    }
    let uploads = request
        .files
        .into_iter()
        .map(decode_upload)
        .collect::<Result<Vec<_>, _>>()?;
    let count = uploads.len();

    let created = batch.write().await.add(uploads)?;
    tracing::info!(count, "Items uploaded");
    Ok((StatusCode::CREATED, Json(ids(created))))
}

/// Remove every item
#[utoipa::path(
    delete,
    path = "/api/items",
    responses(
        (status = 200, description = "Batch cleared", body = ClearResponse),
    ),
    tag = "Items"
)]
pub async fn clear_items(State(batch): State<SharedBatch>) -> Json<ClearResponse> {
    let removed = batch.write().await.clear();
    tracing::info!(removed, "Batch cleared");
    Json(ClearResponse { removed })
}

/// Get one item with its operation log and analysis
#[utoipa::path(
    get,
    path = "/api/items/{id}",
    responses(
        (status = 200, description = "Item", body = ItemDetail),
        (status = 404, description = "Unknown item"),
    ),
    params(("id" = String, Path, description = "Item id")),
    tag = "Items"
)]
pub async fn get_item(
    State(batch): State<SharedBatch>,
    Path(id): Path<String>,
) -> Result<Json<ItemDetail>, ApiError> {
    let item = snapshot(&batch, &ItemId::new(id)).await?;
    Ok(Json(ItemDetail::from(&item)))
}

/// Remove one item
#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "Unknown item"),
    ),
    params(("id" = String, Path, description = "Item id")),
    tag = "Items"
)]
pub async fn delete_item(
    State(batch): State<SharedBatch>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ItemId::new(id);
    batch
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Set rotation and crop for an item that has not been processed
#[utoipa::path(
    put,
    path = "/api/items/{id}/edits",
    request_body = EditPlan,
    responses(
        (status = 200, description = "Edits stored", body = ItemSummary),
        (status = 404, description = "Unknown item"),
        (status = 409, description = "Item already processing or completed"),
    ),
    params(("id" = String, Path, description = "Item id")),
    tag = "Items"
)]
pub async fn update_edits(
    State(batch): State<SharedBatch>,
    Path(id): Path<String>,
    Json(edits): Json<EditPlan>,
) -> Result<Json<ItemSummary>, ApiError> {
    if !edits.rotation.is_finite() {
        return Err(ApiError::BadRequest("rotation must be finite".to_string()));
    }
    let id = ItemId::new(id);
    let mut batch = batch.write().await;
    batch.set_edits(&id, edits)?;
    let item = batch
        .get(&id)
        .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))?;
    Ok(Json(ItemSummary::from(item)))
}

/// Re-submit an errored item as a fresh pending item
#[utoipa::path(
    post,
    path = "/api/items/{id}/retry",
    responses(
        (status = 200, description = "New item id", body = ItemIds),
        (status = 404, description = "Unknown item"),
        (status = 409, description = "Item is not in error state"),
    ),
    params(("id" = String, Path, description = "Item id")),
    tag = "Items"
)]
pub async fn retry_item(
    State(batch): State<SharedBatch>,
    Path(id): Path<String>,
) -> Result<Json<ItemIds>, ApiError> {
    let new_id = batch.write().await.retry(&ItemId::new(id))?;
    Ok(Json(ids(vec![new_id])))
}

/// Item image: the processed PNG once completed, the original upload before
#[utoipa::path(
    get,
    path = "/api/items/{id}/image",
    responses(
        (status = 200, description = "Image bytes", content_type = "image/png"),
        (status = 404, description = "Unknown item"),
    ),
    params(("id" = String, Path, description = "Item id")),
    tag = "Items"
)]
pub async fn get_item_image(
    State(batch): State<SharedBatch>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let item = snapshot(&batch, &ItemId::new(id)).await?;
    let (bytes, mime_type) = match &item.output {
        Some(output) => (output.png.clone(), codec::PNG_MIME.to_string()),
        None => (item.source.bytes.clone(), item.source.mime_type.clone()),
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime_type),
            (header::CONTENT_LENGTH, bytes.len().to_string()),
        ],
        Bytes::copy_from_slice(&bytes),
    )
        .into_response())
}

/// Detect separate objects on the uploaded image of an item
#[utoipa::path(
    get,
    path = "/api/items/{id}/blobs",
    responses(
        (status = 200, description = "Detected regions in scan order", body = RegionList),
        (status = 404, description = "Unknown item"),
        (status = 422, description = "Image could not be decoded"),
    ),
    params(("id" = String, Path, description = "Item id")),
    tag = "Items"
)]
pub async fn detect_item_blobs(
    State(batch): State<SharedBatch>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<String>,
) -> Result<Json<RegionList>, ApiError> {
    let item = snapshot(&batch, &ItemId::new(id)).await?;
    let (image, mime_type) = auto_detect::detection_input(&item);
    let rects = auto_detect::detect_regions(image, mime_type, config.detection.options()).await?;

    Ok(Json(RegionList {
        regions: rects
            .into_iter()
            .map(|r| Region {
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
            })
            .collect(),
    }))
}

/// Replace an item with one pending item per object on its uploaded image
///
/// A completed item is re-based: its parts are cut from the upload and go
/// through the pipeline again.
#[utoipa::path(
    post,
    path = "/api/items/{id}/split",
    responses(
        (status = 200, description = "Ids of the new items", body = ItemIds),
        (status = 400, description = "No objects detected"),
        (status = 404, description = "Unknown item"),
        (status = 409, description = "Item is processing"),
        (status = 413, description = "Batch capacity exceeded"),
    ),
    params(("id" = String, Path, description = "Item id")),
    tag = "Items"
)]
pub async fn split_item(
    State(batch): State<SharedBatch>,
    State(config): State<Arc<AppConfig>>,
    Path(id): Path<String>,
) -> Result<Json<ItemIds>, ApiError> {
    let id = ItemId::new(id);
    let item = snapshot(&batch, &id).await?;
    if item.status == ItemStatus::Processing {
        return Err(ApiError::InvalidState(format!("item {id} is processing")));
    }

    let parts = auto_detect::split_item(&item, config.detection.options()).await?;
    let created = batch.write().await.split(&id, parts)?;
    tracing::info!(item = %id, parts = created.len(), "Item split");
    Ok(Json(ids(created)))
}
