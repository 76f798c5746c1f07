//! Owned batch of items and its mutation methods.
//!
//! Status transitions happen only through `begin_*` and `apply_*`, which the
//! scheduler calls from its coordinating task. Everything else (add, remove,
//! clear, retry, split, edits) changes membership or pending-item input.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{AnalysisError, ApiError, PipelineError};
use crate::models::{
    AnalysisMode, AnalysisPhase, AnalysisResult, BatchItem, EditPlan, ExportRecord, ItemError,
    ItemId, ItemStatus, Operation, ProcessedOutput, SourceImage, Upload,
};
use crate::services::content_hash::flag_duplicates;
use crate::services::export::build_records;

/// Default hard item cap
pub const DEFAULT_CAPACITY: usize = 100;

pub type SharedBatch = Arc<RwLock<Batch>>;

/// Input for one transform job, owned so the job can run off the lock
#[derive(Debug, Clone)]
pub struct TransformJob {
    pub id: ItemId,
    pub source: SourceImage,
    pub edits: EditPlan,
}

/// Result of a successful transform job
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub operations: Vec<Operation>,
}

/// Input for one analysis job
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub id: ItemId,
    pub image: Arc<[u8]>,
    pub mime_type: String,
    pub mode: AnalysisMode,
}

#[derive(Debug)]
pub struct Batch {
    items: Vec<BatchItem>,
    capacity: usize,
}

impl Default for Batch {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Batch {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn into_shared(self) -> SharedBatch {
        Arc::new(RwLock::new(self))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&BatchItem> {
        self.items.iter().find(|i| &i.id == id)
    }

    fn get_mut(&mut self, id: &ItemId) -> Option<&mut BatchItem> {
        self.items.iter_mut().find(|i| &i.id == id)
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == id)
    }

    /// Number of items currently in `processing`.
    pub fn processing_count(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Processing)
            .count()
    }

    fn check_capacity(&self, requested: usize, freed: usize) -> Result<(), PipelineError> {
        let available = self.capacity.saturating_sub(self.items.len() - freed);
        if requested > available {
            return Err(PipelineError::CapacityExceeded {
                requested,
                available,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    fn fresh_id(&self) -> ItemId {
        loop {
            let id = ItemId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn new_items(&self, uploads: Vec<Upload>) -> Vec<BatchItem> {
        let mut items: Vec<BatchItem> = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let mut item = BatchItem::new(upload);
            while self.get(&item.id).is_some() || items.iter().any(|i| i.id == item.id) {
                item.id = ItemId::generate();
            }
            items.push(item);
        }
        items
    }

    /// Append uploads as pending items.
    ///
    /// Fails with [`PipelineError::CapacityExceeded`] before creating any
    /// item if the batch cannot take all of them.
    pub fn add(&mut self, uploads: Vec<Upload>) -> Result<Vec<ItemId>, PipelineError> {
        self.check_capacity(uploads.len(), 0)?;
        let items = self.new_items(uploads);
        let ids = items.iter().map(|i| i.id.clone()).collect();
        self.items.extend(items);
        flag_duplicates(&mut self.items);
        tracing::debug!(count = self.items.len(), "Items added to batch");
        Ok(ids)
    }

    /// Remove an item, releasing its buffers.
    pub fn remove(&mut self, id: &ItemId) -> Option<BatchItem> {
        let pos = self.position(id)?;
        let item = self.items.remove(pos);
        flag_duplicates(&mut self.items);
        tracing::debug!(item = %id, "Item removed from batch");
        Some(item)
    }

    /// Drop every item regardless of in-flight state. Returns how many were
    /// removed.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        tracing::debug!(removed = n, "Batch cleared");
        n
    }

    /// Re-submit an errored item as a fresh pending item in the same position.
    ///
    /// The new item gets a new id and an empty operation log but keeps the
    /// source and the edits.
    pub fn retry(&mut self, id: &ItemId) -> Result<ItemId, ApiError> {
        let pos = self
            .position(id)
            .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))?;
        let old = &self.items[pos];
        if old.status != ItemStatus::Error {
            return Err(ApiError::InvalidState(format!(
                "item {id} is not in error state"
            )));
        }

        let mut fresh = BatchItem::from_source(old.source.clone(), old.content_hash.clone());
        fresh.id = self.fresh_id();
        fresh.edits = old.edits.clone();
        let new_id = fresh.id.clone();
        self.items[pos] = fresh;
        flag_duplicates(&mut self.items);
        tracing::debug!(old = %id, new = %new_id, "Item re-submitted");
        Ok(new_id)
    }

    /// Replace the editor choices of an item that has not been processed yet.
    pub fn set_edits(&mut self, id: &ItemId, edits: EditPlan) -> Result<(), ApiError> {
        let item = self
            .get_mut(id)
            .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))?;
        if !item.needs_transform() {
            return Err(ApiError::InvalidState(format!(
                "item {id} is {:?}, edits can only change before processing",
                item.status
            )));
        }
        item.edits = edits;
        Ok(())
    }

    /// Replace an item with the parts cut out of it, in the same position.
    ///
    /// Capacity is checked against the batch without the original item, and
    /// nothing changes if the parts do not fit.
    pub fn split(&mut self, id: &ItemId, parts: Vec<Upload>) -> Result<Vec<ItemId>, ApiError> {
        let pos = self
            .position(id)
            .ok_or_else(|| ApiError::ItemNotFound(id.to_string()))?;
        if self.items[pos].status == ItemStatus::Processing {
            return Err(ApiError::InvalidState(format!("item {id} is processing")));
        }
        if parts.is_empty() {
            return Err(ApiError::BadRequest("no items detected".to_string()));
        }
        self.check_capacity(parts.len(), 1)?;

        let items = self.new_items(parts);
        let ids = items.iter().map(|i| i.id.clone()).collect();
        let _original: Vec<BatchItem> = self.items.splice(pos..=pos, items).collect();
        flag_duplicates(&mut self.items);
        tracing::debug!(item = %id, count = self.items.len(), "Item split");
        Ok(ids)
    }

    /// Export records for every completed item, in batch order.
    pub fn export_records(&self) -> Vec<ExportRecord> {
        build_records(&self.items)
    }

    // ---- Scheduler-driven transitions -------------------------------------

    pub fn transform_candidates(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|i| i.needs_transform())
            .map(|i| i.id.clone())
            .collect()
    }

    pub fn analysis_candidates(&self) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|i| i.needs_analysis())
            .map(|i| i.id.clone())
            .collect()
    }

    /// Mark an eligible item `processing` and hand out its job.
    pub fn begin_processing(&mut self, id: &ItemId) -> Option<TransformJob> {
        let item = self.get_mut(id)?;
        if !item.needs_transform() {
            return None;
        }
        item.status = ItemStatus::Processing;
        item.error = None;
        tracing::debug!(item = %id, "Item processing");
        Some(TransformJob {
            id: item.id.clone(),
            source: item.source.clone(),
            edits: item.edits.clone(),
        })
    }

    /// Record a transform result. Returns `false` if the item is gone or no
    /// longer processing, in which case the result is discarded.
    pub fn apply_transform(
        &mut self,
        id: &ItemId,
        result: Result<TransformOutput, PipelineError>,
    ) -> bool {
        let Some(item) = self.get_mut(id) else {
            tracing::debug!(item = %id, "Discarding transform result for removed item");
            return false;
        };
        if item.status != ItemStatus::Processing {
            tracing::debug!(item = %id, status = ?item.status, "Discarding stale transform result");
            return false;
        }

        match result {
            Ok(output) => {
                item.operations.extend(output.operations);
                item.output = Some(ProcessedOutput {
                    png: output.png.into(),
                    width: output.width,
                    height: output.height,
                });
                item.status = ItemStatus::Completed;
                tracing::debug!(item = %id, "Item completed");
            }
            Err(e) => {
                item.error = Some(ItemError::from(&e));
                item.status = ItemStatus::Error;
                tracing::debug!(item = %id, error = %e, "Item failed");
            }
        }
        true
    }

    /// Mark a completed item `analyzing` and hand out its job.
    pub fn begin_analysis(&mut self, id: &ItemId, mode: AnalysisMode) -> Option<AnalysisJob> {
        let item = self.get_mut(id)?;
        if !item.needs_analysis() {
            return None;
        }
        let output = item.output.as_ref()?;
        let job = AnalysisJob {
            id: item.id.clone(),
            image: output.png.clone(),
            mime_type: "image/png".to_string(),
            mode,
        };
        item.analysis_phase = AnalysisPhase::Analyzing;
        item.analysis_error = None;
        tracing::debug!(item = %id, "Item analyzing");
        Some(job)
    }

    /// Record an analysis result. Failure marks only the analysis phase; the
    /// transform output and `completed` status stay.
    pub fn apply_analysis(
        &mut self,
        id: &ItemId,
        result: Result<AnalysisResult, AnalysisError>,
    ) -> bool {
        let Some(item) = self.get_mut(id) else {
            tracing::debug!(item = %id, "Discarding analysis result for removed item");
            return false;
        };
        if item.analysis_phase != AnalysisPhase::Analyzing {
            tracing::debug!(item = %id, "Discarding stale analysis result");
            return false;
        }

        match result {
            Ok(analysis) => {
                item.analysis = Some(analysis);
                item.analysis_phase = AnalysisPhase::Done;
            }
            Err(e) => {
                item.analysis_error = Some(e.to_string());
                item.analysis_phase = AnalysisPhase::Failed;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorKind, OperationKind, ParsedAnalysis};

    fn upload(bytes: &[u8]) -> Upload {
        Upload::new("scan.png", "image/png", bytes.to_vec())
    }

    fn output() -> TransformOutput {
        TransformOutput {
            png: vec![1, 2, 3],
            width: 10,
            height: 20,
            operations: vec![Operation::now(OperationKind::Enhance {
                brightness: 1.1,
                contrast: 1.15,
                saturation: 1.2,
            })],
        }
    }

    fn completed_batch() -> (Batch, ItemId) {
        let mut batch = Batch::new(10);
        let id = batch.add(vec![upload(b"a")]).unwrap().remove(0);
        batch.begin_processing(&id).unwrap();
        assert!(batch.apply_transform(&id, Ok(output())));
        (batch, id)
    }

    fn flags(batch: &Batch) -> Vec<bool> {
        batch.items().iter().map(|i| i.is_duplicate).collect()
    }

    #[test]
    fn test_add_keeps_order_and_flags_duplicates() {
        let mut batch = Batch::new(10);
        let ids = batch
            .add(vec![upload(b"A"), upload(b"A"), upload(b"B"), upload(b"A")])
            .unwrap();
        assert_eq!(ids.len(), 4);
        let order: Vec<&ItemId> = batch.items().iter().map(|i| &i.id).collect();
        assert_eq!(order, ids.iter().collect::<Vec<_>>());
        assert_eq!(flags(&batch), vec![false, true, false, true]);

        batch.remove(&ids[0]).unwrap();
        assert_eq!(flags(&batch), vec![false, false, true]);
    }

    #[test]
    fn test_add_over_capacity_mutates_nothing() {
        let mut batch = Batch::new(3);
        batch.add(vec![upload(b"1"), upload(b"2")]).unwrap();
        let err = batch
            .add(vec![upload(b"3"), upload(b"4")])
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::CapacityExceeded {
                requested: 2,
                available: 1,
                capacity: 3
            }
        ));
        assert_eq!(batch.len(), 2);
        batch.add(vec![upload(b"3")]).unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_ids_unique() {
        let mut batch = Batch::new(100);
        batch
            .add((0..100).map(|i| upload(&[i as u8])).collect())
            .unwrap();
        let mut ids: Vec<&str> = batch.items().iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_clear_releases_all() {
        let mut batch = Batch::new(10);
        let ids = batch.add(vec![upload(b"a"), upload(b"b")]).unwrap();
        batch.begin_processing(&ids[0]).unwrap();
        assert_eq!(batch.clear(), 2);
        assert!(batch.is_empty());
        // Late result for a cleared item is a no-op
        assert!(!batch.apply_transform(&ids[0], Ok(output())));
    }

    #[test]
    fn test_transform_lifecycle() {
        let mut batch = Batch::new(10);
        let id = batch.add(vec![upload(b"a")]).unwrap().remove(0);
        assert_eq!(batch.transform_candidates(), vec![id.clone()]);

        let job = batch.begin_processing(&id).unwrap();
        assert_eq!(job.id, id);
        assert_eq!(batch.get(&id).unwrap().status, ItemStatus::Processing);
        assert_eq!(batch.processing_count(), 1);
        assert!(batch.transform_candidates().is_empty());
        assert!(batch.begin_processing(&id).is_none());

        assert!(batch.apply_transform(&id, Ok(output())));
        let item = batch.get(&id).unwrap();
        assert_eq!(item.status, ItemStatus::Completed);
        assert_eq!(item.operations.len(), 1);
        assert_eq!(item.output.as_ref().unwrap().width, 10);
        assert!(batch.transform_candidates().is_empty());
        assert_eq!(batch.analysis_candidates(), vec![id]);
    }

    #[test]
    fn test_transform_failure_recorded() {
        let mut batch = Batch::new(10);
        let id = batch.add(vec![upload(b"a")]).unwrap().remove(0);
        batch.begin_processing(&id).unwrap();
        assert!(batch.apply_transform(&id, Err(PipelineError::Decode("corrupt".into()))));

        let item = batch.get(&id).unwrap();
        assert_eq!(item.status, ItemStatus::Error);
        let error = item.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Decode);
        assert_eq!(error.message, "Decode error: corrupt");
        // Errored items are picked up by the next pass
        assert_eq!(batch.transform_candidates(), vec![id]);
    }

    #[test]
    fn test_stale_result_discarded() {
        let mut batch = Batch::new(10);
        let id = batch.add(vec![upload(b"a")]).unwrap().remove(0);
        // Never marked processing
        assert!(!batch.apply_transform(&id, Ok(output())));
        assert_eq!(batch.get(&id).unwrap().status, ItemStatus::Pending);
    }

    #[test]
    fn test_analysis_failure_keeps_completed() {
        let (mut batch, id) = completed_batch();
        let job = batch.begin_analysis(&id, AnalysisMode::General).unwrap();
        assert_eq!(&job.image[..], &[1u8, 2, 3]);
        assert_eq!(
            batch.get(&id).unwrap().analysis_phase,
            AnalysisPhase::Analyzing
        );
        assert!(batch.analysis_candidates().is_empty());

        assert!(batch.apply_analysis(&id, Err(AnalysisError::Network("timeout".into()))));
        let item = batch.get(&id).unwrap();
        assert_eq!(item.status, ItemStatus::Completed);
        assert_eq!(item.analysis_phase, AnalysisPhase::Failed);
        assert!(item.output.is_some());
        assert_eq!(
            item.analysis_error.as_deref(),
            Some("Network error: timeout")
        );
    }

    #[test]
    fn test_analysis_success() {
        let (mut batch, id) = completed_batch();
        batch.begin_analysis(&id, AnalysisMode::Stamps).unwrap();
        let result = AnalysisResult::Parsed(ParsedAnalysis {
            description: "stamp".into(),
            ..Default::default()
        });
        assert!(batch.apply_analysis(&id, Ok(result.clone())));
        let item = batch.get(&id).unwrap();
        assert_eq!(item.analysis.as_ref(), Some(&result));
        assert_eq!(item.analysis_phase, AnalysisPhase::Done);
        assert!(batch.analysis_candidates().is_empty());
    }

    #[test]
    fn test_retry_replaces_in_place() {
        let mut batch = Batch::new(10);
        let ids = batch.add(vec![upload(b"a"), upload(b"b")]).unwrap();
        batch
            .set_edits(
                &ids[0],
                EditPlan {
                    rotation: 90.0,
                    crop: None,
                },
            )
            .unwrap();
        batch.begin_processing(&ids[0]).unwrap();
        batch.apply_transform(&ids[0], Err(PipelineError::Decode("x".into())));

        let new_id = batch.retry(&ids[0]).unwrap();
        assert_ne!(new_id, ids[0]);
        assert!(batch.get(&ids[0]).is_none());
        let item = &batch.items()[0];
        assert_eq!(item.id, new_id);
        assert_eq!(item.status, ItemStatus::Pending);
        assert!(item.error.is_none());
        assert!(item.operations.is_empty());
        assert_eq!(item.edits.rotation, 90.0);
        assert_eq!(batch.items()[1].id, ids[1]);
    }

    #[test]
    fn test_retry_requires_error_state() {
        let (mut batch, id) = completed_batch();
        assert!(matches!(batch.retry(&id), Err(ApiError::InvalidState(_))));
        assert!(matches!(
            batch.retry(&ItemId::new("MISSING")),
            Err(ApiError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_set_edits_rejected_after_completion() {
        let (mut batch, id) = completed_batch();
        let err = batch.set_edits(&id, EditPlan::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[test]
    fn test_split_replaces_original() {
        let mut batch = Batch::new(4);
        let ids = batch
            .add(vec![upload(b"x"), upload(b"scan"), upload(b"y")])
            .unwrap();
        let parts = vec![upload(b"p1"), upload(b"p2")];
        let new_ids = batch.split(&ids[1], parts).unwrap();
        assert_eq!(new_ids.len(), 2);

        let order: Vec<ItemId> = batch.items().iter().map(|i| i.id.clone()).collect();
        assert_eq!(
            order,
            vec![
                ids[0].clone(),
                new_ids[0].clone(),
                new_ids[1].clone(),
                ids[2].clone()
            ]
        );
    }

    #[test]
    fn test_split_over_capacity_mutates_nothing() {
        let mut batch = Batch::new(3);
        let ids = batch.add(vec![upload(b"x"), upload(b"scan")]).unwrap();
        let parts = vec![upload(b"p1"), upload(b"p2"), upload(b"p3")];
        let err = batch.split(&ids[1], parts).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Pipeline(PipelineError::CapacityExceeded { .. })
        ));
        assert_eq!(batch.len(), 2);
        assert!(batch.get(&ids[1]).is_some());
    }
}
