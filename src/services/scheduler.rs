//! Chunked scheduler that drives batch items through transform and analysis.
//!
//! A pass snapshots its eligible items, then works through them in chunks of
//! `concurrency`. Each chunk is marked in-flight under one write lock, run
//! concurrently with no lock held, and applied under a second write lock. The
//! next chunk starts only once the whole chunk has settled.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use utoipa::ToSchema;

use crate::error::{AnalysisError, PipelineError};
use crate::models::{AnalysisMode, ItemId, ProcessingSettings};
use crate::services::analysis_client::AnalysisService;
use crate::services::batch::SharedBatch;
use crate::services::pipeline::ItemProcessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PassKind {
    Transform,
    Analysis,
}

/// Outcome of one scheduler pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PassReport {
    pub kind: PassKind,
    /// Items eligible when the pass started
    pub eligible: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Results thrown away because the item was removed or changed meanwhile
    pub discarded: usize,
    pub chunks: usize,
}

impl PassReport {
    fn new(kind: PassKind, eligible: usize) -> Self {
        Self {
            kind,
            eligible,
            succeeded: 0,
            failed: 0,
            discarded: 0,
            chunks: 0,
        }
    }

    fn record(&mut self, applied: bool, failed: bool) {
        match (applied, failed) {
            (false, _) => self.discarded += 1,
            (true, true) => self.failed += 1,
            (true, false) => self.succeeded += 1,
        }
    }
}

pub struct BatchScheduler {
    concurrency: usize,
    processor: Arc<dyn ItemProcessor>,
    analyzer: Option<Arc<dyn AnalysisService>>,
    pass_lock: Mutex<()>,
}

impl BatchScheduler {
    pub fn new(concurrency: usize, processor: Arc<dyn ItemProcessor>) -> Self {
        Self {
            concurrency: concurrency.max(1),
            processor,
            analyzer: None,
            pass_lock: Mutex::new(()),
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn AnalysisService>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn has_analyzer(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Run every pending or errored item through the transform pipeline.
    pub async fn process_pending(
        &self,
        batch: &SharedBatch,
        settings: &ProcessingSettings,
    ) -> PassReport {
        let _pass = self.pass_lock.lock().await;
        let candidates = batch.read().await.transform_candidates();
        let mut report = PassReport::new(PassKind::Transform, candidates.len());
        tracing::info!(
            eligible = report.eligible,
            concurrency = self.concurrency,
            "Transform pass started"
        );

        for chunk in candidates.chunks(self.concurrency) {
            let jobs = {
                let mut guard = batch.write().await;
                chunk
                    .iter()
                    .filter_map(|id| {
                        let job = guard.begin_processing(id);
                        if job.is_none() {
                            report.discarded += 1;
                        }
                        job
                    })
                    .collect::<Vec<_>>()
            };
            if jobs.is_empty() {
                continue;
            }
            report.chunks += 1;

            let results = join_all(jobs.into_iter().map(|job| async move {
                let id = job.id.clone();
                (id, self.processor.process(job, settings).await)
            }))
            .await;

            let mut guard = batch.write().await;
            for (id, result) in results {
                let failed = log_failure(&id, result.as_ref().err(), "Item transform failed");
                let applied = guard.apply_transform(&id, result);
                report.record(applied, failed);
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            discarded = report.discarded,
            chunks = report.chunks,
            "Transform pass finished"
        );
        report
    }

    /// Send every completed item without an analysis result to the analysis
    /// service.
    pub async fn analyze_completed(
        &self,
        batch: &SharedBatch,
        mode: AnalysisMode,
    ) -> Result<PassReport, PipelineError> {
        let analyzer = self
            .analyzer
            .as_ref()
            .ok_or(AnalysisError::NotConfigured)?;

        let _pass = self.pass_lock.lock().await;
        let candidates = batch.read().await.analysis_candidates();
        let mut report = PassReport::new(PassKind::Analysis, candidates.len());
        tracing::info!(
            eligible = report.eligible,
            concurrency = self.concurrency,
            mode = %mode,
            "Analysis pass started"
        );

        for chunk in candidates.chunks(self.concurrency) {
            let jobs = {
                let mut guard = batch.write().await;
                chunk
                    .iter()
                    .filter_map(|id| {
                        let job = guard.begin_analysis(id, mode);
                        if job.is_none() {
                            report.discarded += 1;
                        }
                        job
                    })
                    .collect::<Vec<_>>()
            };
            if jobs.is_empty() {
                continue;
            }
            report.chunks += 1;

            let results = join_all(jobs.into_iter().map(|job| async move {
                let id = job.id.clone();
                (id, analyzer.analyze(job.into()).await)
            }))
            .await;

            let mut guard = batch.write().await;
            for (id, result) in results {
                let failed = log_failure(&id, result.as_ref().err(), "Item analysis failed");
                let applied = guard.apply_analysis(&id, result);
                report.record(applied, failed);
            }
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            discarded = report.discarded,
            chunks = report.chunks,
            "Analysis pass finished"
        );
        Ok(report)
    }
}

fn log_failure(id: &ItemId, error: Option<&impl std::fmt::Display>, message: &str) -> bool {
    match error {
        Some(e) => {
            tracing::warn!(item = %id, error = %e, "{message}");
            true
        }
        None => false,
    }
}
