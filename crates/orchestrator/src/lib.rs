// Rust guideline compliant 2026-10-18

//! Batch orchestration: populate, classify, generate, consolidate, write.
//!
//! [`BatchOrchestrator::process`] populates snapshots over a bounded worker
//! pool. Each worker classifies its snapshot and generates the ticket; a
//! single reducer restores input order, tallies the [`BatchSummary`] and
//! feeds the [`Consolidator`]. Nothing is written until
//! [`BatchOrchestrator::publish`] is called with a rendered plan, so
//! cancelling `process` leaves every artifact untouched.

mod summary;

use std::sync::Arc;

use classifier::Classifier;
use consolidator::{ConsolidationError, Consolidator, ConsolidatorConfig, SqlPlan};
use domain::{
    ArtifactSink, DmlTicket, SinkError, SnapshotSource, SourceError, TransactionSnapshot,
};
use registry::TemplateRegistry;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::Instrument as _;
use uuid::Uuid;

pub use summary::BatchSummary;
use summary::Tally;

// ---------------------------------------------------------------------------
// OrchestratorError
// ---------------------------------------------------------------------------

/// Errors that abort a batch.
///
/// Per-snapshot population failures do not abort; they are counted in the
/// [`BatchSummary`].
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// A configuration value is out of range.
    #[error("invalid batch config: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// A worker task panicked or was cancelled.
    #[error("worker failed: {reason}")]
    Worker { reason: String },
    #[error(transparent)]
    Consolidation(#[from] ConsolidationError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

// ---------------------------------------------------------------------------
// BatchConfig
// ---------------------------------------------------------------------------

/// Validated batch configuration.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum concurrent population tasks.
    pub workers: usize,
    /// Capacity of the worker to reducer channel.
    pub channel_capacity: usize,
    /// Region gating country-specific rules; empty for none.
    pub region: String,
}

/// Builder for [`BatchConfig`].
///
/// Obtain via [`BatchConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct BatchConfigBuilder {
    workers: usize,
    channel_capacity: usize,
    region: String,
}

impl BatchConfig {
    /// Start a builder with `workers` concurrent population tasks.
    #[must_use]
    pub fn builder(workers: usize) -> BatchConfigBuilder {
        BatchConfigBuilder { workers, channel_capacity: 64, region: String::new() }
    }
}

impl BatchConfigBuilder {
    /// Override the reducer channel capacity.
    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the region code, e.g. `my` or `sg`.
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Validate and build the [`BatchConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidConfig`] when `workers` or
    /// `channel_capacity` is zero, or when the region is neither empty nor
    /// two lowercase ASCII letters.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<BatchConfig, OrchestratorError> {
        if self.workers == 0 {
            return Err(OrchestratorError::InvalidConfig {
                reason: "workers must be >= 1".to_owned(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(OrchestratorError::InvalidConfig {
                reason: "channel_capacity must be >= 1".to_owned(),
            });
        }
        let region_ok = self.region.is_empty()
            || (self.region.len() == 2 && self.region.bytes().all(|b| b.is_ascii_lowercase()));
        if !region_ok {
            return Err(OrchestratorError::InvalidConfig {
                reason: format!("region must be empty or two lowercase letters, got {:?}", self.region),
            });
        }
        Ok(BatchConfig {
            workers: self.workers,
            channel_capacity: self.channel_capacity,
            region: self.region,
        })
    }
}

// ---------------------------------------------------------------------------
// BatchOrchestrator
// ---------------------------------------------------------------------------

/// Result of [`BatchOrchestrator::process`].
#[derive(Debug)]
pub struct BatchOutcome {
    pub batch_id: Uuid,
    pub summary: BatchSummary,
    pub plan: SqlPlan,
    /// Classified snapshots, in input order.
    pub snapshots: Vec<TransactionSnapshot>,
}

impl BatchOutcome {
    /// Comment line heading every artifact block of this batch.
    #[must_use]
    pub fn header(&self) -> String {
        format!("-- txn_doctor batch {}", self.batch_id)
    }
}

/// What one worker hands to the reducer.
#[derive(Debug)]
struct Processed {
    snapshot: TransactionSnapshot,
    ticket: Option<DmlTicket>,
}

/// Drives one batch through the pipeline.
#[derive(Debug)]
pub struct BatchOrchestrator {
    config: BatchConfig,
    classifier: Arc<Classifier>,
    registry: Arc<TemplateRegistry>,
    consolidator: ConsolidatorConfig,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(
        config: BatchConfig,
        classifier: Arc<Classifier>,
        registry: Arc<TemplateRegistry>,
        consolidator: ConsolidatorConfig,
    ) -> Self {
        Self { config, classifier, registry, consolidator }
    }

    /// Populate, classify and generate for every input, then consolidate.
    ///
    /// At most `workers` populations run at once. Results are reduced in
    /// input order, so the plan does not depend on completion order.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Worker`] when a worker task fails and
    /// [`OrchestratorError::Consolidation`] when a ticket is rejected or a
    /// group fails to render.
    pub async fn process<S>(
        &self,
        source: Arc<S>,
        inputs: Vec<String>,
    ) -> Result<BatchOutcome, OrchestratorError>
    where
        S: SnapshotSource + 'static,
    {
        let batch_id = Uuid::new_v4();
        let span = tracing::info_span!("batch", %batch_id);
        tracing::info!(
            parent: &span,
            "orchestrator.start: inputs={} workers={}",
            inputs.len(),
            self.config.workers
        );

        let total = inputs.len();
        let permits = Arc::new(Semaphore::new(self.config.workers));
        let (tx, mut rx) = mpsc::channel::<(usize, Processed)>(self.config.channel_capacity);
        let mut tasks = JoinSet::new();

        for (index, input_id) in inputs.into_iter().enumerate() {
            let permits = Arc::clone(&permits);
            let source = Arc::clone(&source);
            let classifier = Arc::clone(&self.classifier);
            let registry = Arc::clone(&self.registry);
            let region = self.config.region.clone();
            let tx = tx.clone();
            let task_span = tracing::debug_span!(parent: &span, "snapshot", %input_id);
            tasks.spawn(
                async move {
                    // Held until the result is handed over.
                    let _permit = permits.acquire_owned().await;
                    let mut snapshot = populate(source.as_ref(), &input_id).await;
                    let ticket = if snapshot.error().is_some() {
                        None
                    } else {
                        classifier.classify(&mut snapshot, &region);
                        registry.generate(&snapshot)
                    };
                    // The reducer only goes away on cancellation.
                    let _ = tx.send((index, Processed { snapshot, ticket })).await;
                }
                .instrument(task_span),
            );
        }
        drop(tx);

        let mut slots: Vec<Option<Processed>> = std::iter::repeat_with(|| None).take(total).collect();
        while let Some((index, processed)) = rx.recv().await {
            slots[index] = Some(processed);
        }
        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| OrchestratorError::Worker { reason: e.to_string() })?;
        }

        let mut tally = Tally::default();
        let mut consolidator = Consolidator::new(self.consolidator.clone());
        let mut snapshots = Vec::with_capacity(total);
        for processed in slots.into_iter().flatten() {
            let Processed { snapshot, ticket } = processed;
            if snapshot.error().is_some() {
                tally.population_failure();
            } else {
                let case = snapshot.case();
                tally.classified(case, ticket.is_some(), self.registry.has_generator(case));
            }
            if let Some(ticket) = &ticket {
                consolidator.add(ticket).inspect_err(|e| {
                    tracing::error!(
                        parent: &span,
                        "orchestrator.consolidate: input_id={} error={e}",
                        snapshot.input_id
                    );
                })?;
            }
            snapshots.push(snapshot);
        }
        let plan = consolidator.render()?;
        let summary = tally.finish();

        tracing::info!(
            parent: &span,
            "orchestrator.done: processed={} classified={} tickets={} statements={}",
            summary.processed,
            summary.classified,
            summary.tickets,
            plan.groups.len()
        );
        Ok(BatchOutcome { batch_id, summary, plan, snapshots })
    }

    /// Append the rendered plan of `outcome` to `sink`.
    ///
    /// Returns the number of blocks written; an empty plan writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Sink`] when the sink rejects or fails the
    /// write.
    pub async fn publish<K: ArtifactSink>(
        &self,
        outcome: &BatchOutcome,
        sink: &K,
    ) -> Result<usize, OrchestratorError> {
        let blocks = outcome.plan.blocks(&outcome.header());
        if blocks.is_empty() {
            tracing::info!("orchestrator.publish: batch_id={} nothing to write", outcome.batch_id);
            return Ok(0);
        }
        sink.append(&blocks).await?;
        tracing::info!("orchestrator.publish: batch_id={} blocks={}", outcome.batch_id, blocks.len());
        Ok(blocks.len())
    }
}

/// Populate one snapshot, folding a source failure into the snapshot.
///
/// An unknown identifier yields an empty snapshot, which classifies as
/// not found. Any other failure is recorded on the snapshot.
async fn populate<S: SnapshotSource>(source: &S, input_id: &str) -> TransactionSnapshot {
    match source.populate(input_id).await {
        Ok(snapshot) => snapshot,
        Err(SourceError::NotFound { .. }) => {
            tracing::warn!("orchestrator.populate: input_id={input_id} not found");
            TransactionSnapshot::new(input_id)
        }
        Err(e) => {
            tracing::warn!("orchestrator.populate: input_id={input_id} error={e}");
            let mut snapshot = TransactionSnapshot::new(input_id);
            snapshot.record_error(e.to_string());
            snapshot
        }
    }
}
