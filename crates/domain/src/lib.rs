// Rust guideline compliant 2026-10-18

//! Shared domain types for the stuck-workflow diagnosis pipeline.
//!
//! Defines the [`TransactionSnapshot`] aggregate, the closed [`Case`]
//! catalogue, SQL [`TemplateInfo`] fragments and [`DmlTicket`]s, and the
//! hexagonal port traits [`SnapshotSource`] and [`ArtifactSink`].
//! All pipeline crates depend on this crate; it depends on none of them.

mod case;
pub mod clock;
mod snapshot;
mod template;

pub use case::{Case, UnknownCase};
pub use snapshot::{
    ChargeInfo, ExternalTxInfo, FastAdapterInfo, InternalTxInfo, PartnerpayEngineInfo,
    PaymentCoreInfo, PaymentEngineInfo, RppAdapterInfo, TransactionSnapshot, TransferInfo,
    WorkflowCriteria, WorkflowSnapshot,
};
pub use template::{
    DmlTicket, Direction, ParamInfo, ParamKind, RUN_ID, TargetStore, TemplateInfo, UnknownStore,
};

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Errors from the [`SnapshotSource`] port.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    /// No backing store knows the identifier.
    #[error("transaction not found: {input_id}")]
    NotFound {
        /// Identifier as supplied by the operator.
        input_id: String,
    },
    /// A backing store could not be queried.
    #[error("population failed: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the [`ArtifactSink`] port.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A store has deploy statements but no matching rollback statements.
    #[error("store {store} has deploy statements but no rollback statements")]
    UnpairedStore {
        /// Offending store.
        store: TargetStore,
    },
    /// The artifact could not be written.
    #[error("artifact write failed for {path}: {source}")]
    Io {
        /// Artifact path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Hexagonal port: populates a [`TransactionSnapshot`] for one identifier.
///
/// Population fans out across worker tasks, so the returned future must be
/// `Send`. Implementations may still be written as `async fn`.
pub trait SnapshotSource: Send + Sync {
    /// Fetch every sub-record for `input_id`.
    ///
    /// A sub-record whose store has no row stays `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::NotFound`] when no store knows the identifier,
    /// or [`SourceError::Unavailable`] when a store cannot be queried.
    fn populate(
        &self,
        input_id: &str,
    ) -> impl Future<Output = Result<TransactionSnapshot, SourceError>> + Send;
}

/// One appended block of statements for a single store and direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactBlock {
    pub store: TargetStore,
    pub direction: Direction,
    /// Comment line heading the block, e.g. the batch id.
    pub header: String,
    pub statements: Vec<String>,
}

/// Hexagonal port: append-only destination of rendered SQL.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait ArtifactSink {
    /// Append `blocks`, never overwriting earlier content.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::UnpairedStore`] when a store has deploy blocks
    /// but no rollback block, or [`SinkError::Io`] when a write fails.
    async fn append(&self, blocks: &[ArtifactBlock]) -> Result<(), SinkError>;
}
