// Rust guideline compliant 2026-10-18

//! `txn_doctor`: diagnose stuck payment workflows and write remediation SQL.
//!
//! Wires the pipeline crates to the JSON snapshot source and the SQL file
//! sink, runs one batch and prints its summary.
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info txn_doctor --snapshots snapshots.json --region my \
//!     --out-dir sql --cashout-rpp210 reject
//!
//! # Classify only a few identifiers and print the SQL instead of writing it
//! txn_doctor --snapshots snapshots.json --ids TX-1,TX-2 --dry-run
//! ```
//!
//! Every flag also reads a `TXN_DOCTOR_*` environment variable.

mod adapters;

use std::path::PathBuf;
use std::sync::Arc;

use adapters::json_source::JsonSnapshotSource;
use adapters::sql_files::SqlFileSink;
use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use classifier::{Classifier, RuleCatalogue};
use consolidator::ConsolidatorConfig;
use orchestrator::{BatchConfig, BatchOrchestrator, BatchOutcome};
use registry::{RegistryConfig, Resolution, TemplateRegistry};
use tracing::Instrument as _;

/// Operator decision for `cashout_rpp210_pe220_pc201`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CashoutDecision {
    Accept,
    Reject,
}

impl From<CashoutDecision> for Resolution {
    fn from(decision: CashoutDecision) -> Self {
        match decision {
            CashoutDecision::Accept => Resolution::Accept,
            CashoutDecision::Reject => Resolution::Reject,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "txn_doctor", version)]
#[command(about = "Classify stuck payment workflows and generate deploy/rollback SQL")]
struct Args {
    /// JSON array of populated transaction snapshots
    #[arg(long, env = "TXN_DOCTOR_SNAPSHOTS")]
    snapshots: PathBuf,

    /// Identifiers to process, comma separated; defaults to every snapshot in the file
    #[arg(long, env = "TXN_DOCTOR_IDS", value_delimiter = ',')]
    ids: Vec<String>,

    /// Region code gating country-specific rules, e.g. `my` or `sg`
    #[arg(long, env = "TXN_DOCTOR_REGION", default_value = "")]
    region: String,

    /// Directory receiving `<STORE>_Deploy.sql` and `<STORE>_Rollback.sql`
    #[arg(long, env = "TXN_DOCTOR_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Maximum concurrent snapshot populations
    #[arg(long, env = "TXN_DOCTOR_WORKERS", default_value_t = 8)]
    workers: usize,

    /// Reject malformed rules instead of warning about them
    #[arg(long, env = "TXN_DOCTOR_STRICT")]
    strict: bool,

    /// Remediation for cashout_rpp210_pe220_pc201; unset skips the case
    #[arg(long, env = "TXN_DOCTOR_CASHOUT_RPP210", value_enum)]
    cashout_rpp210: Option<CashoutDecision>,

    /// Print the SQL instead of appending it to the artifacts
    #[arg(long, env = "TXN_DOCTOR_DRY_RUN")]
    dry_run: bool,
}

fn orchestrator(args: &Args) -> anyhow::Result<BatchOrchestrator> {
    let catalogue = RuleCatalogue::builder()
        .strict(args.strict)
        .default_rules()
        .build()
        .context("failed to build rule catalogue")?;

    let mut registry = RegistryConfig::builder();
    if let Some(decision) = args.cashout_rpp210 {
        registry = registry.cashout_rpp210_resolution(decision.into());
    }
    let registry = registry.build().context("failed to build registry config")?;

    let batch = BatchConfig::builder(args.workers)
        .region(args.region.to_ascii_lowercase())
        .build()
        .context("failed to build batch config")?;
    let consolidator =
        ConsolidatorConfig::builder().build().context("failed to build consolidator config")?;

    Ok(BatchOrchestrator::new(
        batch,
        Arc::new(Classifier::new(catalogue)),
        Arc::new(TemplateRegistry::new(registry)),
        consolidator,
    ))
}

fn print_plan(outcome: &BatchOutcome) {
    for block in outcome.plan.blocks(&outcome.header()) {
        println!("-- {}_{}.sql", block.store.code(), block.direction.suffix());
        println!("{}", block.header);
        for statement in &block.statements {
            println!("{statement}\n");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize the tracing subscriber before any async work.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let orchestrator = orchestrator(&args)?;

    let source = JsonSnapshotSource::load(&args.snapshots)
        .await
        .with_context(|| format!("failed to load snapshots from {}", args.snapshots.display()))?;
    let inputs = if args.ids.is_empty() { source.input_ids() } else { args.ids.clone() };
    let source = Arc::new(source);

    // Ctrl-C before the plan is rendered leaves every artifact untouched.
    let outcome = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("main.shutdown: ctrl_c received, nothing written");
            return Ok(());
        }
        outcome = orchestrator.process(source, inputs) => outcome.context("batch failed")?,
    };

    tracing::info!(
        "main.summary: batch_id={} processed={} classified={} tickets={}",
        outcome.batch_id,
        outcome.summary.processed,
        outcome.summary.classified,
        outcome.summary.tickets
    );
    print!("{}", outcome.summary);

    if args.dry_run {
        print_plan(&outcome);
        return Ok(());
    }

    let sink = SqlFileSink::new(&args.out_dir);
    let written = orchestrator
        .publish(&outcome, &sink)
        .instrument(tracing::info_span!("publish", batch_id = %outcome.batch_id))
        .await
        .with_context(|| format!("failed to write artifacts under {}", args.out_dir.display()))?;
    if written > 0 {
        println!("appended {written} block(s) under {}", args.out_dir.display());
    }
    Ok(())
}
