// Rust guideline compliant 2026-10-18

//! Append-only SQL file adapter for the `ArtifactSink` port.
//!
//! Each store and direction has one file in the output directory,
//! `<STORE>_Deploy.sql` or `<STORE>_Rollback.sql`. Every batch appends one
//! block, separated from earlier content by a blank line. Files are never
//! truncated.

use std::path::{Path, PathBuf};

use domain::{ArtifactBlock, ArtifactSink, Direction, SinkError, TargetStore};
use tokio::io::AsyncWriteExt as _;

/// `ArtifactSink` adapter writing SQL files under one directory.
#[derive(Debug, Clone)]
pub struct SqlFileSink {
    dir: PathBuf,
}

impl SqlFileSink {
    /// Sink writing under `dir`, created on first append.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File receiving `store` statements in `direction`.
    #[must_use]
    pub fn path(&self, store: TargetStore, direction: Direction) -> PathBuf {
        self.dir.join(format!("{}_{}.sql", store.code(), direction.suffix()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io { path: path.display().to_string(), source }
}

/// Every store with deploy statements must also have rollback statements.
fn check_paired(blocks: &[ArtifactBlock]) -> Result<(), SinkError> {
    let has = |store: TargetStore, direction: Direction| {
        blocks
            .iter()
            .any(|b| b.store == store && b.direction == direction && !b.statements.is_empty())
    };
    for store in TargetStore::ALL {
        if has(store, Direction::Deploy) && !has(store, Direction::Rollback) {
            return Err(SinkError::UnpairedStore { store });
        }
    }
    Ok(())
}

impl ArtifactSink for SqlFileSink {
    async fn append(&self, blocks: &[ArtifactBlock]) -> Result<(), SinkError> {
        check_paired(blocks)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| io_error(&self.dir, e))?;

        for block in blocks.iter().filter(|b| !b.statements.is_empty()) {
            let path = self.path(block.store, block.direction);
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await
                .map_err(|e| io_error(&path, e))?;
            let text = format!("{}\n{}\n\n", block.header, block.statements.join("\n\n"));
            file.write_all(text.as_bytes()).await.map_err(|e| io_error(&path, e))?;
            file.flush().await.map_err(|e| io_error(&path, e))?;
            tracing::debug!(
                "sql_files.append: path={} statements={}",
                path.display(),
                block.statements.len()
            );
        }
        Ok(())
    }
}
