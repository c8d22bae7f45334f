// Rust guideline compliant 2026-10-18

//! JSON file adapter for the `SnapshotSource` port.
//!
//! Stands in for the live store clients: the file holds a JSON array of
//! already-populated snapshots. Lookups accept either the `input_id` or the
//! resolved `transaction_id`.

use std::collections::HashMap;
use std::path::Path;

use domain::{SnapshotSource, SourceError, TransactionSnapshot};

/// `SnapshotSource` adapter serving snapshots read from a JSON file.
#[derive(Debug, Default)]
pub struct JsonSnapshotSource {
    snapshots: Vec<TransactionSnapshot>,
    by_id: HashMap<String, usize>,
}

impl JsonSnapshotSource {
    /// Read and parse the snapshot file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] when the file cannot be read or
    /// is not a JSON array of snapshots.
    pub async fn load(path: &Path) -> Result<Self, SourceError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| SourceError::Unavailable {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&text)
    }

    /// Parse a JSON array of snapshots.
    ///
    /// The first snapshot wins when two share an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] when `text` is not a JSON array
    /// of snapshots.
    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        let snapshots: Vec<TransactionSnapshot> = serde_json::from_str(text)
            .map_err(|e| SourceError::Unavailable { reason: format!("invalid snapshot file: {e}") })?;

        let mut by_id = HashMap::new();
        for (i, snapshot) in snapshots.iter().enumerate() {
            for id in [&snapshot.input_id, &snapshot.transaction_id] {
                if id.is_empty() {
                    continue;
                }
                if by_id.contains_key(id) {
                    if id == &snapshot.input_id {
                        tracing::warn!("json_source.duplicate: input_id={id} kept first");
                    }
                    continue;
                }
                by_id.insert(id.clone(), i);
            }
        }
        tracing::debug!("json_source.loaded: snapshots={}", snapshots.len());
        Ok(Self { snapshots, by_id })
    }

    /// Every distinct `input_id`, in file order.
    #[must_use]
    pub fn input_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.snapshots.len());
        for snapshot in &self.snapshots {
            if !snapshot.input_id.is_empty() && !ids.contains(&snapshot.input_id) {
                ids.push(snapshot.input_id.clone());
            }
        }
        ids
    }
}

impl SnapshotSource for JsonSnapshotSource {
    async fn populate(&self, input_id: &str) -> Result<TransactionSnapshot, SourceError> {
        let index = self
            .by_id
            .get(input_id)
            .ok_or_else(|| SourceError::NotFound { input_id: input_id.to_owned() })?;
        let mut snapshot = self.snapshots[*index].clone();
        // Keep the identifier as the operator typed it.
        snapshot.input_id = input_id.to_owned();
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::JsonSnapshotSource;
    use domain::{SnapshotSource as _, SourceError};

    const FILE: &str = r#"[
        {"input_id": "A-1", "transaction_id": "tx-1",
         "rpp_adapter": {"workflow": [{"workflow_id": "wf_ct_cashout", "state": "210", "attempt": 0, "run_id": "r1"}]}},
        {"input_id": "B-2"},
        {"input_id": "A-1", "transaction_id": "tx-dup"}
    ]"#;

    // JS-T01: lookups

    #[tokio::test]
    async fn populate_by_input_or_transaction_id() {
        let source = JsonSnapshotSource::from_json(FILE).unwrap();
        let snap = source.populate("A-1").await.unwrap();
        assert_eq!(snap.transaction_id, "tx-1");
        assert_eq!(snap.rpp_adapter.unwrap().workflow[0].run_id, "r1");

        let snap = source.populate("tx-1").await.unwrap();
        assert_eq!(snap.input_id, "tx-1");
        assert!(snap.payment_engine.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let source = JsonSnapshotSource::from_json(FILE).unwrap();
        let result = source.populate("nope").await;
        assert!(matches!(result, Err(SourceError::NotFound { .. })));
    }

    #[test]
    fn input_ids_keep_file_order() {
        let source = JsonSnapshotSource::from_json(FILE).unwrap();
        assert_eq!(source.input_ids(), ["A-1", "B-2"]);
    }

    // JS-T02: bad input

    #[test]
    fn malformed_file_is_unavailable() {
        let result = JsonSnapshotSource::from_json("{\"input_id\": 1}");
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = JsonSnapshotSource::load(&dir.path().join("none.json")).await;
        assert!(matches!(result, Err(SourceError::Unavailable { .. })));
    }
}
