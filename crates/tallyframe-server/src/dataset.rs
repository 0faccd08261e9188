//! JSON dataset files.
//!
//! A dataset file holds one node's initial records:
//!
//! ```json
//! [
//!   { "id": 500, "balance": 1000 },
//!   { "id": 9050, "balance": 1000 }
//! ]
//! ```

use std::{
    collections::HashSet,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use tallyframe_core::{AccountRecord, RecordStore};
use tallyframe_proto::outcome::MAX_REPLY_BALANCE;

use crate::error::NodeError;

/// Parse records from JSON text.
///
/// Duplicate ids are rejected. With `servable`, balances that a reply could
/// not carry are rejected too; responders need this, coordinators do not.
pub fn parse_records(json: &str, servable: bool) -> Result<Vec<AccountRecord>, NodeError> {
    let records: Vec<AccountRecord> =
        serde_json::from_str(json).map_err(|e| NodeError::Dataset(e.to_string()))?;
    validate(&records, servable)?;
    Ok(records)
}

/// Load a node's store from a dataset file.
pub fn load_store(path: &Path, servable: bool) -> Result<RecordStore, NodeError> {
    let io_err = |source| NodeError::DatasetIo { path: path.to_path_buf(), source };

    let file = File::open(path).map_err(io_err)?;
    let records: Vec<AccountRecord> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| NodeError::Dataset(format!("{}: {e}", path.display())))?;
    validate(&records, servable)?;

    tracing::info!(path = %path.display(), records = records.len(), "loaded dataset");
    Ok(RecordStore::from_records(records))
}

/// Write records as a dataset file.
pub fn save_records(path: &Path, records: &[AccountRecord]) -> Result<(), NodeError> {
    let io_err = |source| NodeError::DatasetIo { path: path.to_path_buf(), source };

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|e| NodeError::Dataset(e.to_string()))?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

fn validate(records: &[AccountRecord], servable: bool) -> Result<(), NodeError> {
    let mut seen = HashSet::with_capacity(records.len());

    for record in records {
        if record.id == 0 {
            return Err(NodeError::Dataset("account ids start at 1".to_owned()));
        }
        if !seen.insert(record.id) {
            return Err(NodeError::Dataset(format!("account {} appears twice", record.id)));
        }
        if servable && record.balance > MAX_REPLY_BALANCE {
            return Err(NodeError::Dataset(format!(
                "account {} balance {} exceeds the reply limit {MAX_REPLY_BALANCE}",
                record.id, record.balance
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_records() {
        let records = parse_records(r#"[{"id": 500, "balance": 1000}]"#, true).unwrap();
        assert_eq!(records, [AccountRecord { id: 500, balance: 1000 }]);
    }

    #[test]
    fn rejects_duplicates() {
        let json = r#"[{"id": 1, "balance": 1}, {"id": 1, "balance": 2}]"#;
        assert!(matches!(parse_records(json, false), Err(NodeError::Dataset(_))));
    }

    #[test]
    fn servable_limits_balance() {
        let json = r#"[{"id": 1, "balance": 16777216}]"#;
        assert!(parse_records(json, false).is_ok());
        assert!(matches!(parse_records(json, true), Err(NodeError::Dataset(_))));
    }

    #[test]
    fn rejects_out_of_range_ids() {
        for json in [r#"[{"id": 70000, "balance": 1}]"#, r#"[{"id": 0, "balance": 1}]"#] {
            assert!(matches!(parse_records(json, false), Err(NodeError::Dataset(_))), "{json}");
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let records =
            [AccountRecord { id: 9050, balance: 1000 }, AccountRecord { id: 3, balance: 0 }];

        save_records(&path, &records).unwrap();
        let store = load_store(&path, true).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(9050), Some(1000));
    }

    #[test]
    fn missing_file_is_dataset_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_store(&dir.path().join("nope.json"), false).unwrap_err();
        assert!(matches!(err, NodeError::DatasetIo { .. }));
    }
}
