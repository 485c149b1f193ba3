// Structured record store
//
// An order-preserving log of every tokenized line, recognized or not. This
// is what makes export lossless: record types the builders do not model
// (file metadata, discovery/scan configuration, anything new in a firmware
// update) survive a round trip untouched. Appends are buffered and flushed
// in batches; batching is a throughput detail, ordering is the contract.

use serde::{Deserialize, Serialize};

use super::field_spec;
use super::tokenizer::RecordLine;

/// Buffered records per flush, matching the batch size the original
/// importer used for bulk writes.
const FLUSH_THRESHOLD: usize = 2000;

/// One stored line: raw fields plus the resolved field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub file_name: String,
    pub line_number: usize,
    pub record_type: String,
    pub fields: Vec<String>,
    pub field_names: Vec<String>,
    pub trailing_empty_count: usize,
}

#[derive(Debug, Default)]
pub struct StructuredRecordStore {
    records: Vec<StoredRecord>,
    buffer: Vec<StoredRecord>,
}

impl StructuredRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any previously stored records for `file_name`. Called before
    /// re-storing a file so repeated imports do not duplicate lines.
    pub fn begin_file(&mut self, file_name: &str) {
        self.flush();
        self.records.retain(|r| r.file_name != file_name);
    }

    /// Append one tokenized line in file order.
    pub fn append(&mut self, file_name: &str, line: &RecordLine) {
        let field_names = field_spec::resolve(&line.record_type, &line.fields);
        self.buffer.push(StoredRecord {
            file_name: file_name.to_string(),
            line_number: line.line_number,
            record_type: line.record_type.clone(),
            fields: line.fields.clone(),
            field_names,
            trailing_empty_count: line.trailing_empty_count,
        });
        if self.buffer.len() >= FLUSH_THRESHOLD {
            self.flush();
        }
    }

    pub fn flush(&mut self) {
        self.records.append(&mut self.buffer);
    }

    /// All stored records in insertion order. Flushes pending appends.
    pub fn records(&mut self) -> &[StoredRecord] {
        self.flush();
        &self.records
    }

    /// Stored records for one file, in file order.
    pub fn file_records(&mut self, file_name: &str) -> Vec<&StoredRecord> {
        self.flush();
        self.records.iter().filter(|r| r.file_name == file_name).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len() + self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tokenizer::tokenize;

    #[test]
    fn test_append_preserves_order_and_names() {
        let mut store = StructuredRecordStore::new();
        let a = tokenize("TargetModel\tSDS200", 1).unwrap();
        let b = tokenize("Mystery\tx\ty", 2).unwrap();
        store.append("test.cfg", &a);
        store.append("test.cfg", &b);

        let records = store.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].record_type, "TargetModel");
        assert_eq!(records[0].field_names, vec!["ModelName"]);
        // Unknown types are stored too, with no resolved names.
        assert_eq!(records[1].record_type, "Mystery");
        assert!(records[1].field_names.is_empty());
    }

    #[test]
    fn test_begin_file_clears_previous_copy() {
        let mut store = StructuredRecordStore::new();
        let line = tokenize("TargetModel\tSDS200", 1).unwrap();
        store.begin_file("a.cfg");
        store.append("a.cfg", &line);
        store.begin_file("b.cfg");
        store.append("b.cfg", &line);

        // Re-import of a.cfg must not duplicate it.
        store.begin_file("a.cfg");
        store.append("a.cfg", &line);

        assert_eq!(store.file_records("a.cfg").len(), 1);
        assert_eq!(store.file_records("b.cfg").len(), 1);
    }

    #[test]
    fn test_large_append_crosses_flush_threshold() {
        let mut store = StructuredRecordStore::new();
        let line = tokenize("QuickSearch\t460025000", 1).unwrap();
        for _ in 0..(FLUSH_THRESHOLD + 10) {
            store.append("big.cfg", &line);
        }
        assert_eq!(store.len(), FLUSH_THRESHOLD + 10);
        assert_eq!(store.records().len(), FLUSH_THRESHOLD + 10);
    }

    #[test]
    fn test_trailing_empty_count_kept() {
        let mut store = StructuredRecordStore::new();
        let line = tokenize("Conventional\tAgencyId=1\tStateId=6\tFire\tOn\t\t", 5).unwrap();
        store.append("s_000001.hpd", &line);
        assert_eq!(store.records()[0].trailing_empty_count, 2);
    }
}
