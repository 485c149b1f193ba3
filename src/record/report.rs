// Per-file parse report
//
// Every parse completes with a report even when individual lines were
// malformed: created-entity counts, rectangles whose owner never appeared,
// unrecognized record types, and skipped lines with reasons.

use std::collections::BTreeMap;

use serde::Serialize;

use super::dispatcher::UnknownTag;

/// A line whose semantic update was skipped (the raw record is still in
/// the structured record store).
#[derive(Debug, Clone, Serialize)]
pub struct SkippedLine {
    pub line_number: usize,
    pub record_type: String,
    pub reason: String,
}

/// A cached rectangle whose owner token was never materialized.
#[derive(Debug, Clone, Serialize)]
pub struct UnattachedRectangle {
    pub owner_token: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReport {
    pub file_name: String,
    /// Entities created (not updated) during this parse, by entity kind.
    pub created_counts: BTreeMap<String, u64>,
    pub unattached_rectangles: Vec<UnattachedRectangle>,
    pub unrecognized_record_types: Vec<UnknownTag>,
    pub skipped_lines: Vec<SkippedLine>,
}

impl FileReport {
    pub fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.to_string(),
            ..Default::default()
        }
    }

    pub fn count_created(&mut self, kind: &str) {
        *self.created_counts.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub fn skip(&mut self, line_number: usize, record_type: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("line {}: {} skipped - {}", line_number, record_type, reason);
        self.skipped_lines.push(SkippedLine {
            line_number,
            record_type: record_type.to_string(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_counts_accumulate() {
        let mut report = FileReport::new("s_000001.hpd");
        report.count_created("agencies");
        report.count_created("agencies");
        report.count_created("frequencies");
        assert_eq!(report.created_counts.get("agencies"), Some(&2));
        assert_eq!(report.created_counts.get("frequencies"), Some(&1));
    }

    #[test]
    fn test_skip_records_reason() {
        let mut report = FileReport::new("x.hpd");
        report.skip(12, "C-Freq", "insufficient fields");
        assert_eq!(report.skipped_lines.len(), 1);
        assert_eq!(report.skipped_lines[0].line_number, 12);
    }
}
