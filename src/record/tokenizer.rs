// Record tokenizer
//
// Splits one raw line into (record type, field values, trailing-empty count).
// Trailing empty fields are trimmed off and counted separately so that a
// re-export can re-pad the line byte-for-byte: some exporters pad records
// with empty trailing fields and those tabs are significant.

use serde::{Deserialize, Serialize};

/// One tokenized input line. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLine {
    /// Record type tag, trimmed. Exporters emit a trailing space after some
    /// tags (e.g. "F-List "), so the tag is the only token we trim.
    pub record_type: String,
    /// Field values in file order, excluding the type tag and any trailing
    /// empty fields. Interior whitespace and interior empty fields are
    /// preserved verbatim.
    pub fields: Vec<String>,
    /// Number of empty fields trimmed from the right of the line.
    pub trailing_empty_count: usize,
    /// 1-based line number in the source file.
    pub line_number: usize,
}

impl RecordLine {
    /// Field value at position `index`, or "" when the line is short.
    pub fn field(&self, index: usize) -> &str {
        self.fields.get(index).map(String::as_str).unwrap_or("")
    }

    /// Field value at `index`, or `default` when the line is short.
    /// An empty value that is present stays empty (matches native exports,
    /// where a present-but-blank column is meaningful).
    pub fn field_or(&self, index: usize, default: &str) -> String {
        self.fields
            .get(index)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

/// Tokenize one raw line. Returns None for empty lines, which are valid
/// no-ops in every known file format.
pub fn tokenize(raw: &str, line_number: usize) -> Option<RecordLine> {
    let line = raw.strip_suffix('\n').unwrap_or(raw);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.is_empty() {
        return None;
    }

    // Each trailing tab is one trailing empty field.
    let trailing_empty_count = line.len() - line.trim_end_matches('\t').len();
    let body = &line[..line.len() - trailing_empty_count];

    let mut parts = body.split('\t');
    let record_type = parts.next().unwrap_or("").trim().to_string();
    let fields: Vec<String> = parts.map(|s| s.to_string()).collect();

    Some(RecordLine {
        record_type,
        fields,
        trailing_empty_count,
        line_number,
    })
}

/// Run `f` over every non-empty tokenized line of `content`, in order.
pub fn each_line<F: FnMut(RecordLine)>(content: &str, mut f: F) {
    for (idx, raw) in content.lines().enumerate() {
        if let Some(line) = tokenize(raw, idx + 1) {
            f(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_line() {
        let line = tokenize("StateInfo\tStateId=6\tCountryId=1\tColorado\tCO", 3).unwrap();
        assert_eq!(line.record_type, "StateInfo");
        assert_eq!(line.fields, vec!["StateId=6", "CountryId=1", "Colorado", "CO"]);
        assert_eq!(line.trailing_empty_count, 0);
        assert_eq!(line.line_number, 3);
    }

    #[test]
    fn test_trailing_empty_fields() {
        let line = tokenize("Conventional\tAgencyId=12\tStateId=1\tPolice Dept\tOn\t\t", 1).unwrap();
        assert_eq!(line.fields.len(), 4);
        assert_eq!(line.trailing_empty_count, 2);
    }

    #[test]
    fn test_interior_empty_fields_preserved() {
        let line = tokenize("C-Group\tCGroupId=5\t\tDispatch", 1).unwrap();
        assert_eq!(line.fields, vec!["CGroupId=5", "", "Dispatch"]);
    }

    #[test]
    fn test_tag_trimmed_values_not() {
        let line = tokenize("F-List \tMy List\t f_000001.hpd ", 1).unwrap();
        assert_eq!(line.record_type, "F-List");
        assert_eq!(line.field(1), " f_000001.hpd ");
    }

    #[test]
    fn test_crlf_and_empty_lines() {
        assert!(tokenize("", 1).is_none());
        assert!(tokenize("\r\n", 1).is_none());
        let line = tokenize("TargetModel\tBCD536HP\r\n", 1).unwrap();
        assert_eq!(line.field(0), "BCD536HP");
    }

    #[test]
    fn test_tag_only_line() {
        let line = tokenize("CloseCall", 1).unwrap();
        assert_eq!(line.record_type, "CloseCall");
        assert!(line.fields.is_empty());
        assert_eq!(line.trailing_empty_count, 0);
    }

    #[test]
    fn test_each_line_numbers() {
        let mut seen = Vec::new();
        each_line("TargetModel\tSDS100\n\nFormatVersion\t1.00\n", |line| {
            seen.push((line.line_number, line.record_type.clone()));
        });
        assert_eq!(
            seen,
            vec![(1, "TargetModel".to_string()), (3, "FormatVersion".to_string())]
        );
    }
}
