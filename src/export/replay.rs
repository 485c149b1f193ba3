// Replay export
//
// Reconstructs a stored file from the structured record store: tag, raw
// fields, then the counted trailing empty fields re-padded as tabs. This
// is the lossless path: unknown record types, metadata lines, and padding
// all survive because the store never dropped them. The only normalization
// is the record tag itself, which the tokenizer trims (native exporters
// are inconsistent about trailing spaces there).

use crate::record::store::StructuredRecordStore;

/// Rebuild the text of `file_name` from stored records, in file order.
pub fn replay_file(store: &mut StructuredRecordStore, file_name: &str) -> String {
    let mut out = String::new();
    for record in store.file_records(file_name) {
        out.push_str(&record.record_type);
        for field in &record.fields {
            out.push('\t');
            out.push_str(field);
        }
        for _ in 0..record.trailing_empty_count {
            out.push('\t');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tokenizer;

    fn store_from(content: &str, file_name: &str) -> StructuredRecordStore {
        let mut store = StructuredRecordStore::new();
        tokenizer::each_line(content, |line| store.append(file_name, &line));
        store
    }

    #[test]
    fn test_replay_reproduces_bytes() {
        let content = "\
TargetModel\tSDS200
FormatVersion\t1.00
Conventional\tAgencyId=12\tStateId=1\tPolice Dept\tOn\t
SomethingNew\tmystery\tpayload\t\t\t
C-Group\tCGroupId=5\t\tDispatch\tOn\t39.5\t-104.8\t10\tCircle
";
        let mut store = store_from(content, "s_000001.hpd");
        assert_eq!(replay_file(&mut store, "s_000001.hpd"), content);
    }

    #[test]
    fn test_replay_keeps_trailing_padding() {
        let content = "DQKs_Status\t\tOn\tOff\t\t\t\t\n";
        let mut store = store_from(content, "f_000001.hpd");
        assert_eq!(replay_file(&mut store, "f_000001.hpd"), content);
    }

    #[test]
    fn test_replay_only_named_file() {
        let mut store = StructuredRecordStore::new();
        tokenizer::each_line("TargetModel\tA\n", |l| store.append("a.cfg", &l));
        tokenizer::each_line("TargetModel\tB\n", |l| store.append("b.cfg", &l));
        assert_eq!(replay_file(&mut store, "b.cfg"), "TargetModel\tB\n");
    }
}
