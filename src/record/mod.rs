// Record layer for HomePatrol tab-delimited files
//
// Every input file (hpdb.cfg, s_*.hpd, f_list.cfg, f_*.hpd) is a sequence
// of lines where the first tab-separated token names the record type and
// the remaining tokens are positional field values. There is no escaping:
// tab and newline cannot appear inside a field value.

pub mod dispatcher;
pub mod field_spec;
pub mod report;
pub mod store;
pub mod tokenizer;
pub mod value;

pub use dispatcher::{Dispatcher, RecordHandler, RecordType};
pub use report::FileReport;
pub use store::{StoredRecord, StructuredRecordStore};
pub use tokenizer::{tokenize, RecordLine};
