// Record dispatcher
//
// Routes tokenized lines to a schema builder and keeps per-file parse
// statistics. Record types are a closed enum so the compiler checks
// exhaustiveness in the builders; genuinely unknown tags land in an
// Unknown bucket with example line numbers for the end-of-file summary.
// A handler error is logged and counted, never propagated: one malformed
// line must not abort the rest of the file.

use std::collections::BTreeMap;

use serde::Serialize;

use super::tokenizer::RecordLine;

/// Maximum stored snippet length for diagnostics.
const SNIPPET_LEN: usize = 150;

/// Every record type named by the HomePatrol file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    // File metadata
    TargetModel,
    FormatVersion,
    DateModified,
    // Geography (hpdb.cfg)
    StateInfo,
    CountyInfo,
    // System definitions
    Conventional,
    Trunk,
    AreaState,
    AreaCounty,
    CGroup,
    CFreq,
    // Geographic coverage
    Rectangle,
    Circle,
    // Trunk system records
    Site,
    TGroup,
    TFreq,
    Tgid,
    Lm,
    LmFrequency,
    FleetMap,
    UnitIds,
    AvoidTgids,
    BandPlanMot,
    BandPlanP25,
    DqksStatus,
    // Favorites index
    FList,
    /// Tag not named by the HomePatrol file formats; kept for statistics
    /// and lossless storage.
    Unknown,
}

impl RecordType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "TargetModel" => RecordType::TargetModel,
            "FormatVersion" => RecordType::FormatVersion,
            "DateModified" => RecordType::DateModified,
            "StateInfo" => RecordType::StateInfo,
            "CountyInfo" => RecordType::CountyInfo,
            "Conventional" => RecordType::Conventional,
            "Trunk" => RecordType::Trunk,
            "AreaState" => RecordType::AreaState,
            "AreaCounty" => RecordType::AreaCounty,
            "C-Group" => RecordType::CGroup,
            "C-Freq" => RecordType::CFreq,
            "Rectangle" => RecordType::Rectangle,
            "Circle" => RecordType::Circle,
            "Site" => RecordType::Site,
            "T-Group" => RecordType::TGroup,
            "T-Freq" => RecordType::TFreq,
            "TGID" => RecordType::Tgid,
            "LM" => RecordType::Lm,
            "LM_FREQUENCY" => RecordType::LmFrequency,
            "FleetMap" => RecordType::FleetMap,
            "UnitIds" => RecordType::UnitIds,
            "AvoidTgids" => RecordType::AvoidTgids,
            "BandPlan_Mot" => RecordType::BandPlanMot,
            "BandPlan_P25" => RecordType::BandPlanP25,
            "DQKs_Status" => RecordType::DqksStatus,
            "F-List" => RecordType::FList,
            _ => RecordType::Unknown,
        }
    }
}

/// A schema builder that consumes dispatched records.
pub trait RecordHandler {
    /// True when this builder models the record type. Known-but-unhandled
    /// types are counted separately from unknown tags.
    fn handles(&self, record_type: RecordType) -> bool;

    /// Apply one record. A soft error is reported back as a message; the
    /// dispatcher logs it and moves on.
    fn handle(&mut self, record_type: RecordType, line: &RecordLine) -> Result<(), String>;
}

/// One unrecognized tag with its first occurrences.
#[derive(Debug, Clone, Serialize)]
pub struct UnknownTag {
    pub tag: String,
    pub count: u64,
    pub first_line: usize,
    pub snippet: String,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
    stats: BTreeMap<String, u64>,
    handler_errors: u64,
    unhandled: BTreeMap<String, u64>,
    unknown: BTreeMap<String, UnknownTag>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one line. Returns true when the line was recognized and the
    /// handler ran without error.
    pub fn dispatch<H: RecordHandler>(&mut self, line: &RecordLine, handler: &mut H) -> bool {
        let tag = line.record_type.as_str();
        *self.stats.entry(tag.to_string()).or_insert(0) += 1;

        let record_type = RecordType::from_tag(tag);
        if record_type == RecordType::Unknown {
            let entry = self.unknown.entry(tag.to_string()).or_insert_with(|| UnknownTag {
                tag: tag.to_string(),
                count: 0,
                first_line: line.line_number,
                snippet: snippet_of(line),
            });
            entry.count += 1;
            return false;
        }

        if !handler.handles(record_type) {
            *self.unhandled.entry(tag.to_string()).or_insert(0) += 1;
            return true;
        }

        match handler.handle(record_type, line) {
            Ok(()) => true,
            Err(msg) => {
                self.handler_errors += 1;
                log::warn!("line {}: error in {} handler - {}", line.line_number, tag, msg);
                false
            }
        }
    }

    pub fn stats(&self) -> &BTreeMap<String, u64> {
        &self.stats
    }

    pub fn unknown_tags(&self) -> Vec<UnknownTag> {
        self.unknown.values().cloned().collect()
    }

    pub fn handler_errors(&self) -> u64 {
        self.handler_errors
    }

    /// Reset per-file statistics (the unknown bucket included).
    pub fn reset(&mut self) {
        self.stats.clear();
        self.unhandled.clear();
        self.unknown.clear();
        self.handler_errors = 0;
    }

    pub fn log_summary(&self) {
        if !self.stats.is_empty() {
            log::info!("parsed records by type: {:?}", self.stats);
        }
        if !self.unhandled.is_empty() {
            log::debug!("known types without a handler: {:?}", self.unhandled);
        }
        if !self.unknown.is_empty() {
            log::warn!("found {} unrecognized record types:", self.unknown.len());
            for entry in self.unknown.values() {
                log::warn!(
                    "  '{}': {} instances (first: line {}: {})",
                    entry.tag,
                    entry.count,
                    entry.first_line,
                    entry.snippet
                );
            }
        }
    }
}

fn snippet_of(line: &RecordLine) -> String {
    let mut text = line.record_type.clone();
    for field in &line.fields {
        text.push('\t');
        text.push_str(field);
    }
    if text.len() > SNIPPET_LEN {
        // Back up to a char boundary before slicing.
        let mut end = SNIPPET_LEN;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tokenizer::tokenize;

    struct CountingHandler {
        seen: Vec<RecordType>,
        fail_on: Option<RecordType>,
    }

    impl RecordHandler for CountingHandler {
        fn handles(&self, record_type: RecordType) -> bool {
            record_type != RecordType::Circle
        }

        fn handle(&mut self, record_type: RecordType, _line: &RecordLine) -> Result<(), String> {
            if Some(record_type) == self.fail_on {
                return Err("boom".to_string());
            }
            self.seen.push(record_type);
            Ok(())
        }
    }

    fn handler() -> CountingHandler {
        CountingHandler { seen: Vec::new(), fail_on: None }
    }

    #[test]
    fn test_dispatch_known_type() {
        let mut dispatcher = Dispatcher::new();
        let mut h = handler();
        let line = tokenize("StateInfo\tStateId=1\tCountryId=1\tAlabama\tAL", 1).unwrap();
        assert!(dispatcher.dispatch(&line, &mut h));
        assert_eq!(h.seen, vec![RecordType::StateInfo]);
        assert_eq!(dispatcher.stats().get("StateInfo"), Some(&1));
    }

    #[test]
    fn test_unknown_type_tracked_not_fatal() {
        let mut dispatcher = Dispatcher::new();
        let mut h = handler();
        let line = tokenize("Mystery\ta\tb", 7).unwrap();
        assert!(!dispatcher.dispatch(&line, &mut h));
        let unknown = dispatcher.unknown_tags();
        assert_eq!(unknown.len(), 1);
        assert_eq!(unknown[0].tag, "Mystery");
        assert_eq!(unknown[0].first_line, 7);
        assert!(h.seen.is_empty());
    }

    #[test]
    fn test_known_but_unhandled() {
        let mut dispatcher = Dispatcher::new();
        let mut h = handler();
        let line = tokenize("Circle\tCGroupId=1\t39.5\t-104.8\t10", 2).unwrap();
        // Recognized even though the handler opted out.
        assert!(dispatcher.dispatch(&line, &mut h));
        assert!(dispatcher.unknown_tags().is_empty());
    }

    #[test]
    fn test_handler_error_contained() {
        let mut dispatcher = Dispatcher::new();
        let mut h = CountingHandler { seen: Vec::new(), fail_on: Some(RecordType::CFreq) };
        let bad = tokenize("C-Freq\tonly", 3).unwrap();
        let good = tokenize("StateInfo\tStateId=1\tCountryId=1\tAlabama\tAL", 4).unwrap();
        assert!(!dispatcher.dispatch(&bad, &mut h));
        assert!(dispatcher.dispatch(&good, &mut h));
        assert_eq!(dispatcher.handler_errors(), 1);
    }
}
