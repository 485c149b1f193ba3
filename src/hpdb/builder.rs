// HPDB hierarchical builder
//
// Rebuilds the Country > State > County / Agency > ChannelGroup > Frequency
// hierarchy (plus Site/TalkGroup/TGID for trunked systems) from the flat
// record stream. There is no explicit nesting syntax in the files: a child
// record attaches to whichever ancestor record was seen most recently, so
// parsing is strictly sequential and the parser carries explicit cursor
// state instead of any ambient globals.
//
// Rectangle records may reference their owner before it exists; those are
// cached by the raw owner token and flushed the moment a matching owner is
// created. Leftovers are reported at end-of-file, never silently dropped.

use std::collections::{BTreeMap, BTreeSet};

use crate::record::dispatcher::{Dispatcher, RecordHandler, RecordType};
use crate::record::report::{FileReport, UnattachedRectangle};
use crate::record::store::StructuredRecordStore;
use crate::record::tokenizer::{self, RecordLine};
use crate::record::value::{
    extract_id, find_id, is_digits, parse_f64_opt, parse_i32_or, parse_u32_or,
    validate_coordinates, validate_frequency,
};

use super::model::{
    Agency, AvoidTgidEntry, ChannelGroup, Country, County, FleetMapEntry, Frequency,
    HpdbDatabase, MotBand, P25Band, Rectangle, Site, State, SystemType, TalkGroup,
    TalkGroupId, TrunkFrequency, UnitIdEntry, SENTINEL_SCOPE_ID,
};

const VALID_MODULATIONS: [&str; 5] = ["AM", "FM", "NFM", "AUTO", "DSB"];

/// Default conventional-frequency delay when the field is absent/invalid.
const DEFAULT_FREQ_DELAY: i32 = 15;

/// A rectangle payload waiting for its owner token to materialize.
#[derive(Debug, Clone)]
struct PendingRectangle {
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
}

/// Current-ancestor pointers. A top-level system record resets every
/// descendant pointer: pointers from a previous system must never leak.
#[derive(Debug, Default)]
struct Cursor {
    agency: Option<u32>,
    group: Option<u64>,
    site: Option<u64>,
    talk_group: Option<u64>,
    /// Owner tokens (CGroupId=5, SiteId=101, ...) whose defining line has
    /// been seen in this file. A rectangle only attaches mid-file once its
    /// owner was (re-)defined here; otherwise it waits in the cache so a
    /// later defining line cannot wipe it. Leftovers attach to owners from
    /// earlier files at end-of-file.
    defined_tokens: BTreeSet<String>,
}

/// Parser for hpdb.cfg and s_*.hpd files.
pub struct HpdbParser {
    dispatcher: Dispatcher,
    pending_rectangles: BTreeMap<String, Vec<PendingRectangle>>,
}

impl Default for HpdbParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HpdbParser {
    pub fn new() -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            pending_rectangles: BTreeMap::new(),
        }
    }

    /// Parse hpdb.cfg content (state and county catalog).
    pub fn parse_config_source(
        &mut self,
        db: &mut HpdbDatabase,
        store: &mut StructuredRecordStore,
        file_name: &str,
        content: &str,
    ) -> FileReport {
        let report = self.parse_source(db, store, file_name, content);
        log::info!(
            "parsed {} states and {} counties from {}",
            db.states.len(),
            db.counties.len(),
            file_name
        );
        report
    }

    /// Parse one s_*.hpd system file.
    pub fn parse_system_source(
        &mut self,
        db: &mut HpdbDatabase,
        store: &mut StructuredRecordStore,
        file_name: &str,
        content: &str,
    ) -> FileReport {
        log::info!("parsing HPDB system file: {}", file_name);
        self.parse_source(db, store, file_name, content)
    }

    fn parse_source(
        &mut self,
        db: &mut HpdbDatabase,
        store: &mut StructuredRecordStore,
        file_name: &str,
        content: &str,
    ) -> FileReport {
        self.dispatcher.reset();
        store.begin_file(file_name);

        let mut report = FileReport::new(file_name);
        let mut cursor = Cursor::default();
        {
            let mut handler = HpdbHandler {
                db,
                report: &mut report,
                pending: &mut self.pending_rectangles,
                cursor: &mut cursor,
            };
            tokenizer::each_line(content, |line| {
                store.append(file_name, &line);
                self.dispatcher.dispatch(&line, &mut handler);
            });
        }

        // End-of-file: rectangles referencing owners created by earlier
        // files can attach now; everything else stays cached and reported.
        let tokens: Vec<String> = self.pending_rectangles.keys().cloned().collect();
        for token in tokens {
            let payloads = self.pending_rectangles.remove(&token).unwrap_or_default();
            let mut leftover = Vec::new();
            for payload in payloads {
                match attach_to_owner(db, &token, &payload) {
                    Some(true) => report.count_created("rectangles"),
                    Some(false) => {}
                    None => leftover.push(payload),
                }
            }
            if !leftover.is_empty() {
                self.pending_rectangles.insert(token, leftover);
            }
        }

        self.dispatcher.log_summary();
        report.unrecognized_record_types = self.dispatcher.unknown_tags();
        report.unattached_rectangles = self.unattached_rectangles();
        report
    }

    /// Rectangles still waiting for an owner, summarized per raw token.
    pub fn unattached_rectangles(&self) -> Vec<UnattachedRectangle> {
        self.pending_rectangles
            .iter()
            .map(|(token, payloads)| UnattachedRectangle {
                owner_token: token.clone(),
                count: payloads.len(),
            })
            .collect()
    }
}

struct HpdbHandler<'a> {
    db: &'a mut HpdbDatabase,
    report: &'a mut FileReport,
    pending: &'a mut BTreeMap<String, Vec<PendingRectangle>>,
    cursor: &'a mut Cursor,
}

impl RecordHandler for HpdbHandler<'_> {
    fn handles(&self, record_type: RecordType) -> bool {
        !matches!(record_type, RecordType::FList)
    }

    fn handle(&mut self, record_type: RecordType, line: &RecordLine) -> Result<(), String> {
        match record_type {
            RecordType::TargetModel | RecordType::FormatVersion | RecordType::DateModified => {
                log::debug!("line {}: {}: {}", line.line_number, line.record_type, line.field(0));
            }
            RecordType::StateInfo => self.state_info(line),
            RecordType::CountyInfo => self.county_info(line),
            RecordType::Conventional => self.agency(line, SystemType::Conventional),
            RecordType::Trunk => self.agency(line, SystemType::Trunk),
            RecordType::AreaState => self.area_state(line),
            RecordType::AreaCounty => self.area_county(line),
            RecordType::CGroup => self.channel_group(line),
            RecordType::CFreq => self.frequency(line),
            RecordType::Rectangle => self.rectangle(line),
            RecordType::Circle => self.circle(line),
            RecordType::Site => self.site(line),
            RecordType::TGroup => self.talk_group(line),
            RecordType::TFreq => self.trunk_frequency(line),
            RecordType::Tgid => self.talk_group_id(line),
            RecordType::Lm => self.lm_site(line),
            RecordType::LmFrequency => {
                log::debug!("line {}: LM_FREQUENCY record", line.line_number);
            }
            RecordType::FleetMap => self.fleet_map(line),
            RecordType::UnitIds => self.unit_ids(line),
            RecordType::AvoidTgids => self.avoid_tgids(line),
            RecordType::BandPlanMot => self.band_plan_mot(line),
            RecordType::BandPlanP25 => self.band_plan_p25(line),
            RecordType::DqksStatus => self.dqks_status(line),
            RecordType::FList | RecordType::Unknown => {}
        }
        Ok(())
    }
}

impl HpdbHandler<'_> {
    fn state_info(&mut self, line: &RecordLine) {
        let (state_id, country_id) = match (
            extract_id(line.field(0).trim(), "StateId"),
            extract_id(line.field(1).trim(), "CountryId"),
        ) {
            (Some(s), Some(c)) => (s as u32, c as u32),
            _ => {
                self.report.skip(line.line_number, "StateInfo", "malformed id fields");
                return;
            }
        };

        // Nationwide special case: StateId=0 with CountryId=0. The name
        // and code columns are empty on these lines, so this runs before
        // the structural width check.
        if state_id == SENTINEL_SCOPE_ID && country_id == SENTINEL_SCOPE_ID {
            if !self.db.states.contains_key(&SENTINEL_SCOPE_ID) {
                self.report.count_created("states");
            }
            self.db.ensure_nationwide();
            return;
        }
        // StateId=0 with a real country is the _MultipleStates placeholder.
        if state_id == SENTINEL_SCOPE_ID {
            return;
        }
        if line.fields.len() < 4 {
            self.report.skip(line.line_number, "StateInfo", "insufficient fields (< 4)");
            return;
        }

        if !self.db.countries.contains_key(&country_id) {
            let name_tag = match country_id {
                1 => "USA".to_string(),
                2 => "Canada".to_string(),
                other => format!("Country {}", other),
            };
            self.db.countries.insert(
                country_id,
                Country { country_id, name_tag, code: String::new() },
            );
            self.report.count_created("countries");
        }

        let name_tag = line.field(2).trim().to_string();
        let short_name = line.field(3).trim().to_string();
        match self.db.states.get_mut(&state_id) {
            Some(state) => {
                state.country_id = country_id;
                state.name_tag = name_tag;
                state.short_name = short_name;
            }
            None => {
                log::debug!("created state: {} ({})", name_tag, short_name);
                self.db.states.insert(
                    state_id,
                    State { state_id, country_id, name_tag, short_name },
                );
                self.report.count_created("states");
            }
        }
    }

    fn county_info(&mut self, line: &RecordLine) {
        if line.fields.len() < 3 {
            self.report.skip(line.line_number, "CountyInfo", "insufficient fields (< 3)");
            return;
        }
        let (county_id, mut state_id) = match (
            extract_id(line.field(0).trim(), "CountyId"),
            extract_id(line.field(1).trim(), "StateId"),
        ) {
            (Some(c), Some(s)) => (c as u32, s as u32),
            _ => {
                self.report.skip(line.line_number, "CountyInfo", "malformed id fields");
                return;
            }
        };

        // CountyId=0 is the statewide sentinel; it becomes a synthetic
        // Statewide node rather than disappearing from the tree.
        if county_id == SENTINEL_SCOPE_ID {
            if !self.db.counties.contains_key(&SENTINEL_SCOPE_ID) {
                self.report.count_created("counties");
            }
            self.db.ensure_statewide(state_id);
            return;
        }
        if state_id == SENTINEL_SCOPE_ID {
            self.db.ensure_nationwide();
            state_id = SENTINEL_SCOPE_ID;
        }
        if !self.db.states.contains_key(&state_id) {
            log::warn!("state {} not found for county {}", state_id, line.field(2));
            return;
        }

        let name_tag = line.field(2).trim().to_string();
        match self.db.counties.get_mut(&county_id) {
            Some(county) => {
                county.state_id = state_id;
                county.name_tag = name_tag;
            }
            None => {
                log::debug!("created county: {}", name_tag);
                self.db.counties.insert(county_id, County { county_id, state_id, name_tag });
                self.report.count_created("counties");
            }
        }
    }

    fn agency(&mut self, line: &RecordLine, system_type: SystemType) {
        if line.fields.len() < 4 {
            self.report.skip(
                line.line_number,
                system_type.tag(),
                "agency record has insufficient fields (< 4)",
            );
            return;
        }
        let agency_id = match extract_id(line.field(0).trim(), "AgencyId") {
            Some(id) => id as u32,
            None => {
                self.report.skip(line.line_number, system_type.tag(), "missing AgencyId");
                return;
            }
        };
        let state_id = extract_id(line.field(1).trim(), "StateId").unwrap_or(0) as u32;
        let name_tag = line.field(2).trim().to_string();
        if name_tag.is_empty() {
            self.report.skip(line.line_number, system_type.tag(), "agency has no name");
            return;
        }
        let enabled = line.field(3).trim() == "On";

        if state_id == SENTINEL_SCOPE_ID {
            self.db.ensure_nationwide();
        }

        match self.db.agencies.get_mut(&agency_id) {
            Some(agency) => {
                agency.name_tag = name_tag;
                agency.system_type = system_type;
                agency.enabled = enabled;
                agency.primary_state_id = state_id;
                // Owned per-system extras follow the defining line in the
                // same file; clear them so re-parsing cannot duplicate.
                agency.dqks_my_id.clear();
                agency.dqks_status.clear();
                agency.fleet_maps.clear();
                agency.unit_ids.clear();
                agency.avoid_tgids.clear();
            }
            None => {
                log::debug!("line {}: created agency: {} ({:?})", line.line_number, name_tag, system_type);
                self.db.agencies.insert(
                    agency_id,
                    Agency {
                        agency_id,
                        name_tag,
                        system_type,
                        enabled,
                        primary_state_id: state_id,
                        state_ids: Default::default(),
                        county_ids: Default::default(),
                        group_ids: Vec::new(),
                        site_ids: Vec::new(),
                        talk_group_ids: Vec::new(),
                        dqks_my_id: String::new(),
                        dqks_status: Vec::new(),
                        fleet_maps: Vec::new(),
                        unit_ids: Vec::new(),
                        avoid_tgids: Vec::new(),
                    },
                );
                self.report.count_created("agencies");
            }
        }
        if !self.db.agency_order.contains(&agency_id) {
            self.db.agency_order.push(agency_id);
        }
        if self.db.states.contains_key(&state_id) {
            self.db.agencies.get_mut(&agency_id).unwrap().state_ids.insert(state_id);
        }

        // New system: every descendant pointer resets.
        self.cursor.agency = Some(agency_id);
        self.cursor.group = None;
        self.cursor.site = None;
        self.cursor.talk_group = None;
    }

    fn area_state(&mut self, line: &RecordLine) {
        let agency_id = match self.cursor.agency {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "AreaState", "no live system");
                return;
            }
        };
        if line.fields.len() < 2 {
            self.report.skip(line.line_number, "AreaState", "insufficient fields (< 2)");
            return;
        }
        let state_id = match extract_id(line.field(1).trim(), "StateId") {
            Some(id) => id as u32,
            None => {
                self.report.skip(line.line_number, "AreaState", "malformed StateId");
                return;
            }
        };
        if state_id == SENTINEL_SCOPE_ID {
            self.db.ensure_nationwide();
        }
        if self.db.states.contains_key(&state_id) {
            self.db.agencies.get_mut(&agency_id).unwrap().state_ids.insert(state_id);
        }
    }

    fn area_county(&mut self, line: &RecordLine) {
        let agency_id = match self.cursor.agency {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "AreaCounty", "no live system");
                return;
            }
        };
        if line.fields.len() < 2 {
            self.report.skip(line.line_number, "AreaCounty", "insufficient fields (< 2)");
            return;
        }
        let county_id = match extract_id(line.field(1).trim(), "CountyId") {
            Some(id) => id as u32,
            None => {
                self.report.skip(line.line_number, "AreaCounty", "malformed CountyId");
                return;
            }
        };
        // CountyId=0 means statewide: route to the synthetic Statewide
        // node so the agency still shows under a real tree entry.
        if county_id == SENTINEL_SCOPE_ID {
            let agency_state = self.db.agencies[&agency_id].primary_state_id;
            let statewide = self.db.ensure_statewide(agency_state);
            self.db.agencies.get_mut(&agency_id).unwrap().county_ids.insert(statewide);
            return;
        }
        if self.db.counties.contains_key(&county_id) {
            self.db.agencies.get_mut(&agency_id).unwrap().county_ids.insert(county_id);
        } else {
            log::debug!("line {}: AreaCounty references unknown county {}", line.line_number, county_id);
        }
    }

    fn channel_group(&mut self, line: &RecordLine) {
        let agency_id = match self.cursor.agency {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "C-Group", "no live system");
                return;
            }
        };
        if line.fields.len() < 8 {
            self.report.skip(line.line_number, "C-Group", "insufficient fields (< 8)");
            return;
        }
        let cgroup_id = match extract_id(line.field(0).trim(), "CGroupId") {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "C-Group", "missing CGroupId");
                return;
            }
        };

        let name_tag = line.field(2).trim().to_string();
        let enabled = line.field(3).trim() == "On";
        let latitude = self.coordinate(line, 4, -90.0, 90.0);
        let longitude = self.coordinate(line, 5, -180.0, 180.0);
        let range_miles = parse_f64_opt(line.field(6));
        let location_type = line.field(7).trim().to_string();

        match self.db.channel_groups.get_mut(&cgroup_id) {
            Some(group) => {
                group.agency_id = agency_id;
                group.name_tag = name_tag;
                group.enabled = enabled;
                group.latitude = latitude;
                group.longitude = longitude;
                group.range_miles = range_miles;
                group.location_type = location_type;
                // Rectangles re-attach as the file replays.
                group.rectangles.clear();
            }
            None => {
                log::debug!("created channel group: {}", name_tag);
                self.db.channel_groups.insert(
                    cgroup_id,
                    ChannelGroup {
                        cgroup_id,
                        agency_id,
                        name_tag,
                        enabled,
                        latitude,
                        longitude,
                        range_miles,
                        location_type,
                        frequency_ids: Vec::new(),
                        rectangles: Vec::new(),
                    },
                );
                self.report.count_created("channel_groups");
            }
        }
        let agency = self.db.agencies.get_mut(&agency_id).unwrap();
        if !agency.group_ids.contains(&cgroup_id) {
            agency.group_ids.push(cgroup_id);
        }

        self.cursor.group = Some(cgroup_id);
        self.flush_pending(line.field(0).trim());
    }

    fn frequency(&mut self, line: &RecordLine) {
        let cgroup_id = match self.cursor.group {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "C-Freq", "no live channel group");
                return;
            }
        };
        let cfreq_id = match find_id(&line.fields, "CFreqId") {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "C-Freq", "missing CFreqId");
                return;
            }
        };

        let description = line.field(2).trim().to_string();
        let enabled = line.field(3).trim() == "On";

        // Frequency must be numeric and inside the plausible radio range.
        let frequency = line
            .field(4)
            .parse::<u64>()
            .ok()
            .filter(|hz| validate_frequency(*hz));
        let frequency = match frequency {
            Some(hz) => hz,
            None => {
                self.report.skip(line.line_number, "C-Freq", "missing or implausible frequency");
                return;
            }
        };

        let modulation = {
            let m = line.field(5).trim();
            if VALID_MODULATIONS.contains(&m) { m.to_string() } else { String::new() }
        };
        let audio_option = {
            let tone = line.field(6).trim();
            if tone.starts_with("TONE=") || tone.starts_with("NAC=") {
                tone.to_string()
            } else {
                String::new()
            }
        };
        let delay = if is_digits(line.field(7)) {
            parse_i32_or(line.field(7), DEFAULT_FREQ_DELAY)
        } else {
            DEFAULT_FREQ_DELAY
        };

        match self.db.frequencies.get_mut(&cfreq_id) {
            Some(freq) => {
                freq.cgroup_id = cgroup_id;
                freq.description = description;
                freq.enabled = enabled;
                freq.frequency = frequency;
                freq.modulation = modulation;
                freq.audio_option = audio_option;
                freq.delay = delay;
            }
            None => {
                log::debug!("created frequency: {} - {:.6} MHz",
                    if description.is_empty() { "unnamed" } else { &description },
                    frequency as f64 / 1_000_000.0);
                self.db.frequencies.insert(
                    cfreq_id,
                    Frequency {
                        cfreq_id,
                        cgroup_id,
                        description,
                        enabled,
                        frequency,
                        modulation,
                        audio_option,
                        delay,
                    },
                );
                self.report.count_created("frequencies");
            }
        }
        let group = self.db.channel_groups.get_mut(&cgroup_id).unwrap();
        if !group.frequency_ids.contains(&cfreq_id) {
            group.frequency_ids.push(cfreq_id);
        }
    }

    fn rectangle(&mut self, line: &RecordLine) {
        if line.fields.len() < 5 {
            self.report.skip(line.line_number, "Rectangle", "insufficient fields (< 5)");
            return;
        }
        let token = line.field(0).trim().to_string();
        let coords: Vec<Option<f64>> =
            (1..5).map(|i| parse_f64_opt(line.field(i).trim())).collect();
        let payload = match (coords[0], coords[1], coords[2], coords[3]) {
            (Some(lat1), Some(lon1), Some(lat2), Some(lon2))
                if validate_coordinates(lat1, lon1) && validate_coordinates(lat2, lon2) =>
            {
                PendingRectangle {
                    latitude_1: lat1,
                    longitude_1: lon1,
                    latitude_2: lat2,
                    longitude_2: lon2,
                }
            }
            _ => {
                self.report.skip(line.line_number, "Rectangle", "invalid coordinate values");
                return;
            }
        };

        // Attach immediately when the owner was defined earlier in this
        // file; otherwise park the payload under the raw token. A later
        // defining line in this file flushes it, and end-of-file flushing
        // covers owners that live in other files.
        if self.cursor.defined_tokens.contains(&token) {
            match attach_to_owner(self.db, &token, &payload) {
                Some(true) => self.report.count_created("rectangles"),
                Some(false) => {}
                None => self.pending.entry(token).or_default().push(payload),
            }
        } else {
            self.pending.entry(token).or_default().push(payload);
        }
    }

    fn circle(&mut self, line: &RecordLine) {
        if line.fields.len() < 4 {
            log::debug!("line {}: Circle coverage record (no coords)", line.line_number);
            return;
        }
        let lat = parse_f64_opt(line.field(1).trim());
        let lon = parse_f64_opt(line.field(2).trim());
        let radius = parse_f64_opt(line.field(3).trim());
        match (lat, lon, radius) {
            (Some(lat), Some(lon), Some(radius)) => {
                log::debug!(
                    "line {}: Circle coverage: Id={}, Lat={}, Lon={}, Radius={}",
                    line.line_number, line.field(0), lat, lon, radius
                );
            }
            _ => {
                self.report.skip(line.line_number, "Circle", "invalid coordinate values");
            }
        }
    }

    fn site(&mut self, line: &RecordLine) {
        let agency_id = match self.trunk_agency(line, "Site") {
            Some(id) => id,
            None => return,
        };
        let site_id = match extract_id(line.field(0).trim(), "SiteId") {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "Site", "missing SiteId");
                return;
            }
        };

        let name_tag = line.field(2).trim().to_string();
        let enabled = line.field(3).trim() == "On";
        let latitude = self.coordinate(line, 4, -90.0, 90.0);
        let longitude = self.coordinate(line, 5, -180.0, 180.0);
        let range_miles = parse_f64_opt(line.field(6));
        let modulation = line.field(7).trim().to_string();
        let location_type = line.field(10).trim().to_string();

        match self.db.sites.get_mut(&site_id) {
            Some(site) => {
                site.agency_id = agency_id;
                site.name_tag = name_tag;
                site.enabled = enabled;
                site.latitude = latitude;
                site.longitude = longitude;
                site.range_miles = range_miles;
                site.modulation = modulation;
                site.location_type = location_type;
                site.frequencies.clear();
                site.rectangles.clear();
                site.band_plan_mot = None;
                site.band_plan_p25 = None;
            }
            None => {
                self.db.sites.insert(
                    site_id,
                    Site {
                        site_id,
                        agency_id,
                        name_tag,
                        enabled,
                        latitude,
                        longitude,
                        range_miles,
                        modulation,
                        location_type,
                        frequencies: Vec::new(),
                        rectangles: Vec::new(),
                        band_plan_mot: None,
                        band_plan_p25: None,
                    },
                );
                self.report.count_created("sites");
            }
        }
        let agency = self.db.agencies.get_mut(&agency_id).unwrap();
        if !agency.site_ids.contains(&site_id) {
            agency.site_ids.push(site_id);
        }

        self.cursor.site = Some(site_id);
        self.cursor.talk_group = None;
        self.flush_pending(line.field(0).trim());
    }

    fn talk_group(&mut self, line: &RecordLine) {
        let agency_id = match self.trunk_agency(line, "T-Group") {
            Some(id) => id,
            None => return,
        };
        let tgroup_id = match extract_id(line.field(0).trim(), "TGroupId") {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "T-Group", "missing TGroupId");
                return;
            }
        };

        let name_tag = line.field(2).trim().to_string();
        let enabled = line.field(3).trim() == "On";
        let latitude = self.coordinate(line, 4, -90.0, 90.0);
        let longitude = self.coordinate(line, 5, -180.0, 180.0);
        let range_miles = parse_f64_opt(line.field(6));
        let location_type = line.field(7).trim().to_string();

        match self.db.talk_groups.get_mut(&tgroup_id) {
            Some(tgroup) => {
                tgroup.agency_id = agency_id;
                tgroup.name_tag = name_tag;
                tgroup.enabled = enabled;
                tgroup.latitude = latitude;
                tgroup.longitude = longitude;
                tgroup.range_miles = range_miles;
                tgroup.location_type = location_type;
                tgroup.rectangles.clear();
            }
            None => {
                self.db.talk_groups.insert(
                    tgroup_id,
                    TalkGroup {
                        tgroup_id,
                        agency_id,
                        name_tag,
                        enabled,
                        latitude,
                        longitude,
                        range_miles,
                        location_type,
                        tgid_ids: Vec::new(),
                        rectangles: Vec::new(),
                    },
                );
                self.report.count_created("talk_groups");
            }
        }
        let agency = self.db.agencies.get_mut(&agency_id).unwrap();
        if !agency.talk_group_ids.contains(&tgroup_id) {
            agency.talk_group_ids.push(tgroup_id);
        }

        self.cursor.talk_group = Some(tgroup_id);
        self.flush_pending(line.field(0).trim());
    }

    fn trunk_frequency(&mut self, line: &RecordLine) {
        let site_id = match self.cursor.site {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "T-Freq", "no live site");
                return;
            }
        };
        let frequency = line
            .field(4)
            .parse::<u64>()
            .ok()
            .filter(|hz| validate_frequency(*hz))
            .unwrap_or(0);
        let lcn = parse_u32_or(line.field(5), 0);
        let color_code = line.field(6).trim().to_string();

        let site = self.db.sites.get_mut(&site_id).unwrap();
        let order = site.frequencies.len() as u32;
        site.frequencies.push(TrunkFrequency { frequency, lcn, color_code, order });
        self.report.count_created("trunk_frequencies");
    }

    fn talk_group_id(&mut self, line: &RecordLine) {
        let tgroup_id = match self.cursor.talk_group {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "TGID", "no live talk group");
                return;
            }
        };
        let tid = match extract_id(line.field(0).trim(), "Tid") {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "TGID", "missing Tid");
                return;
            }
        };

        let name_tag = line.field(2).trim().to_string();
        let enabled = line.field(3).trim() == "On";
        let tgid = line.field(4).trim().to_string();
        let audio_type = line.field(5).trim().to_string();
        let delay = parse_i32_or(line.field(7), 2);

        match self.db.talk_group_ids.get_mut(&tid) {
            Some(entry) => {
                entry.tgroup_id = tgroup_id;
                entry.name_tag = name_tag;
                entry.enabled = enabled;
                entry.tgid = tgid;
                entry.audio_type = audio_type;
                entry.delay = delay;
            }
            None => {
                self.db.talk_group_ids.insert(
                    tid,
                    TalkGroupId { tid, tgroup_id, name_tag, enabled, tgid, audio_type, delay },
                );
                self.report.count_created("talk_group_ids");
            }
        }
        let tgroup = self.db.talk_groups.get_mut(&tgroup_id).unwrap();
        if !tgroup.tgid_ids.contains(&tid) {
            tgroup.tgid_ids.push(tid);
        }
    }

    fn lm_site(&mut self, line: &RecordLine) {
        let state_id = find_id(&line.fields, "StateId");
        let county_id = find_id(&line.fields, "CountyId");
        let trunk_id = find_id(&line.fields, "TrunkId");
        let site_id = find_id(&line.fields, "SiteId");

        let mut latitude = None;
        let mut longitude = None;
        if line.fields.len() >= 8 {
            latitude = parse_f64_opt(line.fields[line.fields.len() - 2].trim());
            longitude = parse_f64_opt(line.fields[line.fields.len() - 1].trim());
            if latitude.is_none() || longitude.is_none() {
                log::warn!("line {}: LM has invalid lat/long", line.line_number);
            }
        }
        log::debug!(
            "line {}: LM site: StateId={:?}, CountyId={:?}, TrunkId={:?}, SiteId={:?}, Lat={:?}, Lng={:?}",
            line.line_number, state_id, county_id, trunk_id, site_id, latitude, longitude
        );
    }

    fn fleet_map(&mut self, line: &RecordLine) {
        let agency_id = match self.trunk_agency(line, "FleetMap") {
            Some(id) => id,
            None => return,
        };
        let my_id = line.field(0).to_string();
        let blocks: Vec<String> =
            line.fields.iter().skip(1).take(8).cloned().collect();
        let agency = self.db.agencies.get_mut(&agency_id).unwrap();
        let order = agency.fleet_maps.len() as u32;
        agency.fleet_maps.push(FleetMapEntry { my_id, blocks, order });
    }

    fn unit_ids(&mut self, line: &RecordLine) {
        let agency_id = match self.trunk_agency(line, "UnitIds") {
            Some(id) => id,
            None => return,
        };
        if line.fields.len() < 4 {
            self.report.skip(line.line_number, "UnitIds", "insufficient fields (< 4)");
            return;
        }
        let entry_name = line.field(2).to_string();
        let unit_id = if is_digits(line.field(3)) {
            line.field(3).parse().unwrap_or(0)
        } else {
            0
        };
        let alert_tone = line.field_or(4, "Off");
        let alert_volume = line.field_or(5, "Auto");

        let agency = self.db.agencies.get_mut(&agency_id).unwrap();
        let order = agency.unit_ids.len() as u32;
        agency.unit_ids.push(UnitIdEntry {
            name_tag: entry_name,
            unit_id,
            alert_tone,
            alert_volume,
            order,
        });
    }

    fn avoid_tgids(&mut self, line: &RecordLine) {
        let agency_id = match self.trunk_agency(line, "AvoidTgids") {
            Some(id) => id,
            None => return,
        };
        let my_id = line.field(0).to_string();
        let tgids: Vec<String> = line.fields.iter().skip(1).cloned().collect();
        let agency = self.db.agencies.get_mut(&agency_id).unwrap();
        let order = agency.avoid_tgids.len() as u32;
        agency.avoid_tgids.push(AvoidTgidEntry { my_id, tgids, order });
    }

    fn band_plan_mot(&mut self, line: &RecordLine) {
        let site_id = match self.cursor.site {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "BandPlan_Mot", "no live site");
                return;
            }
        };
        let bands: Vec<MotBand> = line
            .fields
            .get(1..)
            .unwrap_or(&[])
            .chunks(4)
            .map(|chunk| MotBand {
                lower: chunk.first().and_then(|v| v.parse().ok()).unwrap_or(0),
                upper: chunk.get(1).and_then(|v| v.parse().ok()).unwrap_or(0),
                spacing: chunk.get(2).and_then(|v| v.parse().ok()).unwrap_or(0),
                offset: chunk.get(3).and_then(|v| v.parse().ok()).unwrap_or(0),
            })
            .collect();
        self.db.sites.get_mut(&site_id).unwrap().band_plan_mot = Some(bands);
    }

    fn band_plan_p25(&mut self, line: &RecordLine) {
        let site_id = match self.cursor.site {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "BandPlan_P25", "no live site");
                return;
            }
        };
        let bands: Vec<P25Band> = line
            .fields
            .get(1..)
            .unwrap_or(&[])
            .chunks(2)
            .map(|chunk| P25Band {
                base: chunk.first().and_then(|v| v.parse().ok()).unwrap_or(0),
                spacing: chunk.get(1).and_then(|v| v.parse().ok()).unwrap_or(0),
            })
            .collect();
        self.db.sites.get_mut(&site_id).unwrap().band_plan_p25 = Some(bands);
    }

    fn dqks_status(&mut self, line: &RecordLine) {
        let agency_id = match self.cursor.agency {
            Some(id) => id,
            None => {
                self.report.skip(line.line_number, "DQKs_Status", "no live system");
                return;
            }
        };
        let agency = self.db.agencies.get_mut(&agency_id).unwrap();
        agency.dqks_my_id = line.field(0).to_string();
        agency.dqks_status = line.fields.iter().skip(1).cloned().collect();
    }

    /// The current agency, required to be a trunked system.
    fn trunk_agency(&mut self, line: &RecordLine, tag: &str) -> Option<u32> {
        match self.cursor.agency {
            Some(id) if self.db.agencies[&id].system_type == SystemType::Trunk => Some(id),
            Some(_) => {
                self.report.skip(line.line_number, tag, "current system is not trunked");
                None
            }
            None => {
                self.report.skip(line.line_number, tag, "no live system");
                None
            }
        }
    }

    /// Parse an optional coordinate field; out-of-range values become None
    /// with a warning (value error, never fatal).
    fn coordinate(&mut self, line: &RecordLine, index: usize, min: f64, max: f64) -> Option<f64> {
        let raw = line.field(index);
        let value = parse_f64_opt(raw)?;
        if (min..=max).contains(&value) {
            Some(value)
        } else {
            log::warn!(
                "line {}: coordinate {} out of range [{}, {}], ignored",
                line.line_number, value, min, max
            );
            None
        }
    }

    /// Record that `token`'s defining line was seen in this file, then
    /// drain every cached rectangle waiting on it into the owner.
    fn flush_pending(&mut self, token: &str) {
        self.cursor.defined_tokens.insert(token.to_string());
        let Some(payloads) = self.pending.remove(token) else {
            return;
        };
        let count = payloads.len();
        for payload in payloads {
            if attach_to_owner(self.db, token, &payload) == Some(true) {
                self.report.count_created("rectangles");
            }
        }
        log::debug!("applied {} cached rectangles to {}", count, token);
    }
}

/// Attach one rectangle payload to the owner named by `token`.
/// Returns None when no matching owner exists, Some(false) when the owner
/// already carries an identical rectangle (re-parse), Some(true) on push.
fn attach_to_owner(
    db: &mut HpdbDatabase,
    token: &str,
    payload: &PendingRectangle,
) -> Option<bool> {
    let rectangles: &mut Vec<Rectangle> = if let Some(id) = extract_id(token, "CGroupId") {
        &mut db.channel_groups.get_mut(&id)?.rectangles
    } else if let Some(id) = extract_id(token, "SiteId") {
        &mut db.sites.get_mut(&id)?.rectangles
    } else if let Some(id) = extract_id(token, "TGroupId") {
        &mut db.talk_groups.get_mut(&id)?.rectangles
    } else {
        return None;
    };

    let duplicate = rectangles.iter().any(|r| {
        r.latitude_1 == payload.latitude_1
            && r.longitude_1 == payload.longitude_1
            && r.latitude_2 == payload.latitude_2
            && r.longitude_2 == payload.longitude_2
    });
    if duplicate {
        return Some(false);
    }
    let order = rectangles.len() as u32;
    rectangles.push(Rectangle {
        latitude_1: payload.latitude_1,
        longitude_1: payload.longitude_1,
        latitude_2: payload.latitude_2,
        longitude_2: payload.longitude_2,
        order,
    });
    Some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> (HpdbDatabase, StructuredRecordStore, FileReport) {
        let mut db = HpdbDatabase::new();
        let mut store = StructuredRecordStore::new();
        let mut parser = HpdbParser::new();
        let report = parser.parse_system_source(&mut db, &mut store, "s_000001.hpd", content);
        (db, store, report)
    }

    const BASIC_SYSTEM: &str = "\
StateInfo\tStateId=6\tCountryId=1\tColorado\tCO
Conventional\tAgencyId=12\tStateId=6\tPolice Dept\tOn\t
C-Group\tCGroupId=5\tAgencyId=12\tDispatch\tOn\t39.5\t-104.8\t10\tCircle
C-Freq\tCFreqId=9\tCGroupId=5\tMain\tOn\t460025000\tFM\tTONE=100\t2
";

    #[test]
    fn test_example_scenario() {
        let (db, _, report) = parse(BASIC_SYSTEM);

        let agency = &db.agencies[&12];
        assert_eq!(agency.name_tag, "Police Dept");
        assert!(agency.enabled);
        assert_eq!(agency.system_type, SystemType::Conventional);
        assert!(agency.state_ids.contains(&6));

        let group = &db.channel_groups[&5];
        assert_eq!(group.agency_id, 12);
        assert_eq!(group.latitude, Some(39.5));
        assert_eq!(group.longitude, Some(-104.8));

        let freq = &db.frequencies[&9];
        assert_eq!(freq.cgroup_id, 5);
        assert_eq!(freq.frequency, 460_025_000);
        assert_eq!(freq.modulation, "FM");
        assert_eq!(freq.audio_option, "TONE=100");
        assert!(report.skipped_lines.is_empty());
    }

    #[test]
    fn test_idempotent_reparse() {
        let mut db = HpdbDatabase::new();
        let mut store = StructuredRecordStore::new();
        let mut parser = HpdbParser::new();
        parser.parse_system_source(&mut db, &mut store, "s_000001.hpd", BASIC_SYSTEM);
        let first = db.clone();
        parser.parse_system_source(&mut db, &mut store, "s_000001.hpd", BASIC_SYSTEM);
        assert_eq!(first, db);
    }

    #[test]
    fn test_forward_referenced_rectangle() {
        let content = "\
Conventional\tAgencyId=12\tStateId=0\tStatewide Ops\tOn\t
Rectangle\tCGroupId=7\t40.1\t-105.2\t39.9\t-104.9
C-Group\tCGroupId=7\tAgencyId=12\tNorth Metro\tOn\t\t\t\tRectangles
";
        let (db, _, report) = parse(content);
        let group = &db.channel_groups[&7];
        assert_eq!(group.rectangles.len(), 1);
        assert_eq!(group.rectangles[0].latitude_1, 40.1);
        assert!(report.unattached_rectangles.is_empty());
    }

    #[test]
    fn test_orphan_rectangle_reported() {
        let content = "Rectangle\tCGroupId=99\t40.1\t-105.2\t39.9\t-104.9\n";
        let (_, _, report) = parse(content);
        assert_eq!(report.unattached_rectangles.len(), 1);
        assert_eq!(report.unattached_rectangles[0].owner_token, "CGroupId=99");
        assert_eq!(report.unattached_rectangles[0].count, 1);
    }

    #[test]
    fn test_sentinel_nationwide_created_once() {
        let content = "\
StateInfo\tStateId=0\tCountryId=0\tNationwide\t
StateInfo\tStateId=0\tCountryId=0\tNationwide\t
Conventional\tAgencyId=3\tStateId=0\tFederal Common\tOn\t
";
        let (db, _, _) = parse(content);
        assert_eq!(db.states.values().filter(|s| s.name_tag == "Nationwide").count(), 1);
        assert!(db.agencies[&3].state_ids.contains(&0));
    }

    #[test]
    fn test_truncated_line_reported_rest_survives() {
        let content = "\
Conventional\tAgencyId=12\tStateId=6\tPolice Dept\tOn\t
C-Group\tCGroupId=5\tAgencyId=12\tDispatch\tOn\t39.5\t-104.8\t10\tCircle
C-Freq\tCFreqId=1\tbad
C-Freq\tCFreqId=9\tCGroupId=5\tMain\tOn\t460025000\tFM\tTONE=100\t2
";
        let (db, _, report) = parse(content);
        assert_eq!(db.frequencies.len(), 1);
        assert!(db.frequencies.contains_key(&9));
        assert_eq!(report.skipped_lines.len(), 1);
        assert_eq!(report.skipped_lines[0].line_number, 3);
    }

    #[test]
    fn test_child_without_ancestor_dropped_with_diagnostic() {
        let content = "C-Freq\tCFreqId=9\tCGroupId=5\tMain\tOn\t460025000\tFM\tTONE=100\t2\n";
        let (db, _, report) = parse(content);
        assert!(db.frequencies.is_empty());
        assert_eq!(report.skipped_lines.len(), 1);
        assert!(report.skipped_lines[0].reason.contains("no live channel group"));
    }

    #[test]
    fn test_new_system_resets_descendant_pointers() {
        // The second system has no C-Group of its own; its C-Freq must not
        // leak into the previous system's group.
        let content = "\
Conventional\tAgencyId=1\tStateId=6\tFirst\tOn\t
C-Group\tCGroupId=5\tAgencyId=1\tDispatch\tOn\t\t\t\tCircle
Conventional\tAgencyId=2\tStateId=6\tSecond\tOn\t
C-Freq\tCFreqId=9\tCGroupId=5\tMain\tOn\t460025000\tFM\t\t2
";
        let (db, _, report) = parse(content);
        assert!(db.channel_groups[&5].frequency_ids.is_empty());
        assert!(db.frequencies.is_empty());
        assert_eq!(report.skipped_lines.len(), 1);
    }

    #[test]
    fn test_implausible_frequency_skipped() {
        let content = "\
Conventional\tAgencyId=1\tStateId=6\tX\tOn\t
C-Group\tCGroupId=5\tAgencyId=1\tG\tOn\t\t\t\tCircle
C-Freq\tCFreqId=9\tCGroupId=5\tMain\tOn\t12345\tFM\t\t2
";
        let (db, _, report) = parse(content);
        assert!(db.frequencies.is_empty());
        assert_eq!(report.skipped_lines.len(), 1);
    }

    #[test]
    fn test_trunk_hierarchy() {
        let content = "\
Trunk\tAgencyId=20\tStateId=6\tState DTRS\tOn\tP25
Site\tSiteId=101\tAgencyId=20\tDenver Simulcast\tOn\t39.7\t-104.9\t25\tAUTO\t\t\tCircle
BandPlan_P25\tSiteId=101\t851006250\t6250
T-Freq\t\tSiteId=101\t\t\t851062500\t1\t
T-Group\tTGroupId=55\tAgencyId=20\tLaw Dispatch\tOn\t\t\t\tCircle
TGID\tTid=901\tTGroupId=55\tDenver PD 1\tOn\t1001\tALL\t\t2
";
        let (db, _, report) = parse(content);
        assert_eq!(db.sites[&101].agency_id, 20);
        assert_eq!(db.sites[&101].frequencies.len(), 1);
        assert_eq!(db.sites[&101].frequencies[0].frequency, 851_062_500);
        assert!(db.sites[&101].band_plan_p25.is_some());
        assert_eq!(db.talk_groups[&55].tgid_ids, vec![901]);
        assert_eq!(db.talk_group_ids[&901].tgid, "1001");
        assert!(report.skipped_lines.is_empty());
    }

    #[test]
    fn test_site_under_conventional_rejected() {
        let content = "\
Conventional\tAgencyId=1\tStateId=6\tX\tOn\t
Site\tSiteId=101\tAgencyId=1\tBogus\tOn\t\t\t\tAUTO\t\t\tCircle
";
        let (db, _, report) = parse(content);
        assert!(db.sites.is_empty());
        assert!(report.skipped_lines[0].reason.contains("not trunked"));
    }

    #[test]
    fn test_rectangle_order_increments_on_every_attachment() {
        let content = "\
Trunk\tAgencyId=20\tStateId=6\tDTRS\tOn\tP25
Site\tSiteId=101\tAgencyId=20\tSite A\tOn\t\t\t\tAUTO\t\t\tRectangles
Rectangle\tSiteId=101\t40.0\t-105.0\t39.0\t-104.0
Rectangle\tSiteId=101\t41.0\t-106.0\t40.0\t-105.0
";
        let (db, _, _) = parse(content);
        let rects = &db.sites[&101].rectangles;
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].order, 0);
        assert_eq!(rects[1].order, 1);
    }
}
