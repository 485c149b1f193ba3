// Favorites hierarchical builder
//
// Parses the f_list.cfg index and the per-list f_*.hpd files with full
// record support. The same cursor discipline as the HPDB builder applies:
// a Conventional or Trunk line resets every descendant pointer, children
// attach to the most recent live ancestor, and a child with no ancestor is
// dropped with a diagnostic rather than merged into the wrong parent.
//
// Favorites records usually carry empty MyId columns, so Rectangle owner
// resolution is purely positional here: a rectangle attaches to the current
// site, else the current talk group, else the current channel group.

use crate::record::dispatcher::{Dispatcher, RecordHandler, RecordType};
use crate::record::report::FileReport;
use crate::record::store::StructuredRecordStore;
use crate::record::tokenizer::{self, RecordLine};
use crate::record::value::{is_digits, parse_f64_opt, parse_i32_or, parse_u32_or};

use super::model::{
    AvoidTgidEntry, Channel, ChannelGroup, ConventionalSystem, FavoritesList, FleetMapEntry,
    MotBand, MotBandPlan, P25Band, P25BandPlan, Rectangle, Site, TalkGroup, TalkGroupId,
    TrunkSystem, TrunkedFrequency, UnitIdEntry,
};

fn parse_u64_digits(value: &str) -> u64 {
    if is_digits(value) {
        value.parse().unwrap_or(0)
    } else {
        0
    }
}

/// Indices of the current ancestors inside the list being built.
#[derive(Debug, Default)]
struct Cursor {
    conventional: Option<usize>,
    trunk: Option<usize>,
    group: Option<usize>,
    site: Option<usize>,
    talk_group: Option<usize>,
}

/// Parser for f_list.cfg and f_*.hpd favorites files.
pub struct FavoritesParser {
    dispatcher: Dispatcher,
}

impl Default for FavoritesParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FavoritesParser {
    pub fn new() -> Self {
        Self { dispatcher: Dispatcher::new() }
    }

    /// Parse the f_list.cfg index into one FavoritesList per F-List row,
    /// in file order.
    pub fn parse_index_source(
        &mut self,
        store: &mut StructuredRecordStore,
        file_name: &str,
        content: &str,
    ) -> (Vec<FavoritesList>, FileReport) {
        log::info!("parsing favorites index: {}", file_name);
        store.begin_file(file_name);

        let mut report = FileReport::new(file_name);
        let mut lists: Vec<FavoritesList> = Vec::new();
        let mut scanner_model = "BCDx36HP".to_string();
        let mut format_version = "1.00".to_string();

        tokenizer::each_line(content, |line| {
            store.append(file_name, &line);
            match line.record_type.as_str() {
                "TargetModel" => {
                    if !line.field(0).is_empty() {
                        scanner_model = line.field(0).trim().to_string();
                    }
                }
                "FormatVersion" => {
                    if !line.field(0).is_empty() {
                        format_version = line.field(0).trim().to_string();
                    }
                }
                "F-List" => {
                    if line.fields.len() < 6 {
                        report.skip(line.line_number, "F-List", "insufficient fields (< 6)");
                        return;
                    }
                    let order = lists.len() as u32;
                    lists.push(FavoritesList {
                        user_name: line.field(0).trim().to_string(),
                        filename: line.field(1).trim().to_string(),
                        scanner_model: scanner_model.clone(),
                        format_version: format_version.clone(),
                        location_control: line.field_or(2, "Off").trim().to_string(),
                        monitor: line.field_or(3, "Off").trim().to_string(),
                        quick_key: line.field_or(4, "Off").trim().to_string(),
                        number_tag: line.field_or(5, "Off").trim().to_string(),
                        startup_keys: (6..16)
                            .map(|i| line.field_or(i, "Off").trim().to_string())
                            .collect(),
                        s_qkeys: (16..116)
                            .map(|i| line.field_or(i, "Off").trim().to_string())
                            .collect(),
                        order,
                        conventional_systems: Vec::new(),
                        trunk_systems: Vec::new(),
                    });
                    report.count_created("favorites_lists");
                }
                _ => {}
            }
        });

        log::info!("parsed {} favorites lists", lists.len());
        (lists, report)
    }

    /// Parse one f_*.hpd favorites file into `list`. Any previously parsed
    /// systems on the list are replaced, so re-importing is idempotent.
    pub fn parse_file_source(
        &mut self,
        list: &mut FavoritesList,
        store: &mut StructuredRecordStore,
        file_name: &str,
        content: &str,
    ) -> FileReport {
        log::info!("parsing favorites file: {}", file_name);
        self.dispatcher.reset();
        store.begin_file(file_name);
        list.clear_systems();

        let mut report = FileReport::new(file_name);
        let mut cursor = Cursor::default();
        {
            let mut handler = FavoritesHandler { list, report: &mut report, cursor: &mut cursor };
            tokenizer::each_line(content, |line| {
                store.append(file_name, &line);
                self.dispatcher.dispatch(&line, &mut handler);
            });
        }

        self.dispatcher.log_summary();
        report.unrecognized_record_types = self.dispatcher.unknown_tags();
        report
    }
}

struct FavoritesHandler<'a> {
    list: &'a mut FavoritesList,
    report: &'a mut FileReport,
    cursor: &'a mut Cursor,
}

impl RecordHandler for FavoritesHandler<'_> {
    fn handles(&self, record_type: RecordType) -> bool {
        matches!(
            record_type,
            RecordType::TargetModel
                | RecordType::FormatVersion
                | RecordType::DateModified
                | RecordType::Conventional
                | RecordType::Trunk
                | RecordType::DqksStatus
                | RecordType::CGroup
                | RecordType::CFreq
                | RecordType::Site
                | RecordType::BandPlanMot
                | RecordType::BandPlanP25
                | RecordType::FleetMap
                | RecordType::UnitIds
                | RecordType::AvoidTgids
                | RecordType::TFreq
                | RecordType::TGroup
                | RecordType::Tgid
                | RecordType::Rectangle
        )
    }

    fn handle(&mut self, record_type: RecordType, line: &RecordLine) -> Result<(), String> {
        match record_type {
            RecordType::TargetModel => {
                if !line.field(0).is_empty() {
                    self.list.scanner_model = line.field(0).trim().to_string();
                }
            }
            RecordType::FormatVersion => {
                if !line.field(0).is_empty() {
                    self.list.format_version = line.field(0).trim().to_string();
                }
            }
            RecordType::DateModified => {
                log::debug!("line {}: DateModified: {}", line.line_number, line.field(0));
            }
            RecordType::Conventional => self.conventional(line),
            RecordType::Trunk => self.trunk(line),
            RecordType::DqksStatus => self.dqks_status(line),
            RecordType::CGroup => self.channel_group(line),
            RecordType::CFreq => self.channel(line),
            RecordType::Site => self.site(line),
            RecordType::BandPlanMot => self.band_plan_mot(line),
            RecordType::BandPlanP25 => self.band_plan_p25(line),
            RecordType::FleetMap => self.fleet_map(line),
            RecordType::UnitIds => self.unit_ids(line),
            RecordType::AvoidTgids => self.avoid_tgids(line),
            RecordType::TFreq => self.trunked_frequency(line),
            RecordType::TGroup => self.talk_group(line),
            RecordType::Tgid => self.talk_group_id(line),
            RecordType::Rectangle => self.rectangle(line),
            _ => {}
        }
        Ok(())
    }
}

impl FavoritesHandler<'_> {
    fn conventional(&mut self, line: &RecordLine) {
        if line.fields.is_empty() {
            self.report.skip(line.line_number, "Conventional", "empty record");
            return;
        }
        let order = self.list.conventional_systems.len() as u32;
        self.list.conventional_systems.push(ConventionalSystem {
            my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            avoid: line.field_or(3, "Off"),
            reserve: line.field(4).to_string(),
            system_type: line.field(5).to_string(),
            quick_key: line.field_or(6, "Off"),
            number_tag: line.field_or(7, "Off"),
            system_hold_time: parse_u32_or(line.field(8), 0),
            analog_agc: line.field_or(9, "Off"),
            digital_agc: line.field_or(10, "Off"),
            digital_waiting_time: parse_u32_or(line.field(11), 400),
            digital_threshold_mode: line.field_or(12, "Manual"),
            digital_threshold_level: parse_u32_or(line.field(13), 8),
            dqks_my_id: String::new(),
            dqks_status: Vec::new(),
            order,
            groups: Vec::new(),
        });
        self.report.count_created("conventional_systems");

        self.cursor.conventional = Some(self.list.conventional_systems.len() - 1);
        self.cursor.trunk = None;
        self.cursor.group = None;
        self.cursor.site = None;
        self.cursor.talk_group = None;
    }

    fn trunk(&mut self, line: &RecordLine) {
        if line.fields.is_empty() {
            self.report.skip(line.line_number, "Trunk", "empty record");
            return;
        }
        let order = self.list.trunk_systems.len() as u32;
        self.list.trunk_systems.push(TrunkSystem {
            my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            avoid: line.field_or(3, "Off"),
            reserve: line.field(4).to_string(),
            system_type: line.field(5).to_string(),
            id_search: line.field_or(6, "Off"),
            alert_tone: line.field_or(7, "Off"),
            alert_volume: line.field_or(8, "Auto"),
            status_bit: line.field_or(9, "Ignore"),
            nac: line.field_or(10, "Srch"),
            quick_key: line.field_or(11, "Off"),
            number_tag: line.field_or(12, "Off"),
            site_hold_time: parse_u32_or(line.field(13), 0),
            analog_agc: line.field_or(14, "Off"),
            digital_agc: line.field_or(15, "Off"),
            end_code: line.field_or(16, "Analog"),
            priority_id_scan: line.field_or(17, "Off"),
            alert_color: line.field_or(18, "Off"),
            alert_pattern: line.field_or(19, "On"),
            tgid_format: line.field(20).to_string(),
            dqks_my_id: String::new(),
            dqks_status: Vec::new(),
            order,
            sites: Vec::new(),
            talk_groups: Vec::new(),
            fleet_maps: Vec::new(),
            unit_ids: Vec::new(),
            avoid_tgids: Vec::new(),
        });
        self.report.count_created("trunk_systems");

        self.cursor.trunk = Some(self.list.trunk_systems.len() - 1);
        self.cursor.conventional = None;
        self.cursor.group = None;
        self.cursor.site = None;
        self.cursor.talk_group = None;
    }

    /// Quick-key status attaches to whichever system is live.
    fn dqks_status(&mut self, line: &RecordLine) {
        let my_id = line.field(0).to_string();
        let flags: Vec<String> = line.fields.iter().skip(1).cloned().collect();

        if let Some(ci) = self.cursor.conventional {
            let system = &mut self.list.conventional_systems[ci];
            system.dqks_my_id = my_id;
            system.dqks_status = flags;
        } else if let Some(ti) = self.cursor.trunk {
            let system = &mut self.list.trunk_systems[ti];
            system.dqks_my_id = my_id;
            system.dqks_status = flags;
        } else {
            self.report.skip(line.line_number, "DQKs_Status", "no live system");
        }
    }

    fn channel_group(&mut self, line: &RecordLine) {
        let ci = match self.cursor.conventional {
            Some(ci) => ci,
            None => {
                self.report.skip(line.line_number, "C-Group", "no live conventional system");
                return;
            }
        };
        if line.fields.is_empty() {
            self.report.skip(line.line_number, "C-Group", "empty record");
            return;
        }
        let system = &mut self.list.conventional_systems[ci];
        let order = system.groups.len() as u32;
        system.groups.push(ChannelGroup {
            my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            avoid: line.field_or(3, "Off"),
            latitude: parse_f64_opt(line.field(4)),
            longitude: parse_f64_opt(line.field(5)),
            range_miles: parse_f64_opt(line.field(6)),
            location_type: line.field_or(7, "Circle"),
            quick_key: line.field_or(8, "Off"),
            filter: line.field(9).to_string(),
            order,
            channels: Vec::new(),
            rectangles: Vec::new(),
        });
        self.report.count_created("channel_groups");
        self.cursor.group = Some(system.groups.len() - 1);
    }

    fn channel(&mut self, line: &RecordLine) {
        let (ci, gi) = match (self.cursor.conventional, self.cursor.group) {
            (Some(ci), Some(gi)) => (ci, gi),
            _ => {
                self.report.skip(line.line_number, "C-Freq", "no live channel group");
                return;
            }
        };
        if line.fields.is_empty() {
            self.report.skip(line.line_number, "C-Freq", "empty record");
            return;
        }
        let group = &mut self.list.conventional_systems[ci].groups[gi];
        let order = group.channels.len() as u32;
        group.channels.push(Channel {
            my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            avoid: line.field_or(3, "Off"),
            frequency: parse_u64_digits(line.field(4)),
            modulation: line.field_or(5, "AUTO"),
            audio_option: line.field(6).to_string(),
            // 21 = Other, a valid service type default.
            func_tag_id: parse_u32_or(line.field(7), 21),
            attenuator: line.field_or(8, "Off"),
            delay: parse_i32_or(line.field(9), 2),
            volume_offset: parse_i32_or(line.field(10), 0),
            alert_tone: line.field_or(11, "Off"),
            alert_volume: line.field_or(12, "Auto"),
            alert_color: line.field_or(13, "Off"),
            alert_pattern: line.field_or(14, "On"),
            number_tag: line.field_or(15, "Off"),
            priority_channel: line.field_or(16, "Off"),
            order,
        });
        self.report.count_created("channels");
    }

    fn site(&mut self, line: &RecordLine) {
        let ti = match self.cursor.trunk {
            Some(ti) => ti,
            None => {
                self.report.skip(line.line_number, "Site", "no live trunk system");
                return;
            }
        };
        if line.fields.is_empty() {
            self.report.skip(line.line_number, "Site", "empty record");
            return;
        }
        let system = &mut self.list.trunk_systems[ti];
        let order = system.sites.len() as u32;
        system.sites.push(Site {
            my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            avoid: line.field_or(3, "Off"),
            latitude: parse_f64_opt(line.field(4)),
            longitude: parse_f64_opt(line.field(5)),
            range_miles: parse_f64_opt(line.field(6)),
            modulation: line.field_or(7, "AUTO"),
            mot_band_type: line.field_or(8, "Standard"),
            edacs_band_type: line.field_or(9, "Wide"),
            location_type: line.field_or(10, "Circle"),
            attenuator: line.field_or(11, "Off"),
            digital_waiting_time: parse_u32_or(line.field(12), 400),
            digital_threshold_mode: line.field_or(13, "Manual"),
            digital_threshold_level: parse_u32_or(line.field(14), 8),
            quick_key: line.field_or(15, "Off"),
            nac: line.field_or(16, "Srch"),
            filter: line.field(17).to_string(),
            order,
            frequencies: Vec::new(),
            rectangles: Vec::new(),
            band_plan_mot: None,
            band_plan_p25: None,
        });
        self.report.count_created("sites");
        self.cursor.site = Some(system.sites.len() - 1);
        self.cursor.talk_group = None;
    }

    fn band_plan_mot(&mut self, line: &RecordLine) {
        let (ti, si) = match (self.cursor.trunk, self.cursor.site) {
            (Some(ti), Some(si)) => (ti, si),
            _ => {
                self.report.skip(line.line_number, "BandPlan_Mot", "no live site");
                return;
            }
        };
        let my_id = line.field(0).to_string();
        let bands: Vec<MotBand> = line
            .fields
            .get(1..)
            .unwrap_or(&[])
            .chunks(4)
            .map(|chunk| MotBand {
                lower: parse_u64_digits(chunk.first().map(String::as_str).unwrap_or("")),
                upper: parse_u64_digits(chunk.get(1).map(String::as_str).unwrap_or("")),
                spacing: parse_u32_or(chunk.get(2).map(String::as_str).unwrap_or(""), 0),
                offset: parse_i32_or(chunk.get(3).map(String::as_str).unwrap_or(""), 0),
            })
            .collect();
        self.list.trunk_systems[ti].sites[si].band_plan_mot =
            Some(MotBandPlan { my_id, bands });
    }

    fn band_plan_p25(&mut self, line: &RecordLine) {
        let (ti, si) = match (self.cursor.trunk, self.cursor.site) {
            (Some(ti), Some(si)) => (ti, si),
            _ => {
                self.report.skip(line.line_number, "BandPlan_P25", "no live site");
                return;
            }
        };
        let my_id = line.field(0).to_string();
        let bands: Vec<P25Band> = line
            .fields
            .get(1..)
            .unwrap_or(&[])
            .chunks(2)
            .map(|chunk| P25Band {
                base: parse_u64_digits(chunk.first().map(String::as_str).unwrap_or("")),
                spacing: parse_u32_or(chunk.get(1).map(String::as_str).unwrap_or(""), 0),
            })
            .collect();
        self.list.trunk_systems[ti].sites[si].band_plan_p25 =
            Some(P25BandPlan { my_id, bands });
    }

    fn fleet_map(&mut self, line: &RecordLine) {
        let ti = match self.cursor.trunk {
            Some(ti) => ti,
            None => {
                self.report.skip(line.line_number, "FleetMap", "no live trunk system");
                return;
            }
        };
        let system = &mut self.list.trunk_systems[ti];
        let order = system.fleet_maps.len() as u32;
        system.fleet_maps.push(FleetMapEntry {
            my_id: line.field(0).to_string(),
            blocks: line.fields.iter().skip(1).take(8).cloned().collect(),
            order,
        });
        self.report.count_created("fleet_maps");
    }

    fn unit_ids(&mut self, line: &RecordLine) {
        let ti = match self.cursor.trunk {
            Some(ti) => ti,
            None => {
                self.report.skip(line.line_number, "UnitIds", "no live trunk system");
                return;
            }
        };
        if line.fields.len() < 4 {
            self.report.skip(line.line_number, "UnitIds", "insufficient fields (< 4)");
            return;
        }
        let system = &mut self.list.trunk_systems[ti];
        let order = system.unit_ids.len() as u32;
        system.unit_ids.push(UnitIdEntry {
            reserve1: line.field(0).to_string(),
            reserve2: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            unit_id: parse_u64_digits(line.field(3)),
            alert_tone: line.field_or(4, "Off"),
            alert_volume: line.field_or(5, "Auto"),
            alert_color: line.field_or(6, "Off"),
            alert_pattern: line.field_or(7, "On"),
            order,
        });
        self.report.count_created("unit_ids");
    }

    fn avoid_tgids(&mut self, line: &RecordLine) {
        let ti = match self.cursor.trunk {
            Some(ti) => ti,
            None => {
                self.report.skip(line.line_number, "AvoidTgids", "no live trunk system");
                return;
            }
        };
        let system = &mut self.list.trunk_systems[ti];
        let order = system.avoid_tgids.len() as u32;
        system.avoid_tgids.push(AvoidTgidEntry {
            my_id: line.field(0).to_string(),
            tgids: line.fields.iter().skip(1).cloned().collect(),
            order,
        });
        self.report.count_created("avoid_tgids");
    }

    fn trunked_frequency(&mut self, line: &RecordLine) {
        let (ti, si) = match (self.cursor.trunk, self.cursor.site) {
            (Some(ti), Some(si)) => (ti, si),
            _ => {
                self.report.skip(line.line_number, "T-Freq", "no live site");
                return;
            }
        };
        let site = &mut self.list.trunk_systems[ti].sites[si];
        let order = site.frequencies.len() as u32;
        site.frequencies.push(TrunkedFrequency {
            reserve_my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            reserve: line.field(2).to_string(),
            reserve_avoid: line.field_or(3, "Off"),
            frequency: parse_u64_digits(line.field(4)),
            lcn: parse_u32_or(line.field(5), 0),
            color_code: line.field(6).to_string(),
            order,
        });
        self.report.count_created("trunked_frequencies");
    }

    fn talk_group(&mut self, line: &RecordLine) {
        let ti = match self.cursor.trunk {
            Some(ti) => ti,
            None => {
                self.report.skip(line.line_number, "T-Group", "no live trunk system");
                return;
            }
        };
        if line.fields.is_empty() {
            self.report.skip(line.line_number, "T-Group", "empty record");
            return;
        }
        let system = &mut self.list.trunk_systems[ti];
        let order = system.talk_groups.len() as u32;
        system.talk_groups.push(TalkGroup {
            my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            avoid: line.field_or(3, "Off"),
            latitude: parse_f64_opt(line.field(4)),
            longitude: parse_f64_opt(line.field(5)),
            range_miles: parse_f64_opt(line.field(6)),
            location_type: line.field_or(7, "Circle"),
            quick_key: line.field_or(8, "Off"),
            order,
            tgids: Vec::new(),
            rectangles: Vec::new(),
        });
        self.report.count_created("talk_groups");
        self.cursor.talk_group = Some(system.talk_groups.len() - 1);
    }

    fn talk_group_id(&mut self, line: &RecordLine) {
        let (ti, gi) = match (self.cursor.trunk, self.cursor.talk_group) {
            (Some(ti), Some(gi)) => (ti, gi),
            _ => {
                self.report.skip(line.line_number, "TGID", "no live talk group");
                return;
            }
        };
        if line.fields.is_empty() {
            self.report.skip(line.line_number, "TGID", "empty record");
            return;
        }
        let tgroup = &mut self.list.trunk_systems[ti].talk_groups[gi];
        let order = tgroup.tgids.len() as u32;
        tgroup.tgids.push(TalkGroupId {
            my_id: line.field(0).to_string(),
            parent_id: line.field(1).to_string(),
            name_tag: line.field(2).to_string(),
            avoid: line.field_or(3, "Off"),
            tgid: line.field(4).to_string(),
            audio_type: line.field_or(5, "ALL"),
            func_tag_id: parse_u32_or(line.field(6), 21),
            delay: parse_i32_or(line.field(7), 2),
            volume_offset: parse_i32_or(line.field(8), 0),
            alert_tone: line.field_or(9, "Off"),
            alert_volume: line.field_or(10, "Auto"),
            alert_color: line.field_or(11, "Off"),
            alert_pattern: line.field_or(12, "On"),
            number_tag: line.field_or(13, "Off"),
            priority_channel: line.field_or(14, "Off"),
            tdma_slot: line.field_or(15, "Any"),
            order,
        });
        self.report.count_created("talk_group_ids");
    }

    /// Attach to the current site, else talk group, else channel group.
    /// The order counter advances on every successful attachment.
    fn rectangle(&mut self, line: &RecordLine) {
        if line.fields.len() < 5 {
            self.report.skip(line.line_number, "Rectangle", "insufficient fields (< 5)");
            return;
        }
        let my_id = line.field(0).to_string();
        let latitude_1 = parse_f64_opt(line.field(1));
        let longitude_1 = parse_f64_opt(line.field(2));
        let latitude_2 = parse_f64_opt(line.field(3));
        let longitude_2 = parse_f64_opt(line.field(4));

        let target = if let (Some(ti), Some(si)) = (self.cursor.trunk, self.cursor.site) {
            Some(&mut self.list.trunk_systems[ti].sites[si].rectangles)
        } else if let (Some(ti), Some(gi)) = (self.cursor.trunk, self.cursor.talk_group) {
            Some(&mut self.list.trunk_systems[ti].talk_groups[gi].rectangles)
        } else if let (Some(ci), Some(gi)) = (self.cursor.conventional, self.cursor.group) {
            Some(&mut self.list.conventional_systems[ci].groups[gi].rectangles)
        } else {
            None
        };

        match target {
            Some(rectangles) => {
                let order = rectangles.len() as u32;
                rectangles.push(Rectangle {
                    my_id,
                    latitude_1,
                    longitude_1,
                    latitude_2,
                    longitude_2,
                    order,
                });
                self.report.count_created("rectangles");
            }
            None => {
                self.report.skip(line.line_number, "Rectangle", "no live owner");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_file(content: &str) -> (FavoritesList, FileReport) {
        let mut list = FavoritesList::new("Test List", "f_000001.hpd");
        let mut store = StructuredRecordStore::new();
        let mut parser = FavoritesParser::new();
        let report = parser.parse_file_source(&mut list, &mut store, "f_000001.hpd", content);
        (list, report)
    }

    const CONVENTIONAL_FILE: &str = "\
TargetModel\tSDS200
FormatVersion\t1.00
Conventional\t\t\tLocal Fire\tOff\t\tConventional\tOff\tOff\t0\tOff\tOff\t400\tManual\t8
C-Group\t\t\tStation 1\tOff\t39.500000\t-104.800000\t10.0\tCircle\tOff\t
C-Freq\t\t\tDispatch\tOff\t154250000\tFM\tTONE=100\t11\tOff\t2\t0\tOff\tAuto\tOff\tOn\tOff\tOff
C-Freq\t\t\tTac 2\tOff\t154310000\tFM\t\t11\tOff\t2\t0\tOff\tAuto\tOff\tOn\tOff\tOff
";

    #[test]
    fn test_conventional_file() {
        let (list, report) = parse_file(CONVENTIONAL_FILE);
        assert_eq!(list.scanner_model, "SDS200");
        assert_eq!(list.conventional_systems.len(), 1);

        let system = &list.conventional_systems[0];
        assert_eq!(system.name_tag, "Local Fire");
        assert_eq!(system.groups.len(), 1);

        let group = &system.groups[0];
        assert_eq!(group.latitude, Some(39.5));
        assert_eq!(group.channels.len(), 2);
        assert_eq!(group.channels[0].frequency, 154_250_000);
        assert_eq!(group.channels[0].audio_option, "TONE=100");
        assert_eq!(group.channels[1].order, 1);
        assert!(report.skipped_lines.is_empty());
    }

    #[test]
    fn test_short_channel_gets_defaults() {
        let content = "\
Conventional\t\t\tX\tOff\t\tConventional
C-Group\t\t\tG\tOff
C-Freq\t\t\tCh\tOff\t460025000
";
        let (list, _) = parse_file(content);
        let channel = &list.conventional_systems[0].groups[0].channels[0];
        assert_eq!(channel.modulation, "AUTO");
        assert_eq!(channel.func_tag_id, 21);
        assert_eq!(channel.delay, 2);
        assert_eq!(channel.alert_volume, "Auto");
    }

    #[test]
    fn test_trunk_hierarchy_and_order() {
        let content = "\
Trunk\t\t\tState DTRS\tOff\t\tP25Standard\tOff\tOff\tAuto\tIgnore\tSrch\tOff\tOff\t0\tOff\tOff\tAnalog\tOff\tOff\tOn\t
DQKs_Status\t\tOn\tOff\tOn
FleetMap\t\tSize Code 0\tSize Code 1\t\t\t\t\t\t
Site\t\t\tSimulcast A\tOff\t39.700000\t-104.900000\t25.0\tAUTO\tStandard\tWide\tCircle\tOff\t400\tManual\t8\tOff\tSrch\t
BandPlan_P25\t\t851006250\t6250
T-Freq\t\t\t\tOff\t851062500\t1\t
Rectangle\t\t40.000000\t-105.000000\t39.000000\t-104.000000
T-Group\t\t\tLaw Dispatch\tOff\t\t\t\tCircle\tOff
TGID\t\t\tPD North\tOff\t1001\tALL\t11\t2\t0\tOff\tAuto\tOff\tOn\tOff\tOff\tAny
TGID\t\t\tPD South\tOff\t1002\tALL\t11\t2\t0\tOff\tAuto\tOff\tOn\tOff\tOff\tAny
";
        let (list, report) = parse_file(content);
        assert_eq!(list.trunk_systems.len(), 1);

        let system = &list.trunk_systems[0];
        assert_eq!(system.dqks_status, vec!["On", "Off", "On"]);
        assert_eq!(system.fleet_maps.len(), 1);
        assert_eq!(system.sites.len(), 1);

        let site = &system.sites[0];
        assert!(site.band_plan_p25.is_some());
        assert_eq!(site.frequencies.len(), 1);
        assert_eq!(site.frequencies[0].frequency, 851_062_500);
        // Rectangle arrived while the site was the live owner.
        assert_eq!(site.rectangles.len(), 1);

        let tgroup = &system.talk_groups[0];
        assert_eq!(tgroup.tgids.len(), 2);
        assert_eq!(tgroup.tgids[0].tgid, "1001");
        assert_eq!(tgroup.tgids[1].order, 1);
        assert!(report.skipped_lines.is_empty());
    }

    #[test]
    fn test_child_without_ancestor_dropped() {
        let content = "C-Freq\t\t\tOrphan\tOff\t460025000\n";
        let (list, report) = parse_file(content);
        assert!(list.conventional_systems.is_empty());
        assert_eq!(report.skipped_lines.len(), 1);
        assert!(report.skipped_lines[0].reason.contains("no live channel group"));
    }

    #[test]
    fn test_system_reset_between_branches() {
        // A C-Group arriving under a Trunk system must not attach to the
        // previous Conventional system's cursor.
        let content = "\
Conventional\t\t\tConv\tOff\t\tConventional
C-Group\t\t\tG1\tOff
Trunk\t\t\tTrk\tOff\t\tP25Standard
C-Freq\t\t\tLeaked\tOff\t460025000
";
        let (list, report) = parse_file(content);
        assert_eq!(list.conventional_systems[0].groups[0].channels.len(), 0);
        assert_eq!(report.skipped_lines.len(), 1);
    }

    #[test]
    fn test_reparse_is_idempotent() {
        let mut list = FavoritesList::new("Test", "f_000001.hpd");
        let mut store = StructuredRecordStore::new();
        let mut parser = FavoritesParser::new();
        parser.parse_file_source(&mut list, &mut store, "f_000001.hpd", CONVENTIONAL_FILE);
        let first = list.clone();
        parser.parse_file_source(&mut list, &mut store, "f_000001.hpd", CONVENTIONAL_FILE);
        assert_eq!(first, list);
        assert_eq!(store.file_records("f_000001.hpd").len(), 6);
    }

    #[test]
    fn test_index_parse() {
        let mut store = StructuredRecordStore::new();
        let mut parser = FavoritesParser::new();
        let mut content = String::from("TargetModel\tBCD536HP\nFormatVersion\t1.00\n");
        content.push_str("F-List \tPolice\tf_000001.hpd\tOff\tOn\t1\tOff");
        for _ in 0..110 {
            content.push_str("\tOff");
        }
        content.push('\n');
        content.push_str("F-List \tFire\tf_000002.hpd\tOff\tOn\t2\tOff\n");

        let (lists, report) = parser.parse_index_source(&mut store, "f_list.cfg", &content);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0].user_name, "Police");
        assert_eq!(lists[0].scanner_model, "BCD536HP");
        assert_eq!(lists[0].startup_keys.len(), 10);
        assert_eq!(lists[0].s_qkeys.len(), 100);
        assert_eq!(lists[1].order, 1);
        // The short second row still gets default key arrays.
        assert_eq!(lists[1].s_qkeys[0], "Off");
        assert_eq!(report.created_counts.get("favorites_lists"), Some(&2));
    }
}
