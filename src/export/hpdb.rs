// HPDB serializer
//
// Regenerates hpdb.cfg and per-agency system-file text from the entity
// arena. Identifier columns render back in their key=value form
// (AgencyId=12, CGroupId=5, ...), matching the native database exports.
// Columns the arena does not model render as empty fields so positions
// stay aligned for a re-import.

use super::{fmt_coord, fmt_range, on_off, push_line};
use crate::hpdb::model::{Agency, ChannelGroup, HpdbDatabase, Site, TalkGroup};

/// Render the state/county catalog (hpdb.cfg): each state followed by its
/// counties.
pub fn write_config(db: &HpdbDatabase) -> String {
    let mut out = String::new();
    for state in db.states.values() {
        push_line(
            &mut out,
            "StateInfo",
            &[
                format!("StateId={}", state.state_id),
                format!("CountryId={}", state.country_id),
                state.name_tag.clone(),
                state.short_name.clone(),
            ],
        );
        for county in db.counties.values().filter(|c| c.state_id == state.state_id) {
            push_line(
                &mut out,
                "CountyInfo",
                &[
                    format!("CountyId={}", county.county_id),
                    format!("StateId={}", county.state_id),
                    county.name_tag.clone(),
                ],
            );
        }
    }
    out
}

/// Render one agency's system file (s_*.hpd) content, or None when the
/// agency id is unknown.
pub fn write_system_file(db: &HpdbDatabase, agency_id: u32) -> Option<String> {
    let agency = db.agencies.get(&agency_id)?;
    let mut out = String::new();
    write_agency(&mut out, db, agency);
    Some(out)
}

/// Render every agency in first-seen order, one file body per agency.
pub fn write_all_system_files(db: &HpdbDatabase) -> Vec<(u32, String)> {
    db.agency_order
        .iter()
        .filter_map(|id| write_system_file(db, *id).map(|text| (*id, text)))
        .collect()
}

fn write_agency(out: &mut String, db: &HpdbDatabase, agency: &Agency) {
    push_line(
        out,
        agency.system_type.tag(),
        &[
            format!("AgencyId={}", agency.agency_id),
            format!("StateId={}", agency.primary_state_id),
            agency.name_tag.clone(),
            on_off(agency.enabled).to_string(),
            // SystemType detail column, unmodeled; stays empty.
            String::new(),
        ],
    );
    if !agency.dqks_status.is_empty() {
        let mut fields = vec![agency.dqks_my_id.clone()];
        fields.extend(agency.dqks_status.iter().cloned());
        push_line(out, "DQKs_Status", &fields);
    }
    for state_id in &agency.state_ids {
        push_line(
            out,
            "AreaState",
            &[format!("AgencyId={}", agency.agency_id), format!("StateId={}", state_id)],
        );
    }
    for county_id in &agency.county_ids {
        push_line(
            out,
            "AreaCounty",
            &[format!("AgencyId={}", agency.agency_id), format!("CountyId={}", county_id)],
        );
    }
    for entry in &agency.fleet_maps {
        let mut fields = vec![entry.my_id.clone()];
        fields.extend(entry.blocks.iter().cloned());
        push_line(out, "FleetMap", &fields);
    }
    for entry in &agency.unit_ids {
        push_line(
            out,
            "UnitIds",
            &[
                String::new(),
                String::new(),
                entry.name_tag.clone(),
                entry.unit_id.to_string(),
                entry.alert_tone.clone(),
                entry.alert_volume.clone(),
            ],
        );
    }
    for entry in &agency.avoid_tgids {
        let mut fields = vec![entry.my_id.clone()];
        fields.extend(entry.tgids.iter().cloned());
        push_line(out, "AvoidTgids", &fields);
    }

    for group_id in &agency.group_ids {
        if let Some(group) = db.channel_groups.get(group_id) {
            write_channel_group(out, db, group);
        }
    }
    for site_id in &agency.site_ids {
        if let Some(site) = db.sites.get(site_id) {
            write_site(out, site);
        }
    }
    for tgroup_id in &agency.talk_group_ids {
        if let Some(tgroup) = db.talk_groups.get(tgroup_id) {
            write_talk_group(out, db, tgroup);
        }
    }
}

fn write_channel_group(out: &mut String, db: &HpdbDatabase, group: &ChannelGroup) {
    let my_id = format!("CGroupId={}", group.cgroup_id);
    push_line(
        out,
        "C-Group",
        &[
            my_id.clone(),
            format!("AgencyId={}", group.agency_id),
            group.name_tag.clone(),
            on_off(group.enabled).to_string(),
            fmt_coord(group.latitude),
            fmt_coord(group.longitude),
            fmt_range(group.range_miles),
            group.location_type.clone(),
        ],
    );
    for rect in &group.rectangles {
        push_line(
            out,
            "Rectangle",
            &[
                my_id.clone(),
                format!("{:.6}", rect.latitude_1),
                format!("{:.6}", rect.longitude_1),
                format!("{:.6}", rect.latitude_2),
                format!("{:.6}", rect.longitude_2),
            ],
        );
    }
    for freq_id in &group.frequency_ids {
        if let Some(freq) = db.frequencies.get(freq_id) {
            push_line(
                out,
                "C-Freq",
                &[
                    format!("CFreqId={}", freq.cfreq_id),
                    my_id.clone(),
                    freq.description.clone(),
                    on_off(freq.enabled).to_string(),
                    freq.frequency.to_string(),
                    freq.modulation.clone(),
                    freq.audio_option.clone(),
                    freq.delay.to_string(),
                ],
            );
        }
    }
}

fn write_site(out: &mut String, site: &Site) {
    let my_id = format!("SiteId={}", site.site_id);
    push_line(
        out,
        "Site",
        &[
            my_id.clone(),
            format!("AgencyId={}", site.agency_id),
            site.name_tag.clone(),
            on_off(site.enabled).to_string(),
            fmt_coord(site.latitude),
            fmt_coord(site.longitude),
            fmt_range(site.range_miles),
            site.modulation.clone(),
            // MotBandType / EdacsBandType, unmodeled in HPDB.
            String::new(),
            String::new(),
            site.location_type.clone(),
        ],
    );
    if let Some(bands) = &site.band_plan_mot {
        let mut fields = vec![my_id.clone()];
        for band in bands {
            fields.push(band.lower.to_string());
            fields.push(band.upper.to_string());
            fields.push(band.spacing.to_string());
            fields.push(band.offset.to_string());
        }
        push_line(out, "BandPlan_Mot", &fields);
    }
    if let Some(bands) = &site.band_plan_p25 {
        let mut fields = vec![my_id.clone()];
        for band in bands {
            fields.push(band.base.to_string());
            fields.push(band.spacing.to_string());
        }
        push_line(out, "BandPlan_P25", &fields);
    }
    for rect in &site.rectangles {
        push_line(
            out,
            "Rectangle",
            &[
                my_id.clone(),
                format!("{:.6}", rect.latitude_1),
                format!("{:.6}", rect.longitude_1),
                format!("{:.6}", rect.latitude_2),
                format!("{:.6}", rect.longitude_2),
            ],
        );
    }
    for freq in &site.frequencies {
        push_line(
            out,
            "T-Freq",
            &[
                String::new(),
                my_id.clone(),
                String::new(),
                String::new(),
                freq.frequency.to_string(),
                freq.lcn.to_string(),
                freq.color_code.clone(),
            ],
        );
    }
}

fn write_talk_group(out: &mut String, db: &HpdbDatabase, tgroup: &TalkGroup) {
    let my_id = format!("TGroupId={}", tgroup.tgroup_id);
    push_line(
        out,
        "T-Group",
        &[
            my_id.clone(),
            format!("AgencyId={}", tgroup.agency_id),
            tgroup.name_tag.clone(),
            on_off(tgroup.enabled).to_string(),
            fmt_coord(tgroup.latitude),
            fmt_coord(tgroup.longitude),
            fmt_range(tgroup.range_miles),
            tgroup.location_type.clone(),
        ],
    );
    for rect in &tgroup.rectangles {
        push_line(
            out,
            "Rectangle",
            &[
                my_id.clone(),
                format!("{:.6}", rect.latitude_1),
                format!("{:.6}", rect.longitude_1),
                format!("{:.6}", rect.latitude_2),
                format!("{:.6}", rect.longitude_2),
            ],
        );
    }
    for tid in &tgroup.tgid_ids {
        if let Some(entry) = db.talk_group_ids.get(tid) {
            push_line(
                out,
                "TGID",
                &[
                    format!("Tid={}", entry.tid),
                    my_id.clone(),
                    entry.name_tag.clone(),
                    on_off(entry.enabled).to_string(),
                    entry.tgid.clone(),
                    entry.audio_type.clone(),
                    // FuncTagId, unmodeled in HPDB.
                    String::new(),
                    entry.delay.to_string(),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpdb::builder::HpdbParser;
    use crate::record::store::StructuredRecordStore;

    fn parse(content: &str) -> HpdbDatabase {
        let mut db = HpdbDatabase::new();
        let mut store = StructuredRecordStore::new();
        let mut parser = HpdbParser::new();
        parser.parse_system_source(&mut db, &mut store, "s_000001.hpd", content);
        db
    }

    #[test]
    fn test_system_file_layout() {
        let db = parse(
            "\
StateInfo\tStateId=6\tCountryId=1\tColorado\tCO
Conventional\tAgencyId=12\tStateId=6\tPolice Dept\tOn\t
C-Group\tCGroupId=5\tAgencyId=12\tDispatch\tOn\t39.5\t-104.8\t10\tCircle
C-Freq\tCFreqId=9\tCGroupId=5\tMain\tOn\t460025000\tFM\tTONE=100\t2
",
        );
        let text = write_system_file(&db, 12).unwrap();
        assert!(text.starts_with("Conventional\tAgencyId=12\tStateId=6\tPolice Dept\tOn\t\n"));
        assert!(text.contains("AreaState\tAgencyId=12\tStateId=6\n"));
        assert!(text.contains(
            "C-Group\tCGroupId=5\tAgencyId=12\tDispatch\tOn\t39.500000\t-104.800000\t10.0\tCircle\n"
        ));
        assert!(text.contains("C-Freq\tCFreqId=9\tCGroupId=5\tMain\tOn\t460025000\tFM\tTONE=100\t2\n"));
    }

    #[test]
    fn test_config_groups_counties_under_state() {
        let db = parse(
            "\
StateInfo\tStateId=6\tCountryId=1\tColorado\tCO
CountyInfo\tCountyId=31\tStateId=6\tDenver
CountyInfo\tCountyId=35\tStateId=6\tDouglas
",
        );
        let text = write_config(&db);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "StateInfo\tStateId=6\tCountryId=1\tColorado\tCO");
        assert_eq!(lines[1], "CountyInfo\tCountyId=31\tStateId=6\tDenver");
        assert_eq!(lines[2], "CountyInfo\tCountyId=35\tStateId=6\tDouglas");
    }

    #[test]
    fn test_unknown_agency_is_none() {
        let db = HpdbDatabase::new();
        assert!(write_system_file(&db, 42).is_none());
    }
}
