// Favorites serializer
//
// Regenerates f_*.hpd and f_list.cfg text from a FavoritesList. The walk
// is depth-first in recorded order: system line, its quick-key status
// record, then each child block. Column positions follow the input file
// specification exactly; every optional value renders as an empty column.

use super::{fmt_coord, fmt_range, push_line};
use crate::favorites::model::{
    ChannelGroup, ConventionalSystem, FavoritesList, Site, TalkGroup, TrunkSystem,
};

/// Render one favorites list back to f_*.hpd text.
pub fn write_favorites_file(list: &FavoritesList) -> String {
    let mut out = String::new();
    push_line(&mut out, "TargetModel", &[list.scanner_model.as_str()]);
    push_line(&mut out, "FormatVersion", &[list.format_version.as_str()]);

    for system in &list.conventional_systems {
        write_conventional(&mut out, system);
    }
    for system in &list.trunk_systems {
        write_trunk(&mut out, system);
    }
    out
}

/// Render the f_list.cfg index for a set of lists, in list order.
pub fn write_favorites_index(lists: &[FavoritesList]) -> String {
    let mut out = String::new();
    let model = lists
        .first()
        .map(|l| l.scanner_model.clone())
        .unwrap_or_else(|| "BCDx36HP".to_string());
    let version = lists
        .first()
        .map(|l| l.format_version.clone())
        .unwrap_or_else(|| "1.00".to_string());
    push_line(&mut out, "TargetModel", &[model.as_str()]);
    push_line(&mut out, "FormatVersion", &[version.as_str()]);

    for list in lists {
        let mut fields = vec![
            list.user_name.clone(),
            list.filename.clone(),
            list.location_control.clone(),
            list.monitor.clone(),
            list.quick_key.clone(),
            list.number_tag.clone(),
        ];
        for i in 0..10 {
            fields.push(list.startup_keys.get(i).cloned().unwrap_or_else(|| "Off".to_string()));
        }
        for i in 0..100 {
            fields.push(list.s_qkeys.get(i).cloned().unwrap_or_else(|| "Off".to_string()));
        }
        push_line(&mut out, "F-List", &fields);
    }
    out
}

fn write_conventional(out: &mut String, system: &ConventionalSystem) {
    push_line(
        out,
        "Conventional",
        &[
            system.my_id.clone(),
            system.parent_id.clone(),
            system.name_tag.clone(),
            system.avoid.clone(),
            system.reserve.clone(),
            system.system_type.clone(),
            system.quick_key.clone(),
            system.number_tag.clone(),
            system.system_hold_time.to_string(),
            system.analog_agc.clone(),
            system.digital_agc.clone(),
            system.digital_waiting_time.to_string(),
            system.digital_threshold_mode.clone(),
            system.digital_threshold_level.to_string(),
        ],
    );
    write_dqks(out, &system.dqks_my_id, &system.dqks_status);
    for group in &system.groups {
        write_channel_group(out, group);
    }
}

fn write_channel_group(out: &mut String, group: &ChannelGroup) {
    push_line(
        out,
        "C-Group",
        &[
            group.my_id.clone(),
            group.parent_id.clone(),
            group.name_tag.clone(),
            group.avoid.clone(),
            fmt_coord(group.latitude),
            fmt_coord(group.longitude),
            fmt_range(group.range_miles),
            group.location_type.clone(),
            group.quick_key.clone(),
            group.filter.clone(),
        ],
    );
    write_rectangles(out, &group.rectangles);
    for channel in &group.channels {
        push_line(
            out,
            "C-Freq",
            &[
                channel.my_id.clone(),
                channel.parent_id.clone(),
                channel.name_tag.clone(),
                channel.avoid.clone(),
                channel.frequency.to_string(),
                channel.modulation.clone(),
                channel.audio_option.clone(),
                channel.func_tag_id.to_string(),
                channel.attenuator.clone(),
                channel.delay.to_string(),
                channel.volume_offset.to_string(),
                channel.alert_tone.clone(),
                channel.alert_volume.clone(),
                channel.alert_color.clone(),
                channel.alert_pattern.clone(),
                channel.number_tag.clone(),
                channel.priority_channel.clone(),
            ],
        );
    }
}

fn write_trunk(out: &mut String, system: &TrunkSystem) {
    push_line(
        out,
        "Trunk",
        &[
            system.my_id.clone(),
            system.parent_id.clone(),
            system.name_tag.clone(),
            system.avoid.clone(),
            system.reserve.clone(),
            system.system_type.clone(),
            system.id_search.clone(),
            system.alert_tone.clone(),
            system.alert_volume.clone(),
            system.status_bit.clone(),
            system.nac.clone(),
            system.quick_key.clone(),
            system.number_tag.clone(),
            system.site_hold_time.to_string(),
            system.analog_agc.clone(),
            system.digital_agc.clone(),
            system.end_code.clone(),
            system.priority_id_scan.clone(),
            system.alert_color.clone(),
            system.alert_pattern.clone(),
            system.tgid_format.clone(),
        ],
    );
    write_dqks(out, &system.dqks_my_id, &system.dqks_status);

    for entry in &system.fleet_maps {
        let mut fields = vec![entry.my_id.clone()];
        fields.extend(entry.blocks.iter().cloned());
        push_line(out, "FleetMap", &fields);
    }
    for entry in &system.unit_ids {
        push_line(
            out,
            "UnitIds",
            &[
                entry.reserve1.clone(),
                entry.reserve2.clone(),
                entry.name_tag.clone(),
                entry.unit_id.to_string(),
                entry.alert_tone.clone(),
                entry.alert_volume.clone(),
                entry.alert_color.clone(),
                entry.alert_pattern.clone(),
            ],
        );
    }
    for entry in &system.avoid_tgids {
        let mut fields = vec![entry.my_id.clone()];
        fields.extend(entry.tgids.iter().cloned());
        push_line(out, "AvoidTgids", &fields);
    }

    for site in &system.sites {
        write_site(out, site);
    }
    for tgroup in &system.talk_groups {
        write_talk_group(out, tgroup);
    }
}

fn write_site(out: &mut String, site: &Site) {
    push_line(
        out,
        "Site",
        &[
            site.my_id.clone(),
            site.parent_id.clone(),
            site.name_tag.clone(),
            site.avoid.clone(),
            fmt_coord(site.latitude),
            fmt_coord(site.longitude),
            fmt_range(site.range_miles),
            site.modulation.clone(),
            site.mot_band_type.clone(),
            site.edacs_band_type.clone(),
            site.location_type.clone(),
            site.attenuator.clone(),
            site.digital_waiting_time.to_string(),
            site.digital_threshold_mode.clone(),
            site.digital_threshold_level.to_string(),
            site.quick_key.clone(),
            site.nac.clone(),
            site.filter.clone(),
        ],
    );
    if let Some(plan) = &site.band_plan_mot {
        let mut fields = vec![plan.my_id.clone()];
        for band in &plan.bands {
            fields.push(band.lower.to_string());
            fields.push(band.upper.to_string());
            fields.push(band.spacing.to_string());
            fields.push(band.offset.to_string());
        }
        push_line(out, "BandPlan_Mot", &fields);
    }
    if let Some(plan) = &site.band_plan_p25 {
        let mut fields = vec![plan.my_id.clone()];
        for band in &plan.bands {
            fields.push(band.base.to_string());
            fields.push(band.spacing.to_string());
        }
        push_line(out, "BandPlan_P25", &fields);
    }
    write_rectangles(out, &site.rectangles);
    for freq in &site.frequencies {
        push_line(
            out,
            "T-Freq",
            &[
                freq.reserve_my_id.clone(),
                freq.parent_id.clone(),
                freq.reserve.clone(),
                freq.reserve_avoid.clone(),
                freq.frequency.to_string(),
                freq.lcn.to_string(),
                freq.color_code.clone(),
            ],
        );
    }
}

fn write_talk_group(out: &mut String, tgroup: &TalkGroup) {
    push_line(
        out,
        "T-Group",
        &[
            tgroup.my_id.clone(),
            tgroup.parent_id.clone(),
            tgroup.name_tag.clone(),
            tgroup.avoid.clone(),
            fmt_coord(tgroup.latitude),
            fmt_coord(tgroup.longitude),
            fmt_range(tgroup.range_miles),
            tgroup.location_type.clone(),
            tgroup.quick_key.clone(),
        ],
    );
    write_rectangles(out, &tgroup.rectangles);
    for tgid in &tgroup.tgids {
        push_line(
            out,
            "TGID",
            &[
                tgid.my_id.clone(),
                tgid.parent_id.clone(),
                tgid.name_tag.clone(),
                tgid.avoid.clone(),
                tgid.tgid.clone(),
                tgid.audio_type.clone(),
                tgid.func_tag_id.to_string(),
                tgid.delay.to_string(),
                tgid.volume_offset.to_string(),
                tgid.alert_tone.clone(),
                tgid.alert_volume.clone(),
                tgid.alert_color.clone(),
                tgid.alert_pattern.clone(),
                tgid.number_tag.clone(),
                tgid.priority_channel.clone(),
                tgid.tdma_slot.clone(),
            ],
        );
    }
}

fn write_dqks(out: &mut String, my_id: &str, flags: &[String]) {
    if flags.is_empty() {
        return;
    }
    let mut fields = vec![my_id.to_string()];
    fields.extend(flags.iter().cloned());
    push_line(out, "DQKs_Status", &fields);
}

fn write_rectangles(out: &mut String, rectangles: &[crate::favorites::model::Rectangle]) {
    for rect in rectangles {
        push_line(
            out,
            "Rectangle",
            &[
                rect.my_id.clone(),
                fmt_coord(rect.latitude_1),
                fmt_coord(rect.longitude_1),
                fmt_coord(rect.latitude_2),
                fmt_coord(rect.longitude_2),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::builder::FavoritesParser;
    use crate::record::store::StructuredRecordStore;

    #[test]
    fn test_export_renders_positions() {
        let content = "\
Conventional\t\t\tLocal Fire\tOff\t\tConventional\tOff\tOff\t0\tOff\tOff\t400\tManual\t8
C-Group\t\t\tStation 1\tOff\t39.500000\t-104.800000\t10.0\tCircle\tOff\t
C-Freq\t\t\tDispatch\tOff\t154250000\tFM\tTONE=100\t11\tOff\t2\t0\tOff\tAuto\tOff\tOn\tOff\tOff
";
        let mut list = FavoritesList::new("Test", "f_000001.hpd");
        let mut store = StructuredRecordStore::new();
        let mut parser = FavoritesParser::new();
        parser.parse_file_source(&mut list, &mut store, "f_000001.hpd", content);

        let text = write_favorites_file(&list);
        assert!(text.starts_with("TargetModel\tBCDx36HP\nFormatVersion\t1.00\n"));
        assert!(text.contains("C-Group\t\t\tStation 1\tOff\t39.500000\t-104.800000\t10.0\tCircle\tOff\t\n"));
        assert!(text.contains("C-Freq\t\t\tDispatch\tOff\t154250000\tFM\tTONE=100\t11\tOff\t2\t0\tOff\tAuto\tOff\tOn\tOff\tOff\n"));
    }

    #[test]
    fn test_index_row_width() {
        let mut list = FavoritesList::new("Police", "f_000001.hpd");
        list.startup_keys = vec!["Off".to_string(); 10];
        list.s_qkeys = vec!["Off".to_string(); 100];
        let text = write_favorites_index(&[list]);
        let flist_line = text.lines().find(|l| l.starts_with("F-List")).unwrap();
        // Tag + 116 fields.
        assert_eq!(flist_line.split('\t').count(), 117);
    }
}
