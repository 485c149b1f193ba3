// Favorites entity model
//
// Unlike HPDB, favorites exports frequently carry empty MyId/ParentId
// columns, so there is no usable natural key below the list itself.
// Children are owned vectors in file order, and every child records its
// `order` because file position is the only ordering signal the format
// has. The raw id columns are kept verbatim for faithful re-export.

use serde::{Deserialize, Serialize};

/// One favorites list: an F-List row from f_list.cfg plus the contents of
/// its f_*.hpd file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoritesList {
    pub user_name: String,
    /// e.g. f_000001.hpd
    pub filename: String,
    pub scanner_model: String,
    pub format_version: String,
    pub location_control: String,
    pub monitor: String,
    pub quick_key: String,
    pub number_tag: String,
    /// StartupKey0-9, On/Off each.
    pub startup_keys: Vec<String>,
    /// S-Qkey_00 to S-Qkey_99, On/Off each.
    pub s_qkeys: Vec<String>,
    pub order: u32,
    pub conventional_systems: Vec<ConventionalSystem>,
    pub trunk_systems: Vec<TrunkSystem>,
}

impl Default for FavoritesList {
    fn default() -> Self {
        Self {
            user_name: String::new(),
            filename: String::new(),
            scanner_model: "BCDx36HP".to_string(),
            format_version: "1.00".to_string(),
            location_control: "Off".to_string(),
            monitor: "Off".to_string(),
            quick_key: "Off".to_string(),
            number_tag: "Off".to_string(),
            startup_keys: Vec::new(),
            s_qkeys: Vec::new(),
            order: 0,
            conventional_systems: Vec::new(),
            trunk_systems: Vec::new(),
        }
    }
}

impl FavoritesList {
    pub fn new(user_name: &str, filename: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            filename: filename.to_string(),
            ..Default::default()
        }
    }

    /// Drop all parsed systems. Called at the start of a (re-)parse so
    /// importing the same file twice cannot duplicate children.
    pub fn clear_systems(&mut self) {
        self.conventional_systems.clear();
        self.trunk_systems.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConventionalSystem {
    pub my_id: String,
    pub parent_id: String,
    pub name_tag: String,
    pub avoid: String,
    pub reserve: String,
    pub system_type: String,
    pub quick_key: String,
    pub number_tag: String,
    pub system_hold_time: u32,
    pub analog_agc: String,
    pub digital_agc: String,
    pub digital_waiting_time: u32,
    pub digital_threshold_mode: String,
    pub digital_threshold_level: u32,
    pub dqks_my_id: String,
    pub dqks_status: Vec<String>,
    pub order: u32,
    pub groups: Vec<ChannelGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub my_id: String,
    pub parent_id: String,
    pub name_tag: String,
    pub avoid: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub range_miles: Option<f64>,
    pub location_type: String,
    pub quick_key: String,
    pub filter: String,
    pub order: u32,
    pub channels: Vec<Channel>,
    pub rectangles: Vec<Rectangle>,
}

/// A conventional channel (C-Freq record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub my_id: String,
    pub parent_id: String,
    pub name_tag: String,
    pub avoid: String,
    /// Hz.
    pub frequency: u64,
    pub modulation: String,
    pub audio_option: String,
    /// Service type; 21 = Other.
    pub func_tag_id: u32,
    pub attenuator: String,
    pub delay: i32,
    pub volume_offset: i32,
    pub alert_tone: String,
    pub alert_volume: String,
    pub alert_color: String,
    pub alert_pattern: String,
    pub number_tag: String,
    pub priority_channel: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkSystem {
    pub my_id: String,
    pub parent_id: String,
    pub name_tag: String,
    pub avoid: String,
    pub reserve: String,
    pub system_type: String,
    pub id_search: String,
    pub alert_tone: String,
    pub alert_volume: String,
    pub status_bit: String,
    pub nac: String,
    pub quick_key: String,
    pub number_tag: String,
    pub site_hold_time: u32,
    pub analog_agc: String,
    pub digital_agc: String,
    pub end_code: String,
    pub priority_id_scan: String,
    pub alert_color: String,
    pub alert_pattern: String,
    pub tgid_format: String,
    pub dqks_my_id: String,
    pub dqks_status: Vec<String>,
    pub order: u32,
    pub sites: Vec<Site>,
    pub talk_groups: Vec<TalkGroup>,
    pub fleet_maps: Vec<FleetMapEntry>,
    pub unit_ids: Vec<UnitIdEntry>,
    pub avoid_tgids: Vec<AvoidTgidEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub my_id: String,
    pub parent_id: String,
    pub name_tag: String,
    pub avoid: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub range_miles: Option<f64>,
    pub modulation: String,
    pub mot_band_type: String,
    pub edacs_band_type: String,
    pub location_type: String,
    pub attenuator: String,
    pub digital_waiting_time: u32,
    pub digital_threshold_mode: String,
    pub digital_threshold_level: u32,
    pub quick_key: String,
    pub nac: String,
    pub filter: String,
    pub order: u32,
    pub frequencies: Vec<TrunkedFrequency>,
    pub rectangles: Vec<Rectangle>,
    pub band_plan_mot: Option<MotBandPlan>,
    pub band_plan_p25: Option<P25BandPlan>,
}

/// T-Freq record: the only real payload is frequency/LCN/color code, the
/// rest of the columns are reserved in the specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkedFrequency {
    pub reserve_my_id: String,
    pub parent_id: String,
    pub reserve: String,
    pub reserve_avoid: String,
    pub frequency: u64,
    pub lcn: u32,
    pub color_code: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkGroup {
    pub my_id: String,
    pub parent_id: String,
    pub name_tag: String,
    pub avoid: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub range_miles: Option<f64>,
    pub location_type: String,
    pub quick_key: String,
    pub order: u32,
    pub tgids: Vec<TalkGroupId>,
    pub rectangles: Vec<Rectangle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkGroupId {
    pub my_id: String,
    pub parent_id: String,
    pub name_tag: String,
    pub avoid: String,
    pub tgid: String,
    pub audio_type: String,
    pub func_tag_id: u32,
    pub delay: i32,
    pub volume_offset: i32,
    pub alert_tone: String,
    pub alert_volume: String,
    pub alert_color: String,
    pub alert_pattern: String,
    pub number_tag: String,
    pub priority_channel: String,
    pub tdma_slot: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub my_id: String,
    pub latitude_1: Option<f64>,
    pub longitude_1: Option<f64>,
    pub latitude_2: Option<f64>,
    pub longitude_2: Option<f64>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMapEntry {
    pub my_id: String,
    pub blocks: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitIdEntry {
    pub reserve1: String,
    pub reserve2: String,
    pub name_tag: String,
    pub unit_id: u64,
    pub alert_tone: String,
    pub alert_volume: String,
    pub alert_color: String,
    pub alert_pattern: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidTgidEntry {
    pub my_id: String,
    pub tgids: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotBand {
    pub lower: u64,
    pub upper: u64,
    pub spacing: u32,
    pub offset: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotBandPlan {
    pub my_id: String,
    pub bands: Vec<MotBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P25Band {
    pub base: u64,
    pub spacing: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P25BandPlan {
    pub my_id: String,
    pub bands: Vec<P25Band>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let list = FavoritesList::default();
        assert_eq!(list.scanner_model, "BCDx36HP");
        assert_eq!(list.format_version, "1.00");
        assert!(list.conventional_systems.is_empty());
    }

    #[test]
    fn test_clear_systems() {
        let mut list = FavoritesList::new("Test", "f_000001.hpd");
        list.trunk_systems.push(TrunkSystem {
            my_id: String::new(),
            parent_id: String::new(),
            name_tag: "DTRS".to_string(),
            avoid: "Off".to_string(),
            reserve: String::new(),
            system_type: "P25Standard".to_string(),
            id_search: "Off".to_string(),
            alert_tone: "Off".to_string(),
            alert_volume: "Auto".to_string(),
            status_bit: "Ignore".to_string(),
            nac: "Srch".to_string(),
            quick_key: "Off".to_string(),
            number_tag: "Off".to_string(),
            site_hold_time: 0,
            analog_agc: "Off".to_string(),
            digital_agc: "Off".to_string(),
            end_code: "Analog".to_string(),
            priority_id_scan: "Off".to_string(),
            alert_color: "Off".to_string(),
            alert_pattern: "On".to_string(),
            tgid_format: String::new(),
            dqks_my_id: String::new(),
            dqks_status: Vec::new(),
            order: 0,
            sites: Vec::new(),
            talk_groups: Vec::new(),
            fleet_maps: Vec::new(),
            unit_ids: Vec::new(),
            avoid_tgids: Vec::new(),
        });
        list.clear_systems();
        assert!(list.trunk_systems.is_empty());
    }
}
