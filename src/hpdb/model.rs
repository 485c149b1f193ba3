// HPDB entity model
//
// Entities live in an arena keyed by their natural ids (the AgencyId /
// CGroupId / CFreqId tokens from the files), so upserts are idempotent and
// no back-pointers or cyclic references are needed. Parents keep ordered
// child-id vectors because file order is the only position signal.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Reserved scope id meaning "applies to the whole parent scope".
pub const SENTINEL_SCOPE_ID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemType {
    Conventional,
    Trunk,
}

impl SystemType {
    pub fn tag(&self) -> &'static str {
        match self {
            SystemType::Conventional => "Conventional",
            SystemType::Trunk => "Trunk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub country_id: u32,
    pub name_tag: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub state_id: u32,
    pub country_id: u32,
    pub name_tag: String,
    pub short_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct County {
    pub county_id: u32,
    pub state_id: u32,
    pub name_tag: String,
}

/// Geographic rectangle bounds attached to a channel group, site, or talk
/// group (north-west / south-east corners).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub latitude_1: f64,
    pub longitude_1: f64,
    pub latitude_2: f64,
    pub longitude_2: f64,
    pub order: u32,
}

/// Fleet map block sizes for a Motorola Type I/II trunk system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMapEntry {
    pub my_id: String,
    pub blocks: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitIdEntry {
    pub name_tag: String,
    pub unit_id: u64,
    pub alert_tone: String,
    pub alert_volume: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvoidTgidEntry {
    pub my_id: String,
    pub tgids: Vec<String>,
    pub order: u32,
}

/// Motorola custom band plan: up to 6 Lower/Upper/Spacing/Offset bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotBand {
    pub lower: u64,
    pub upper: u64,
    pub spacing: u32,
    pub offset: i32,
}

/// P25 explicit band plan: up to 16 Base/Spacing bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct P25Band {
    pub base: u64,
    pub spacing: u32,
}

/// A Conventional or Trunk system. Agencies are many-to-many with states
/// and counties: one system can span multiple geographic scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub agency_id: u32,
    pub name_tag: String,
    pub system_type: SystemType,
    pub enabled: bool,
    /// State id from the defining line, used as the export anchor.
    pub primary_state_id: u32,
    pub state_ids: BTreeSet<u32>,
    pub county_ids: BTreeSet<u32>,
    pub group_ids: Vec<u64>,
    pub site_ids: Vec<u64>,
    pub talk_group_ids: Vec<u64>,
    pub dqks_my_id: String,
    pub dqks_status: Vec<String>,
    pub fleet_maps: Vec<FleetMapEntry>,
    pub unit_ids: Vec<UnitIdEntry>,
    pub avoid_tgids: Vec<AvoidTgidEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelGroup {
    pub cgroup_id: u64,
    pub agency_id: u32,
    pub name_tag: String,
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub range_miles: Option<f64>,
    pub location_type: String,
    pub frequency_ids: Vec<u64>,
    pub rectangles: Vec<Rectangle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frequency {
    pub cfreq_id: u64,
    pub cgroup_id: u64,
    pub description: String,
    pub enabled: bool,
    /// Hz; 460.025 MHz is stored as 460025000.
    pub frequency: u64,
    pub modulation: String,
    /// TONE=xxx or NAC=xxx when present.
    pub audio_option: String,
    pub delay: i32,
}

/// One voice frequency of a trunked site. T-Freq records carry no usable
/// natural key, so these are owned by their site in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrunkFrequency {
    pub frequency: u64,
    pub lcn: u32,
    pub color_code: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub site_id: u64,
    pub agency_id: u32,
    pub name_tag: String,
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub range_miles: Option<f64>,
    pub modulation: String,
    pub location_type: String,
    pub frequencies: Vec<TrunkFrequency>,
    pub rectangles: Vec<Rectangle>,
    pub band_plan_mot: Option<Vec<MotBand>>,
    pub band_plan_p25: Option<Vec<P25Band>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkGroup {
    pub tgroup_id: u64,
    pub agency_id: u32,
    pub name_tag: String,
    pub enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub range_miles: Option<f64>,
    pub location_type: String,
    pub tgid_ids: Vec<u64>,
    pub rectangles: Vec<Rectangle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalkGroupId {
    pub tid: u64,
    pub tgroup_id: u64,
    pub name_tag: String,
    pub enabled: bool,
    pub tgid: String,
    pub audio_type: String,
    pub delay: i32,
}

/// The caller-owned entity arena. Builders take `&mut` and upsert by
/// natural key; "clear all parsed data" is the caller replacing the arena.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HpdbDatabase {
    pub countries: BTreeMap<u32, Country>,
    pub states: BTreeMap<u32, State>,
    pub counties: BTreeMap<u32, County>,
    pub agencies: BTreeMap<u32, Agency>,
    pub channel_groups: BTreeMap<u64, ChannelGroup>,
    pub frequencies: BTreeMap<u64, Frequency>,
    pub sites: BTreeMap<u64, Site>,
    pub talk_groups: BTreeMap<u64, TalkGroup>,
    pub talk_group_ids: BTreeMap<u64, TalkGroupId>,
    /// Agencies in first-seen file order, for export.
    pub agency_order: Vec<u32>,
}

impl HpdbDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure the synthetic Nationwide country/state pair exists
    /// (CountryId=0, StateId=0). Downstream tree views show these as real
    /// nodes, so the sentinel must be an entity, not an absence.
    pub fn ensure_nationwide(&mut self) {
        self.countries.entry(SENTINEL_SCOPE_ID).or_insert_with(|| Country {
            country_id: SENTINEL_SCOPE_ID,
            name_tag: "Nationwide".to_string(),
            code: String::new(),
        });
        self.states.entry(SENTINEL_SCOPE_ID).or_insert_with(|| State {
            state_id: SENTINEL_SCOPE_ID,
            country_id: SENTINEL_SCOPE_ID,
            name_tag: "Nationwide".to_string(),
            short_name: String::new(),
        });
    }

    /// Ensure the synthetic Statewide county for `state_id` exists. The
    /// county arena is keyed by county_id, which is globally unique in
    /// HPDB exports, so the statewide node borrows the sentinel id only
    /// when no real county claims it.
    pub fn ensure_statewide(&mut self, state_id: u32) -> u32 {
        self.counties.entry(SENTINEL_SCOPE_ID).or_insert_with(|| County {
            county_id: SENTINEL_SCOPE_ID,
            state_id,
            name_tag: "Statewide".to_string(),
        });
        SENTINEL_SCOPE_ID
    }

    /// Entity counts by kind, for summaries.
    pub fn entity_counts(&self) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        counts.insert("countries".to_string(), self.countries.len() as u64);
        counts.insert("states".to_string(), self.states.len() as u64);
        counts.insert("counties".to_string(), self.counties.len() as u64);
        counts.insert("agencies".to_string(), self.agencies.len() as u64);
        counts.insert("channel_groups".to_string(), self.channel_groups.len() as u64);
        counts.insert("frequencies".to_string(), self.frequencies.len() as u64);
        counts.insert("sites".to_string(), self.sites.len() as u64);
        counts.insert("talk_groups".to_string(), self.talk_groups.len() as u64);
        counts.insert("talk_group_ids".to_string(), self.talk_group_ids.len() as u64);
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_nationwide_is_idempotent() {
        let mut db = HpdbDatabase::new();
        db.ensure_nationwide();
        db.ensure_nationwide();
        assert_eq!(db.countries.len(), 1);
        assert_eq!(db.states.len(), 1);
        assert_eq!(db.states[&0].name_tag, "Nationwide");
    }

    #[test]
    fn test_entity_counts() {
        let mut db = HpdbDatabase::new();
        db.ensure_nationwide();
        let counts = db.entity_counts();
        assert_eq!(counts.get("states"), Some(&1));
        assert_eq!(counts.get("agencies"), Some(&0));
    }
}
