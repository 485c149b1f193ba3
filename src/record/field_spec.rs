// Field-name resolver
//
// Maps (record type, field count) to the ordered list of canonical field
// names from the HomePatrol input file specification. Reserved columns are
// named Reserve, Reserve1..N. Resolution never fails: unknown record types
// get an empty name list and their values stay addressable by position.
//
// Three strategies:
//   fixed     - one known name list per type (most types)
//   derived   - names generated from the observed field count (quick-key
//               arrays, band plans, talk-group blocks)
//   hybrid    - fixed prefix + derived suffix, or value-dependent variants
//               (the 3-field Avoid record changes meaning when field 3 is a
//               site reference)

fn seq(prefix: &str, start: usize, end_inclusive: usize) -> Vec<String> {
    (start..=end_inclusive)
        .map(|i| format!("{}{:02}", prefix, i))
        .collect()
}

fn reserve(count: usize) -> Vec<String> {
    match count {
        0 => Vec::new(),
        1 => vec!["Reserve".to_string()],
        n => (1..=n).map(|i| format!("Reserve{}", i)).collect(),
    }
}

fn fixed_names(record_type: &str) -> Option<&'static [&'static str]> {
    let names: &'static [&'static str] = match record_type {
        // File metadata
        "TargetModel" => &["ModelName"],
        "FormatVersion" => &["Version"],
        "DateModified" => &["TimeStamp"],

        // hpdb.cfg
        "StateInfo" => &["StateId", "CountryId", "NameTag", "ShortName"],
        "CountyInfo" => &["CountyId", "StateId", "NameTag"],
        "LM" => &[
            "StateId", "CountyId", "TrunkId", "SiteId", "LM_SystemID", "LM_SiteID",
            "Latitude", "Longitude",
        ],
        "LM_FREQUENCY" => &["Frequency", "Reserve", "LmTypeArray"],

        // System records (HPDB + Favorites)
        "Conventional" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "Reserve", "SystemType", "QuickKey",
            "NumberTag", "SystemHoldTime", "AnalogAGC", "DigitalAGC", "DigitalWaitingTime",
            "DigitalThresholdMode", "DigitalThresholdLevel",
        ],
        "Trunk" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "Reserve", "SystemType", "IDSearch",
            "AlertTone", "AlertVolume", "StatusBit", "NAC", "QuickKey", "NumberTag",
            "SiteHoldTime", "AnalogAGC", "DigitalAGC", "EndCode", "PriorityIDScan",
            "AlertColor", "AlertPattern", "TGIDFormat",
        ],
        "AreaState" => &["MyId", "StateId"],
        "AreaCounty" => &["MyId", "CountyId"],
        "FleetMap" => &["MyId", "B0", "B1", "B2", "B3", "B4", "B5", "B6", "B7"],
        "UnitIds" => &[
            "Reserve1", "Reserve2", "NameTag", "UnitId", "AlertTone", "AlertVolume",
            "AlertColor", "AlertPattern",
        ],
        "Site" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "Latitude", "Longitude", "Range",
            "Modulation", "MotBandType", "EdacsBandType", "LocationType", "Attenuator",
            "DigitalWaitingTime", "DigitalThresholdMode", "DigitalThresholdLevel",
            "QuickKey", "NAC", "Filter",
        ],
        "Rectangle" => &["MyId", "Latitude1", "Longitude1", "Latitude2", "Longitude2"],
        "Circle" => &["MyId", "Latitude", "Longitude", "Range"],
        "C-Group" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "Latitude", "Longitude", "Range",
            "LocationType", "QuickKey", "Filter",
        ],
        "T-Group" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "Latitude", "Longitude", "Range",
            "LocationType", "QuickKey",
        ],
        "C-Freq" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "Frequency", "Modulation",
            "AudioOption", "FuncTagId", "Attenuator", "Delay", "VolumeOffset",
            "AlertTone", "AlertVolume", "AlertColor", "AlertPattern", "NumberTag",
            "PriorityChannel",
        ],
        "TGID" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "TGID", "AudioType", "FuncTagId",
            "Delay", "VolumeOffset", "AlertTone", "AlertVolume", "AlertColor",
            "AlertPattern", "NumberTag", "PriorityChannel", "TDMASlot",
        ],
        "T-Freq" => &[
            "Reserve(MyId)", "ParentId", "Reserve", "Reserve(Avoid)", "Frequency", "LCN",
            "ColorCode/RAN/Area",
        ],

        // Scan configuration (app_data.cfg)
        "ScanListType" => &["Type", "Name"],
        "ScanConvSystem" => &[
            "SystemHold", "MyId", "ParentId", "NameTag", "Avoid", "Reserve", "SystemType",
            "QuickKey", "NumberTag", "SystemHoldTime", "AnalogAGC", "DigitalAGC",
            "DigitalWaitingTime", "DigitalThresholdMode", "DigitalThresholdLevel",
        ],
        "ScanTrunkSystem" => &[
            "SystemHold", "MyId", "ParentId", "NameTag", "Avoid", "Reserve", "SystemType",
            "IDSearch", "AlertTone", "AlertVolume", "StatusBit", "NAC", "QuickKey",
            "NumberTag", "SiteHoldTime", "AnalogAGC", "DigitalAGC", "EndCode",
            "PriorityIDScan", "AlertColor", "AlertPattern", "TGIDFormat",
        ],
        "ScanC-Group" => &[
            "GroupHold", "MyId", "ParentId", "NameTag", "Avoid", "Latitude", "Longitude",
            "Range", "LocationType", "Filter",
        ],
        "ScanT-Group" => &[
            "GroupHold", "MyId", "ParentId", "NameTag", "Avoid", "Latitude", "Longitude",
            "Range", "LocationType",
        ],
        "ScanC-Freq" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "Frequency", "Modulation",
            "AudioOption", "FuncTagId", "Attenuator", "Delay", "VolumeOffset",
            "AlertTone", "AlertVolume", "AlertColor", "AlertPattern", "NumberTag",
            "PriorityChannel",
        ],
        "ScanTGID" => &[
            "MyId", "ParentId", "NameTag", "Avoid", "TGID", "AudioType", "FuncTagId",
            "Delay", "VolumeOffset", "AlertTone", "AlertVolume", "AlertColor",
            "AlertPattern", "NumberTag", "PriorityChannel", "TDMASlot",
        ],
        "ScanSite" => &[
            "SiteHold", "MyId", "ParentId", "NameTag", "Avoid", "Latitude", "Longitude",
            "Range", "Modulation", "MotBandType", "EdacsBandType", "LocationType",
            "Attenuator", "DigitalWaitingTime", "DigitalThresholdMode",
            "DigitalThresholdLevel", "QuickKey", "NAC", "Filter",
        ],
        "ScanT-Freq" => &[
            "Reserve(MyId)", "ParentId", "Reserve", "Reserve(Avoid)", "Frequency", "LCN",
            "ColorCode/RAN/Area",
        ],
        "ModeInfo" => &["Mode", "SystemHold", "DeptHold"],
        "SearchWithScan" => &["SystemIndex"],
        "CustomSearch" => &["Bank", "Frequency"],
        "QuickSearch" => &["Frequency"],
        "ToneOut" => &["Channel"],
        "CloseCall" => &[],

        // discovery.cfg
        "ConvDiscovery" => &[
            "Reserve", "Name", "Lower", "Upper", "Modulation", "Step", "Delay", "Logging",
            "CompareDB", "Duration", "TimeOut", "AutoStore",
        ],
        "TrunkDiscovery" => &[
            "Reserve", "Name", "Delay", "Logging", "CompareDB", "Duration", "FavName",
            "SystemName", "TrunkId", "SystemType", "SiteId", "SiteName", "TimeOut",
            "AutoStore",
        ],

        // profile.cfg / scanner.inf
        "ProductName" => &["Model"],
        "GlobalSetting" => &[
            "ScanHpdb", "G-Attenuator", "Reserve", "PriorityScanMode", "CloseCallMode",
            "WXPriorityMode", "PriorityInterval", "PriorityMaxChannels", "SrchKey1",
            "SrchKey2", "SrchKey3", "KeyLock", "KeyBeep", "Volume", "Squelch",
            "SearchWithScanList", "SearchWithScanSystemAvoid", "SiteNACOperation",
            "GlobalAutoFilter",
        ],
        "SearchCommon" => &[
            "Reserve", "RepeaterFind", "Attenuator", "Delay", "Modulation", "agc_analog",
            "agc_digital", "Digital_waiting_time", "Digital_threshold_Mode",
            "Digital_threshold_Level", "Filter",
        ],
        "PresetBroadcastScreen" => &["Pager", "FM", "UHF_TV", "VHF_TV", "NOAA_WX"],
        "CurrentLocation" => &["Latitude", "Longitude", "Range"],
        "GpsOption" => &["GpsFormat", "BaudRate"],
        "InterestingLocation" => &["Name", "Latitude", "Longitude", "Range"],
        "Weather" => &["Reserve", "Delay", "Attenuator", "agc_analog"],
        "DisplayOption" => &[
            "Reserve1", "Reserve2", "Reserve3", "MotTgidFormat", "ScnDispMode",
            "SimpleMode", "EdacTgidFormat", "ColorMode",
        ],
        "Backlight" => &[
            "Reserve1", "Reserve2", "Reserve3", "Brightness", "Key_Backlight", "FlashLed",
            "Ext_PWR_Light", "SQ_Light", "KeyLight", "Dimmer_mode", "Auto_Polarity",
            "Manual_Level", "Dimmer_L", "Dimmer_H", "Key_Backlight2",
        ],
        "Battery" => &[
            "BatterySave", "Reserve1", "Reserve2", "AlertInterval", "AlertTone",
            "AlertVolume",
        ],
        "OwnerInfo" => &["OwnerName", "ProductName", "Line1", "Line2"],
        "ClockOption" => &["TimeFormat", "TimeZone", "DST"],
        "RecordingOption" => &["Duration"],
        "StandbyOption" => &["StandbyMode", "KeyBehavior"],
        "LimitSearch" => &["SrchId", "Name", "Lower", "Upper", "Modulation", "Step"],
        "BandDefault" => &["BandId", "Modulation", "Step"],
        "IfxFreqs" => &[],
        "Scanner" => &[
            "Model", "ESN", "F_Ver", "R_Ver", "Reserve", "Zip_Ver", "City_Ver",
            "WiFi_Ver", "SCPU_Ver",
        ],
        _ => return None,
    };
    Some(names)
}

fn derived_names(record_type: &str, field_count: usize, fields: &[String]) -> Vec<String> {
    match record_type {
        "AvoidTgids" => {
            let mut names = vec!["MyId".to_string()];
            names.extend((1..field_count).map(|i| format!("TGID{}", i)));
            names
        }
        "BandPlan_Mot" => {
            let mut names = vec!["MyId".to_string()];
            for idx in 0..6 {
                names.push(format!("Lower{}", idx));
                names.push(format!("Upper{}", idx));
                names.push(format!("Spacing{}", idx));
                names.push(format!("Offset{}", idx));
            }
            names
        }
        "BandPlan_P25" => {
            let mut names = vec!["MyId".to_string()];
            for idx in 0..16 {
                names.push(format!("Base{:X}", idx));
                names.push(format!("Spacing{:X}", idx));
            }
            names
        }
        "DQKs_Status" => {
            let mut names = vec!["MyId".to_string()];
            names.extend(seq("D-Qkey_", 0, 99));
            names
        }
        "QuickKeys" => seq("F-Qkey_", 0, 99),
        "ServiceType" => (1..=37).map(|i| format!("Id{:02}_state", i)).collect(),
        "CustomServiceType" => (1..=10).map(|i| format!("Id{:02}_state", i)).collect(),
        "WxSameList" => {
            let mut names = vec!["SameId".to_string(), "Name".to_string()];
            names.extend((0..8).map(|i| format!("FIPS{}", i)));
            names
        }
        "CustomBroadcastScreen" => {
            let mut names: Vec<String> = (0..10).map(|i| format!("Band{}Enable", i)).collect();
            names.extend((0..10).map(|i| format!("Band{}Lower", i)));
            names.extend((0..10).map(|i| format!("Band{}Upper", i)));
            names
        }
        "DispOptItems" => {
            let mut names = vec!["DispOptId".to_string(), "DispLayoutId".to_string()];
            let extra = field_count.saturating_sub(2);
            names.extend((1..=extra).map(|i| format!("OptItem{}", i)));
            names
        }
        "DispColors" => {
            let extra = field_count.saturating_sub(2);
            let text_count = extra / 2;
            let back_count = extra - text_count;
            let mut names = vec!["DispColorId".to_string(), "ColorLayoutId".to_string()];
            names.extend((1..=text_count).map(|i| format!("TextColor{}", i)));
            names.extend((1..=back_count).map(|i| format!("BackColor{}", i)));
            names
        }
        "F-List" => {
            let mut names = vec![
                "UserName".to_string(),
                "Filename".to_string(),
                "LocationControl".to_string(),
                "Monitor".to_string(),
                "QuickKey".to_string(),
                "NumberTag".to_string(),
            ];
            names.extend((0..10).map(|i| format!("StartupKey{}", i)));
            let remaining = field_count.saturating_sub(names.len());
            if remaining > 0 {
                names.extend(seq("S-Qkey_", 0, remaining - 1));
            }
            names
        }
        // A 3-field Avoid is a site avoid when field 3 carries a site
        // reference, otherwise a department avoid.
        "Avoid" => match field_count {
            0 | 1 => Vec::new(),
            2 => vec!["StateId".to_string(), "SystemId".to_string()],
            3 => {
                if fields.get(2).map(|f| f.starts_with("SiteId=")).unwrap_or(false) {
                    vec!["StateId".to_string(), "SystemId".to_string(), "SiteId".to_string()]
                } else {
                    vec!["StateId".to_string(), "SystemId".to_string(), "DeptId".to_string()]
                }
            }
            _ => vec![
                "StateId".to_string(),
                "SystemId".to_string(),
                "DeptId".to_string(),
                "ChannelId".to_string(),
            ],
        },
        // Known leading fields, reserved placeholders for the rest.
        "ToneOut" | "CloseCall" => {
            let base = fixed_names(record_type).unwrap_or(&[]);
            let mut names: Vec<String> = base.iter().map(|s| s.to_string()).collect();
            names.extend(reserve(field_count.saturating_sub(base.len())));
            names
        }
        _ => Vec::new(),
    }
}

/// Resolve the canonical field names for one record. The result may be
/// shorter or longer than `fields`; callers zip positionally and the
/// mismatch is tolerated, never fatal.
pub fn resolve(record_type: &str, fields: &[String]) -> Vec<String> {
    match record_type {
        "ServiceType" | "CustomServiceType" | "AvoidTgids" | "BandPlan_Mot"
        | "BandPlan_P25" | "DQKs_Status" | "QuickKeys" | "WxSameList"
        | "CustomBroadcastScreen" | "DispOptItems" | "DispColors" | "F-List" | "Avoid"
        | "ToneOut" | "CloseCall" => derived_names(record_type, fields.len(), fields),
        _ => fixed_names(record_type)
            .map(|names| names.iter().map(|s| s.to_string()).collect())
            .unwrap_or_else(|| derived_names(record_type, fields.len(), fields)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fixed_type() {
        let names = resolve("StateInfo", &fields(&["StateId=6", "CountryId=1", "Colorado", "CO"]));
        assert_eq!(names, vec!["StateId", "CountryId", "NameTag", "ShortName"]);
    }

    #[test]
    fn test_unknown_type_empty() {
        assert!(resolve("NoSuchRecord", &fields(&["a", "b"])).is_empty());
    }

    #[test]
    fn test_avoid_tgids_count_derived() {
        let names = resolve("AvoidTgids", &fields(&["TrunkId=3", "100", "200", "300"]));
        assert_eq!(names, vec!["MyId", "TGID1", "TGID2", "TGID3"]);
    }

    #[test]
    fn test_band_plan_p25_hex_indices() {
        let names = resolve("BandPlan_P25", &fields(&["SiteId=1"]));
        assert_eq!(names.len(), 33);
        assert_eq!(names[1], "Base0");
        assert_eq!(names[21], "BaseA");
        assert_eq!(names[32], "SpacingF");
    }

    #[test]
    fn test_dqks_status_hundred_keys() {
        let names = resolve("DQKs_Status", &[]);
        assert_eq!(names.len(), 101);
        assert_eq!(names[1], "D-Qkey_00");
        assert_eq!(names[100], "D-Qkey_99");
    }

    #[test]
    fn test_flist_hybrid_suffix() {
        let mut values = fields(&["List", "f_000001.hpd", "Off", "On", "Off", "Off"]);
        values.extend(std::iter::repeat("Off".to_string()).take(10)); // startup keys
        values.extend(std::iter::repeat("Off".to_string()).take(5)); // partial S-Qkeys
        let names = resolve("F-List", &values);
        assert_eq!(names.len(), 21);
        assert_eq!(names[16], "S-Qkey_00");
        assert_eq!(names[20], "S-Qkey_04");
    }

    #[test]
    fn test_avoid_variants() {
        assert_eq!(
            resolve("Avoid", &fields(&["StateId=6", "SystemId=2", "SiteId=9"])),
            vec!["StateId", "SystemId", "SiteId"]
        );
        assert_eq!(
            resolve("Avoid", &fields(&["StateId=6", "SystemId=2", "DeptId=4"])),
            vec!["StateId", "SystemId", "DeptId"]
        );
        assert_eq!(
            resolve("Avoid", &fields(&["StateId=6", "SystemId=2"])),
            vec!["StateId", "SystemId"]
        );
    }

    #[test]
    fn test_tone_out_reserve_padding() {
        let names = resolve("ToneOut", &fields(&["1", "x", "y"]));
        assert_eq!(names, vec!["Channel", "Reserve1", "Reserve2"]);
    }
}
