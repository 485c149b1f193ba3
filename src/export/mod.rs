// Export: regenerate tab-delimited scanner files
//
// Two paths. Entity-driven export walks the hierarchy in recorded order
// and re-renders every value through the positional field layout (the
// inverse of the field-spec resolver). Replay export reconstructs any
// stored file from the structured record store, including record types the
// builders do not model.

pub mod favorites;
pub mod hpdb;
pub mod replay;

/// Render an optional coordinate at the fixed 6-decimal precision native
/// exporters use. Unset values are empty columns, never omitted ones.
pub(crate) fn fmt_coord(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.6}", v),
        None => String::new(),
    }
}

/// Range values render at one decimal place.
pub(crate) fn fmt_range(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => String::new(),
    }
}

pub(crate) fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "On"
    } else {
        "Off"
    }
}

/// Join a record tag and its fields into one tab-delimited line.
pub(crate) fn push_line<S: AsRef<str>>(out: &mut String, tag: &str, fields: &[S]) {
    out.push_str(tag);
    for field in fields {
        out.push('\t');
        out.push_str(field.as_ref());
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_coord() {
        assert_eq!(fmt_coord(Some(39.5)), "39.500000");
        assert_eq!(fmt_coord(None), "");
    }

    #[test]
    fn test_push_line() {
        let mut out = String::new();
        push_line(&mut out, "AreaState", &["AgencyId=1", "StateId=6"]);
        assert_eq!(out, "AreaState\tAgencyId=1\tStateId=6\n");
    }
}
