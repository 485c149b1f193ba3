// Field value helpers
//
// HomePatrol files carry identifiers as key=value tokens ("StateId=42"),
// booleans as On/Off, frequencies as plain Hz integers, and coordinates as
// decimal degrees. These helpers centralize extraction and range checks.

/// Plausible radio frequency range: 25 MHz to 10 GHz.
pub const MIN_FREQUENCY_HZ: u64 = 25_000_000;
pub const MAX_FREQUENCY_HZ: u64 = 10_000_000_000;

/// Extract a numeric id from a "Name=123" token. Returns None when the key
/// does not match or the value is not a number.
pub fn extract_id(token: &str, key: &str) -> Option<u64> {
    let rest = token.strip_prefix(key)?;
    let value = rest.strip_prefix('=')?;
    value.trim().parse().ok()
}

/// Scan all fields for the first "key=N" token and return N.
pub fn find_id(fields: &[String], key: &str) -> Option<u64> {
    fields.iter().find_map(|f| extract_id(f.trim(), key))
}

/// Parse On/Off (also Yes/No, true/1) to a boolean.
pub fn parse_enabled(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "yes" | "true" | "1"
    )
}

/// True when `value` is a non-empty string of ASCII digits.
pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an unsigned integer field, falling back to `default` for
/// missing/non-numeric values.
pub fn parse_u32_or(value: &str, default: u32) -> u32 {
    if is_digits(value) {
        value.parse().unwrap_or(default)
    } else {
        default
    }
}

/// Parse a signed integer field (delays and volume offsets may be negative).
pub fn parse_i32_or(value: &str, default: i32) -> i32 {
    value.trim().parse().unwrap_or(default)
}

/// Parse an optional decimal field: empty or unparseable values are None.
pub fn parse_f64_opt(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    value.trim().parse().ok()
}

/// Frequency plausibility check in Hz.
pub fn validate_frequency(frequency_hz: u64) -> bool {
    (MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency_hz)
}

/// Latitude/longitude plausibility check in decimal degrees.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Parse a latitude/longitude pair, rejecting out-of-range values.
pub fn parse_coordinates(lat: &str, lon: &str) -> Option<(f64, f64)> {
    let lat = parse_f64_opt(lat)?;
    let lon = parse_f64_opt(lon)?;
    if validate_coordinates(lat, lon) {
        Some((lat, lon))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_id() {
        assert_eq!(extract_id("StateId=42", "StateId"), Some(42));
        assert_eq!(extract_id("StateId=42", "CountyId"), None);
        assert_eq!(extract_id("StateId=", "StateId"), None);
        assert_eq!(extract_id("StateIdx=42", "StateId"), None);
    }

    #[test]
    fn test_find_id() {
        let fields = vec!["Foo".to_string(), "AgencyId=7".to_string()];
        assert_eq!(find_id(&fields, "AgencyId"), Some(7));
        assert_eq!(find_id(&fields, "CGroupId"), None);
    }

    #[test]
    fn test_parse_enabled() {
        assert!(parse_enabled("On"));
        assert!(parse_enabled(" on "));
        assert!(!parse_enabled("Off"));
        assert!(!parse_enabled(""));
    }

    #[test]
    fn test_frequency_range() {
        assert!(validate_frequency(460_025_000));
        assert!(!validate_frequency(12_000));
        assert!(!validate_frequency(20_000_000_000));
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(parse_coordinates("39.5", "-104.8"), Some((39.5, -104.8)));
        assert_eq!(parse_coordinates("99.0", "-104.8"), None);
        assert_eq!(parse_coordinates("", "-104.8"), None);
    }

    #[test]
    fn test_int_fallbacks() {
        assert_eq!(parse_u32_or("400", 0), 400);
        assert_eq!(parse_u32_or("x", 8), 8);
        assert_eq!(parse_i32_or("-5", 2), -5);
        assert_eq!(parse_i32_or("", 2), 2);
    }
}
