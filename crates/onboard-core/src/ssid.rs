//! SSID encoding used by platform profile stores.
//!
//! Platform profile stores and connection info wrap UTF-8 SSIDs in double
//! quotes (`"MyNetwork"`). Callers only ever see the unquoted form; the
//! quoting is applied on the way in and stripped on the way out here.

/// Sentinel reported by the platform when there is no association.
pub const UNKNOWN_SSID: &str = "<unknown ssid>";

/// Wrap an SSID in the platform's quoting convention.
pub fn quote(ssid: &str) -> String {
    format!("\"{}\"", ssid)
}

/// Strip one pair of wrapping quotes, if present.
///
/// Values without a matching pair (including a lone `"`) are returned as-is.
pub fn unquote(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Normalize a raw SSID reported by the platform.
pub fn normalize(raw: &str) -> String {
    unquote(raw.trim_end_matches('\0')).to_string()
}

/// Check whether two SSIDs are equal once normalized.
pub fn matches(raw: &str, ssid: &str) -> bool {
    unquote(raw) == unquote(ssid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_round_trip() {
        for ssid in ["DeviceAP", "ESP_1A2B3C", "with space", "ünïcode", "x"] {
            assert_eq!(unquote(&quote(ssid)), ssid);
        }
    }

    #[test]
    fn test_unquote_leaves_bare_values() {
        assert_eq!(unquote("DeviceAP"), "DeviceAP");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"half"), "\"half");
        assert_eq!(unquote(""), "");
        assert_eq!(unquote("\"\""), "");
    }

    #[test]
    fn test_normalize_trims_nul_padding() {
        assert_eq!(normalize("\"DeviceAP\"\0\0"), "DeviceAP");
        assert_eq!(normalize("\"DeviceAP\""), "DeviceAP");
    }

    #[test]
    fn test_matches_ignores_quoting() {
        assert!(matches("\"DeviceAP\"", "DeviceAP"));
        assert!(matches("DeviceAP", "DeviceAP"));
        assert!(!matches("\"DeviceAP\"", "OtherAP"));
    }
}
