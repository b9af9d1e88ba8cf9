//! Field-level normalization for dissector output lines.
//!
//! Mirrors the byte-level `reader` modules used by the protocol decoders:
//! small, pure helpers that turn a raw text field into a typed value,
//! tolerating the dissector's various numeric encodings.

/// Parses a field as `f64`, treating an empty string as absent.
pub fn parse_opt_f64(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    field.parse::<f64>().ok()
}

/// Parses a field as `u64`, accepting `0x`-prefixed hex or plain decimal.
pub fn parse_opt_int(field: &str) -> Option<i64> {
    let field = field.trim();
    if field.is_empty() {
        return None;
    }
    if let Some(hex) = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    field.parse::<i64>().ok()
}

/// Parses a non-empty string field, returning `None` for blank fields.
pub fn parse_opt_str(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// Normalizes `wlan.fc.type_subtype`: dissectors may emit the combined
/// `type*256+subtype` form (values >= 256) or the bare subtype. Either way
/// the management-frame subtype is the low byte.
pub fn normalize_subtype(raw: i64) -> u8 {
    (raw.rem_euclid(256)) as u8
}

/// Normalizes a frequency field to MHz: some dissectors emit kHz.
pub fn normalize_frequency(raw: f64) -> f64 {
    if raw > 10_000.0 { raw / 1000.0 } else { raw }
}

/// Normalizes a MAC address field to lowercase, colon-separated form.
pub fn normalize_mac(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
