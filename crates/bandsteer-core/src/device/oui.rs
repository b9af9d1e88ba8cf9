//! Embedded OUI → vendor table (source of truth for C2's vendor lookup).
//!
//! Simplified for the offline case: a static table of common vendors plus
//! the reserved locally-administered prefixes used to mark virtual/random
//! MACs. In a larger deployment this would load from a CSV at startup;
//! bundling it keeps the classifier fully offline.

pub const KNOWN_OUIS: &[(&str, &str)] = &[
    // Apple
    ("00:17:f2", "Apple"),
    ("00:1b:63", "Apple"),
    ("00:1c:b3", "Apple"),
    ("00:1e:52", "Apple"),
    ("00:1f:5b", "Apple"),
    ("00:1f:f3", "Apple"),
    ("00:21:e9", "Apple"),
    ("00:22:41", "Apple"),
    ("00:23:12", "Apple"),
    ("00:23:32", "Apple"),
    ("00:23:6c", "Apple"),
    ("00:23:df", "Apple"),
    ("00:24:36", "Apple"),
    ("00:25:00", "Apple"),
    ("00:25:4b", "Apple"),
    ("00:25:bc", "Apple"),
    ("00:26:08", "Apple"),
    ("00:26:4a", "Apple"),
    ("00:26:b0", "Apple"),
    ("00:26:bb", "Apple"),
    // Samsung
    ("00:02:78", "Samsung"),
    ("00:07:ab", "Samsung"),
    ("00:09:18", "Samsung"),
    ("00:0d:ae", "Samsung"),
    ("00:12:47", "Samsung"),
    ("00:12:fb", "Samsung"),
    ("00:13:77", "Samsung"),
    ("00:15:99", "Samsung"),
    ("00:15:b9", "Samsung"),
    ("00:16:32", "Samsung"),
    ("00:16:6b", "Samsung"),
    ("00:16:db", "Samsung"),
    // Huawei
    ("00:18:82", "Huawei"),
    ("00:19:e0", "Huawei"),
    ("00:1e:10", "Huawei"),
    ("00:25:68", "Huawei"),
    ("00:46:4b", "Huawei"),
    ("00:66:4b", "Huawei"),
    ("00:e0:fc", "Huawei"),
    // Intel (common laptop Wi-Fi chips)
    ("00:13:e8", "Intel"),
    ("00:1b:21", "Intel"),
    ("00:21:6a", "Intel"),
    ("00:22:fb", "Intel"),
    // Random / locally administered
    ("02:00:00", "Virtual"),
    ("06:00:00", "Virtual"),
];

/// Extracts the OUI (first three octets, colon-separated, lowercase) from
/// a MAC address. Returns `None` if the MAC is malformed.
pub fn extract_oui(mac: &str) -> Option<String> {
    let mac = mac.trim().to_ascii_lowercase().replace('-', ":");
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() < 3 {
        return None;
    }
    for part in &parts[..3] {
        if part.len() != 2 || !part.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
    }
    Some(parts[..3].join(":"))
}

/// Looks up the vendor for a MAC address. Returns `"Unknown"` when the OUI
/// cannot be parsed or is absent from [`KNOWN_OUIS`].
pub fn lookup_vendor(mac: &str) -> String {
    let Some(oui) = extract_oui(mac) else {
        return "Unknown".to_string();
    };
    KNOWN_OUIS
        .iter()
        .find(|(known, _)| *known == oui)
        .map(|(_, vendor)| vendor.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}
