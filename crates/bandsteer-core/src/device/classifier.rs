use super::oui;
use super::{DeviceCategory, DeviceHints, DeviceInfo};

const MOBILE_VENDORS: &[&str] = &[
    "apple", "samsung", "huawei", "xiaomi", "motorola", "lg", "oppo", "vivo", "oneplus", "google",
    "nokia", "honor",
];
const LAPTOP_CHIPS: &[&str] = &["intel", "broadcom", "realtek", "qualcomm", "atheros", "marvell"];
const NETWORK_VENDORS: &[&str] = &[
    "cisco", "aruba", "ubiquiti", "netgear", "tp-link", "tplink", "d-link", "dlink", "asus",
    "mikrotik", "ruckus", "meraki",
];
const VM_VENDORS: &[&str] = &[
    "vmware", "virtualbox", "qemu", "xen", "hyper-v", "hyperv", "parallels", "virtual",
];

/// Classifies a device from its MAC address, optional user-supplied
/// overrides, and an optional originating filename.
///
/// # Examples
/// ```
/// use bandsteer_core::device::{classify_device, DeviceHints};
///
/// let info = classify_device("00:17:f2:aa:bb:cc", &DeviceHints::default(), None);
/// assert_eq!(info.vendor, "Apple");
/// ```
pub fn classify_device(mac: &str, hints: &DeviceHints, filename: Option<&str>) -> DeviceInfo {
    let oui_value = oui::extract_oui(mac).unwrap_or_else(|| "00:00:00".to_string());
    let is_local_admin = is_local_admin_mac(mac);

    let mut vendor = if is_local_admin {
        "Virtual".to_string()
    } else {
        oui::lookup_vendor(mac)
    };
    let mut model: Option<String> = None;
    let mut had_useful_filename = false;

    if let Some(filename) = filename {
        let cleaned = infer_from_filename(filename);
        if !cleaned.is_empty() {
            had_useful_filename = true;
            let lower = cleaned.to_ascii_lowercase();
            if let Some(matched) = MOBILE_VENDORS.iter().find(|v| lower.contains(**v)) {
                if vendor == "Unknown" {
                    vendor = titlecase(matched);
                }
                model = Some(cleaned);
            } else if vendor == "Unknown" {
                model = Some(cleaned);
            }
        }
    }

    if let Some(brand) = hints.brand.as_deref().filter(|b| !b.trim().is_empty()) {
        vendor = brand.to_string();
    }
    if let Some(hint_model) = hints.model.as_deref().filter(|m| !m.trim().is_empty()) {
        model = Some(hint_model.to_string());
    }

    let category = categorize(&vendor);
    let is_virtual = category == DeviceCategory::VirtualMachine || is_local_admin;

    let has_hints = hints.brand.is_some() || hints.model.is_some();
    let confidence = if has_hints {
        1.0
    } else if had_useful_filename && vendor != "Unknown" {
        1.0
    } else if vendor != "Unknown" {
        0.9
    } else {
        0.1
    };

    DeviceInfo {
        mac_address: mac.to_ascii_lowercase(),
        oui: oui_value,
        vendor,
        device_model: model,
        device_category: category,
        is_virtual,
        confidence,
    }
}

fn categorize(vendor: &str) -> DeviceCategory {
    let lower = vendor.to_ascii_lowercase();
    if VM_VENDORS.iter().any(|v| lower.contains(v)) {
        DeviceCategory::VirtualMachine
    } else if MOBILE_VENDORS.iter().any(|v| lower.contains(v)) {
        DeviceCategory::Mobile
    } else if LAPTOP_CHIPS.iter().any(|v| lower.contains(v)) {
        DeviceCategory::Computer
    } else if NETWORK_VENDORS.iter().any(|v| lower.contains(v)) {
        DeviceCategory::NetworkEquipment
    } else {
        DeviceCategory::Unknown
    }
}

fn is_local_admin_mac(mac: &str) -> bool {
    let Some(first_octet) = mac.split(|c| c == ':' || c == '-').next() else {
        return false;
    };
    u8::from_str_radix(first_octet, 16)
        .map(|byte| byte & 0x02 != 0)
        .unwrap_or(false)
}

/// Strips a leading UUID prefix (36 chars followed by `_`), a leading
/// numeric prefix, the capture extension, and replaces separators with
/// spaces, matching the filename-inference rule in SPEC_FULL.md §4.2.
fn infer_from_filename(filename: &str) -> String {
    let mut name = filename;

    if let Some((head, tail)) = name.split_once('_') {
        if head.len() == 36 && head.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            name = tail;
        }
    }

    let name = name.trim_start_matches(|c: char| c.is_ascii_digit() || c == '_' || c == '-');

    let name = strip_capture_extension(name);

    name.replace(['_', '-'], " ").trim().to_string()
}

fn strip_capture_extension(name: &str) -> &str {
    for ext in [".pcapng", ".pcap"] {
        if name.len() > ext.len() {
            let tail_start = name.len() - ext.len();
            if name[tail_start..].eq_ignore_ascii_case(ext) {
                return &name[..tail_start];
            }
        }
    }
    name
}

fn titlecase(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
