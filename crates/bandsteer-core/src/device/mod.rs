//! OUI/Device Classifier (C2).
//!
//! `oui` holds the embedded vendor table (source of truth); `classifier`
//! performs filename inference, category heuristics, and confidence
//! scoring. Pure functions, no I/O.

mod classifier;
pub mod oui;

pub use classifier::classify_device;

use serde::{Deserialize, Serialize};

/// User-supplied overrides for vendor/model, always taking priority over
/// inference and forcing `confidence = 1.0`.
#[derive(Debug, Clone, Default)]
pub struct DeviceHints {
    pub brand: Option<String>,
    pub model: Option<String>,
}

/// Device category, a closed set per Design Note "deep inheritance ->
/// tagged variants".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCategory {
    Mobile,
    Computer,
    NetworkEquipment,
    VirtualMachine,
    Unknown,
}

/// Resolved device identity for the primary client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub mac_address: String,
    pub oui: String,
    pub vendor: String,
    pub device_model: Option<String>,
    pub device_category: DeviceCategory,
    pub is_virtual: bool,
    pub confidence: f64,
}
