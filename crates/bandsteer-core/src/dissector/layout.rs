//! Field names requested from the external dissector, in the exact order
//! they are emitted on each output line (`-T fields -E separator=/t`).

pub const FIELDS: &[&str] = &[
    "frame.time_epoch",
    "frame.protocols",
    "frame.len",
    "wlan.fc.type_subtype",
    "wlan.bssid",
    "wlan.sa",
    "wlan.da",
    "wlan_radio.frequency",
    "wlan.fixed.reason_code",
    "wlan.ssid",
    "wlan.fixed.category_code",
    "wlan.fixed.action_code",
    "wlan.fixed.bss_transition_status_code",
    "wlan.fixed.status_code",
    "wlan_radio.signal_dbm",
];

pub const FIELD_COUNT: usize = FIELDS.len();

pub const IDX_TIME_EPOCH: usize = 0;
pub const IDX_PROTOCOLS: usize = 1;
pub const IDX_FRAME_LEN: usize = 2;
pub const IDX_TYPE_SUBTYPE: usize = 3;
pub const IDX_BSSID: usize = 4;
pub const IDX_SA: usize = 5;
pub const IDX_DA: usize = 6;
pub const IDX_FREQUENCY: usize = 7;
pub const IDX_REASON_CODE: usize = 8;
pub const IDX_SSID: usize = 9;
pub const IDX_CATEGORY_CODE: usize = 10;
pub const IDX_ACTION_CODE: usize = 11;
pub const IDX_BTM_STATUS_CODE: usize = 12;
pub const IDX_ASSOC_STATUS_CODE: usize = 13;
pub const IDX_SIGNAL_DBM: usize = 14;

/// Management-frame subtypes referenced throughout the aggregator and
/// steering state machine.
pub mod subtype {
    pub const ASSOC_REQUEST: u8 = 0;
    pub const ASSOC_RESPONSE: u8 = 1;
    pub const REASSOC_REQUEST: u8 = 2;
    pub const REASSOC_RESPONSE: u8 = 3;
    pub const BEACON: u8 = 8;
    pub const DISASSOC: u8 = 10;
    pub const DEAUTH: u8 = 12;
    pub const ACTION: u8 = 13;
    pub const DATA: u8 = 0x20;
    pub const QOS_DATA: u8 = 0x28;
}

pub mod action {
    pub const BTM_REQUEST: u8 = 7;
    pub const BTM_RESPONSE: u8 = 8;
}

pub mod category {
    pub const RADIO_MEASUREMENT: u8 = 5;
    pub const WNM: u8 = 10;
}
