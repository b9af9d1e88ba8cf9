//! Dissector adapter (C1).
//!
//! Produces a lazy, ordered sequence of [`CaptureRecord`] values from a
//! capture file by shelling out to an external packet dissector (a
//! `tshark`-compatible binary). I/O and subprocess management live here;
//! everything downstream only sees normalized records.
//!
//! Layered like the protocol decoders: `layout` holds the field list and
//! subtype/action/category constants (source of truth), `reader` holds
//! pure field-normalization helpers, `tshark` is the concrete
//! [`RecordSource`] implementation, `error` holds the explicit error enum.

pub mod error;
pub mod layout;
pub mod reader;
mod tshark;

pub use error::DissectorError;
pub use tshark::TsharkSource;

/// One normalized 802.11 management/action frame.
///
/// # Examples
/// ```
/// use bandsteer_core::CaptureRecord;
///
/// let rec = CaptureRecord {
///     timestamp: 1.0,
///     subtype: 13,
///     bssid: Some("aa:aa:aa:aa:aa:aa".into()),
///     sa: Some("aa:aa:aa:aa:aa:aa".into()),
///     da: Some("11:22:33:44:55:66".into()),
///     frequency: Some(5180.0),
///     rssi: Some(-42.0),
///     ssid: None,
///     reason_code: None,
///     category_code: Some(10),
///     action_code: Some(7),
///     btm_status_code: None,
///     assoc_status_code: None,
///     frame_len: 120,
///     protocols: "wlan".into(),
/// };
/// assert_eq!(rec.subtype, 13);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub timestamp: f64,
    pub subtype: u8,
    pub bssid: Option<String>,
    pub sa: Option<String>,
    pub da: Option<String>,
    pub frequency: Option<f64>,
    pub rssi: Option<f64>,
    pub ssid: Option<String>,
    pub reason_code: Option<i64>,
    pub category_code: Option<i64>,
    pub action_code: Option<i64>,
    pub btm_status_code: Option<i64>,
    pub assoc_status_code: Option<i64>,
    pub frame_len: u64,
    pub protocols: String,
}

/// Wireless band, derived from frequency.
///
/// # Examples
/// ```
/// use bandsteer_core::Band;
///
/// assert_eq!(Band::from_frequency(2442.0), Some(Band::Band24));
/// assert_eq!(Band::from_frequency(5180.0), Some(Band::Band5));
/// assert_eq!(Band::from_frequency(3000.0), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Band24,
    Band5,
}

impl Band {
    pub fn from_frequency(freq: f64) -> Option<Band> {
        if (2400.0..=2500.0).contains(&freq) {
            Some(Band::Band24)
        } else if (5000.0..=6000.0).contains(&freq) {
            Some(Band::Band5)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Band::Band24 => "2.4GHz",
            Band::Band5 => "5GHz",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Band {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Band {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "2.4GHz" => Ok(Band::Band24),
            "5GHz" => Ok(Band::Band5),
            other => Err(serde::de::Error::custom(format!("unknown band: {other}"))),
        }
    }
}

/// Abstract record source for the analysis pipeline, analogous to a
/// packet source but one layer up: records are already field-decoded.
///
/// # Examples
/// ```
/// use bandsteer_core::{CaptureRecord, DissectorError, RecordSource};
///
/// struct Empty;
///
/// impl RecordSource for Empty {
///     fn next_record(&mut self) -> Result<Option<CaptureRecord>, DissectorError> {
///         Ok(None)
///     }
/// }
/// ```
pub trait RecordSource {
    fn next_record(&mut self) -> Result<Option<CaptureRecord>, DissectorError>;
}

/// In-memory record source backed by a `Vec`, used by tests that cannot
/// depend on a real dissector binary or 802.11 pcap fixtures.
pub struct VecRecordSource {
    records: std::vec::IntoIter<CaptureRecord>,
}

impl VecRecordSource {
    pub fn new(records: Vec<CaptureRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl RecordSource for VecRecordSource {
    fn next_record(&mut self) -> Result<Option<CaptureRecord>, DissectorError> {
        Ok(self.records.next())
    }
}
