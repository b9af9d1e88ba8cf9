//! The persisted artifact (§3 "Band Steering Analysis") and its
//! `wireshark_compare` diagnostic block.

use serde::{Deserialize, Serialize};

use crate::aggregate::counters::RawStats;
use crate::aggregate::{BtmEvent, SignalSample};
use crate::compliance::{ComplianceCheck, KvrSupport, Verdict};
use crate::device::DeviceInfo;
use crate::steering::SteeringTransition;

/// One synchronized counter entry in the `wireshark_compare` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WiresharkCompareEntry {
    pub field: String,
    pub raw_value: u64,
    pub synchronized_value: u64,
    pub severity: Option<String>,
}

/// Diagnostic cross-check between C5's raw counters and the values after
/// C6/C7 synchronization (§4.8). Never empty-vs-populated by construction —
/// synchronization only ever takes `max(raw, derived)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WiresharkCompare {
    pub entries: Vec<WiresharkCompareEntry>,
}

impl WiresharkCompare {
    /// Builds the comparison for the four synchronized fields named in
    /// §4.8: `btm_requests`, `btm_responses`, `successful_transitions`,
    /// `failed_transitions`.
    pub fn build(
        raw: &RawStats,
        synchronized_btm_requests: u64,
        synchronized_btm_responses: u64,
        synchronized_successful: u64,
        synchronized_failed: u64,
    ) -> Self {
        let fields = [
            ("btm_requests", raw.btm_requests, synchronized_btm_requests),
            ("btm_responses", raw.btm_responses, synchronized_btm_responses),
            ("successful_transitions", raw.btm_accept, synchronized_successful),
            ("failed_transitions", 0, synchronized_failed),
        ];

        let entries = fields
            .into_iter()
            .map(|(field, raw_value, synchronized_value)| {
                let severity = if synchronized_value > raw_value {
                    Some("warning".to_string())
                } else if synchronized_value < raw_value {
                    Some("error".to_string())
                } else {
                    None
                };
                WiresharkCompareEntry {
                    field: field.to_string(),
                    raw_value,
                    synchronized_value,
                    severity,
                }
            })
            .collect();

        WiresharkCompare { entries }
    }
}

/// The complete persisted analysis artifact, `data/analyses/.../{uuid}.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandSteeringAnalysis {
    pub analysis_id: String,
    pub filename: String,
    pub analysis_timestamp: String,
    pub total_packets: u64,
    pub wlan_packets: u64,
    pub analysis_duration_ms: u64,

    pub devices: Vec<DeviceInfo>,
    pub btm_events: Vec<BtmEvent>,
    pub transitions: Vec<SteeringTransition>,
    pub signal_samples: Vec<SignalSample>,

    pub btm_requests: u64,
    pub btm_responses: u64,
    pub btm_success_rate: f64,
    pub successful_transitions: u64,
    pub failed_transitions: u64,
    pub loops_detected: u64,

    pub kvr_support: KvrSupport,
    pub compliance_checks: Vec<ComplianceCheck>,
    pub verdict: Verdict,

    pub raw_stats: RawStats,
    pub wireshark_compare: WiresharkCompare,

    pub original_file_path: String,
    pub analysis_text: String,
}
