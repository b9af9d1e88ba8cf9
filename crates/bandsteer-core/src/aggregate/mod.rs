//! Frame-Stream Aggregator (C5) — the source of truth.
//!
//! Single pass over the full record slice: builds [`counters::RawStats`],
//! the BSSID map, the BTM event list, the chronological steering-event
//! union, and the downsampled signal-sample list. Nothing downstream may
//! contradict what this module counts (§2); C6/C7 only refine.

pub mod counters;
pub mod direction;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::deauth;
use crate::dissector::{layout, Band, CaptureRecord};

pub use counters::RawStats;

/// Role assigned to a BSSID once both bands are known (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BssidRole {
    Master,
    Slave,
}

/// Per-BSSID identity info accumulated across the capture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BssidInfo {
    pub band: Option<Band>,
    pub ssid: Option<String>,
    pub last_frequency: Option<f64>,
}

/// Assigns master/slave roles across the whole BSSID map: a BSSID is
/// `master` if it runs on 5GHz, or if it is the only band observed at all;
/// `slave` only when a 5GHz sibling was also observed somewhere in the
/// capture.
pub fn assign_roles(bssids: &HashMap<String, BssidInfo>) -> HashMap<String, BssidRole> {
    let any_5ghz = bssids
        .values()
        .any(|info| info.band == Some(Band::Band5));
    bssids
        .iter()
        .map(|(bssid, info)| {
            let role = match info.band {
                Some(Band::Band5) => BssidRole::Master,
                Some(Band::Band24) if any_5ghz => BssidRole::Slave,
                _ => BssidRole::Master,
            };
            (bssid.clone(), role)
        })
        .collect()
}

/// One sampled RSSI reading tied to the primary client (§3/§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSample {
    pub timestamp: f64,
    pub rssi: f64,
    pub band: Band,
    pub sa: Option<String>,
    pub da: Option<String>,
}

/// BTM event type (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BtmEventType {
    Request,
    Response,
}

/// A single BSS Transition Management request/response (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BtmEvent {
    pub timestamp: f64,
    pub event_type: BtmEventType,
    pub client_mac: String,
    pub ap_bssid: Option<String>,
    pub status_code: Option<i64>,
    pub band: Option<Band>,
    pub frequency: Option<f64>,
    pub rssi: Option<f64>,
}

/// Closed set of frame kinds the steering state machine (C6) consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringEventKind {
    BtmRequest,
    BtmResponse,
    AssocRequest,
    AssocResponse,
    ReassocRequest,
    ReassocResponse,
    Deauth,
    Disassoc,
}

/// One frame relevant to steering reconstruction, with roles already
/// resolved by [`direction::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringEvent {
    pub timestamp: f64,
    pub kind: SteeringEventKind,
    pub client_mac: String,
    pub ap_mac: Option<String>,
    pub bssid: Option<String>,
    pub band: Option<Band>,
    pub frequency: Option<f64>,
    pub rssi: Option<f64>,
    pub status_code: Option<i64>,
    pub reason_code: Option<i64>,
    /// Raw sender/receiver, kept alongside the resolved roles above so C6
    /// can re-run [`crate::deauth::classify`] without re-reading records.
    pub sa: Option<String>,
    pub da: Option<String>,
}

/// Everything the Frame-Stream Aggregator produces from one pass.
#[derive(Debug, Clone)]
pub struct AggregateOutput {
    pub raw: RawStats,
    pub bssids: HashMap<String, BssidInfo>,
    pub btm_events: Vec<BtmEvent>,
    pub steering_events: Vec<SteeringEvent>,
    pub signal_samples: Vec<SignalSample>,
    pub important_packets: Vec<CaptureRecord>,
}

/// Runs the single aggregation pass over `records` for the already-selected
/// `client_mac` (C4 runs first; see `analyze::analyze_capture`).
pub fn aggregate(records: &[CaptureRecord], client_mac: &str, config: &EngineConfig) -> AggregateOutput {
    let mut raw = RawStats::default();
    let mut bssids: HashMap<String, BssidInfo> = HashMap::new();
    let mut btm_events = Vec::new();
    let mut steering_events = Vec::new();
    let mut all_samples: Vec<SignalSample> = Vec::new();
    let mut important_packets: Vec<CaptureRecord> = Vec::new();
    let mut beacon_quota: HashMap<String, usize> = HashMap::new();

    raw.total_packets = records.len() as u64;

    for rec in records {
        if rec.protocols.to_ascii_lowercase().contains("wlan") {
            raw.wlan_packets += 1;
        }
        raw.bump_protocol(&rec.protocols);
        raw.bump_source(rec.sa.as_deref());
        raw.bump_destination(rec.da.as_deref());

        let band = rec.frequency.and_then(Band::from_frequency);
        update_bssid_info(&mut bssids, &mut raw, rec, band);

        match rec.subtype {
            layout::subtype::BEACON => {
                match band {
                    Some(Band::Band24) => raw.beacons_24 += 1,
                    Some(Band::Band5) => raw.beacons_5 += 1,
                    None => {}
                }
                if let Some(bssid) = rec.bssid.as_deref() {
                    let quota = beacon_quota.entry(bssid.to_string()).or_insert(0);
                    if *quota < config.beacon_quota_per_bssid {
                        *quota += 1;
                        important_packets.push(rec.clone());
                    }
                } else {
                    important_packets.push(rec.clone());
                }
            }
            layout::subtype::DATA | layout::subtype::QOS_DATA => match band {
                Some(Band::Band24) => raw.data_24 += 1,
                Some(Band::Band5) => raw.data_5 += 1,
                None => {}
            },
            subtype if is_probe_request(subtype) => match band {
                Some(Band::Band24) => raw.probe_requests_24 += 1,
                Some(Band::Band5) => raw.probe_requests_5 += 1,
                None => {}
            },
            subtype if is_probe_response(subtype) => match band {
                Some(Band::Band24) => raw.probe_responses_24 += 1,
                Some(Band::Band5) => raw.probe_responses_5 += 1,
                None => {}
            },
            _ => {}
        }

        let is_critical = matches!(
            rec.subtype,
            layout::subtype::ASSOC_REQUEST
                | layout::subtype::ASSOC_RESPONSE
                | layout::subtype::REASSOC_REQUEST
                | layout::subtype::REASSOC_RESPONSE
                | layout::subtype::DISASSOC
                | layout::subtype::DEAUTH
        ) || (rec.subtype == layout::subtype::ACTION
            && rec.category_code == Some(layout::category::WNM as i64));
        if is_critical && rec.subtype != layout::subtype::BEACON {
            important_packets.push(rec.clone());
        }

        accumulate_btm(&mut raw, &mut btm_events, rec, band);
        accumulate_assoc(&mut raw, rec);
        accumulate_deauth(&mut raw, rec, client_mac);
        accumulate_kvr(&mut raw, rec);

        if let (Some(rssi), Some(band)) = (rec.rssi, band) {
            if rec.sa.as_deref() == Some(client_mac) || rec.da.as_deref() == Some(client_mac) {
                all_samples.push(SignalSample {
                    timestamp: rec.timestamp,
                    rssi,
                    band,
                    sa: rec.sa.clone(),
                    da: rec.da.clone(),
                });
            }
        }

        if let Some(event) = build_steering_event(rec, band) {
            steering_events.push(event);
        }
    }

    steering_events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    btm_events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let client_samples: Vec<SignalSample> = all_samples
        .into_iter()
        .filter(|s| s.sa.as_deref() == Some(client_mac))
        .collect();
    let signal_samples = downsample(client_samples, config.signal_sample_cap);

    AggregateOutput {
        raw,
        bssids,
        btm_events,
        steering_events,
        signal_samples,
        important_packets,
    }
}

fn is_probe_request(subtype: u8) -> bool {
    subtype == 4
}

fn is_probe_response(subtype: u8) -> bool {
    subtype == 5
}

fn update_bssid_info(
    bssids: &mut HashMap<String, BssidInfo>,
    raw: &mut RawStats,
    rec: &CaptureRecord,
    band: Option<Band>,
) {
    let Some(bssid) = rec.bssid.as_deref() else {
        return;
    };
    let entry = bssids.entry(bssid.to_string()).or_default();
    if rec.ssid.is_some() {
        entry.ssid = rec.ssid.clone();
    }
    if let Some(freq) = rec.frequency {
        entry.last_frequency = Some(freq);
    }
    if let Some(band) = band {
        match entry.band {
            None => entry.band = Some(band),
            Some(existing) if existing != band => {
                raw.band_mismatches.push(format!(
                    "bssid {bssid} previously seen on {existing} now observed on {band}"
                ));
            }
            _ => {}
        }
    }
}

fn accumulate_btm(
    raw: &mut RawStats,
    btm_events: &mut Vec<BtmEvent>,
    rec: &CaptureRecord,
    band: Option<Band>,
) {
    if rec.subtype != layout::subtype::ACTION || rec.category_code != Some(layout::category::WNM as i64) {
        return;
    }
    let Some(dir) = direction::resolve(rec) else {
        return;
    };
    let Some(client_mac) = dir.client else {
        return;
    };

    if rec.action_code == Some(layout::action::BTM_REQUEST as i64) {
        raw.btm_requests += 1;
        btm_events.push(BtmEvent {
            timestamp: rec.timestamp,
            event_type: BtmEventType::Request,
            client_mac,
            ap_bssid: dir.ap,
            status_code: None,
            band,
            frequency: rec.frequency,
            rssi: rec.rssi,
        });
    } else if rec.action_code == Some(layout::action::BTM_RESPONSE as i64) {
        raw.btm_responses += 1;
        if let Some(status) = rec.btm_status_code {
            raw.record_btm_status(status);
            if status == 0 {
                raw.btm_accept += 1;
            } else {
                raw.btm_reject += 1;
            }
        }
        btm_events.push(BtmEvent {
            timestamp: rec.timestamp,
            event_type: BtmEventType::Response,
            client_mac,
            ap_bssid: dir.ap,
            status_code: rec.btm_status_code,
            band,
            frequency: rec.frequency,
            rssi: rec.rssi,
        });
    }
}

fn accumulate_assoc(raw: &mut RawStats, rec: &CaptureRecord) {
    use counters::AssocFailure;
    match rec.subtype {
        layout::subtype::ASSOC_REQUEST => raw.assoc_requests += 1,
        layout::subtype::REASSOC_REQUEST => raw.reassoc_requests += 1,
        layout::subtype::ASSOC_RESPONSE => {
            raw.assoc_responses += 1;
            record_assoc_outcome(raw, rec);
        }
        layout::subtype::REASSOC_RESPONSE => {
            raw.reassoc_responses += 1;
            record_assoc_outcome(raw, rec);
        }
        _ => {}
    }

    fn record_assoc_outcome(raw: &mut RawStats, rec: &CaptureRecord) {
        match rec.assoc_status_code {
            Some(0) => raw.assoc_success += 1,
            Some(_) => raw.assoc_failures.push(AssocFailure {
                timestamp: rec.timestamp,
                bssid: rec.bssid.clone(),
                status_code: rec.assoc_status_code,
            }),
            None => {}
        }
    }
}

fn accumulate_deauth(raw: &mut RawStats, rec: &CaptureRecord, client_mac: &str) {
    if rec.subtype != layout::subtype::DEAUTH && rec.subtype != layout::subtype::DISASSOC {
        return;
    }
    if rec.subtype == layout::subtype::DEAUTH {
        raw.deauth_count += 1;
    } else {
        raw.disassoc_count += 1;
    }
    if let Some(reason) = rec.reason_code {
        raw.record_deauth_reason(reason);
    }

    let class = deauth::classify(
        rec.da.as_deref(),
        rec.sa.as_deref(),
        client_mac,
        rec.reason_code.unwrap_or(1),
    );
    if deauth::is_directed_to_client(rec.da.as_deref(), rec.sa.as_deref(), client_mac) {
        raw.client_directed_deauth_count += 1;
    }
    if class == deauth::DeauthClass::ForcedToClient {
        raw.client_directed_forced_count += 1;
    }
}

fn accumulate_kvr(raw: &mut RawStats, rec: &CaptureRecord) {
    if rec.subtype == layout::subtype::ACTION {
        if rec.category_code == Some(layout::category::RADIO_MEASUREMENT as i64) {
            raw.kvr_k = true;
        }
        if rec.category_code == Some(layout::category::WNM as i64) {
            raw.kvr_v = true;
        }
    }
}

fn build_steering_event(rec: &CaptureRecord, band: Option<Band>) -> Option<SteeringEvent> {
    let kind = match rec.subtype {
        layout::subtype::ASSOC_REQUEST => SteeringEventKind::AssocRequest,
        layout::subtype::ASSOC_RESPONSE => SteeringEventKind::AssocResponse,
        layout::subtype::REASSOC_REQUEST => SteeringEventKind::ReassocRequest,
        layout::subtype::REASSOC_RESPONSE => SteeringEventKind::ReassocResponse,
        layout::subtype::DEAUTH => SteeringEventKind::Deauth,
        layout::subtype::DISASSOC => SteeringEventKind::Disassoc,
        layout::subtype::ACTION if rec.category_code == Some(layout::category::WNM as i64) => {
            if rec.action_code == Some(layout::action::BTM_REQUEST as i64) {
                SteeringEventKind::BtmRequest
            } else if rec.action_code == Some(layout::action::BTM_RESPONSE as i64) {
                SteeringEventKind::BtmResponse
            } else {
                return None;
            }
        }
        _ => return None,
    };

    let dir = direction::resolve(rec)?;
    let client_mac = dir.client?;

    let status_code = match kind {
        SteeringEventKind::AssocResponse | SteeringEventKind::ReassocResponse => rec.assoc_status_code,
        SteeringEventKind::BtmResponse => rec.btm_status_code,
        _ => None,
    };
    let reason_code = match kind {
        SteeringEventKind::Deauth | SteeringEventKind::Disassoc => rec.reason_code,
        _ => None,
    };

    Some(SteeringEvent {
        timestamp: rec.timestamp,
        kind,
        client_mac,
        ap_mac: dir.ap,
        bssid: rec.bssid.clone(),
        band,
        frequency: rec.frequency,
        rssi: rec.rssi,
        status_code,
        reason_code,
        sa: rec.sa.clone(),
        da: rec.da.clone(),
    })
}

/// Uniformly downsamples `samples` to at most `cap` points, preserving
/// chronological order.
fn downsample(samples: Vec<SignalSample>, cap: usize) -> Vec<SignalSample> {
    if samples.len() <= cap || cap == 0 {
        return samples;
    }
    let step = samples.len() as f64 / cap as f64;
    let mut out = Vec::with_capacity(cap);
    let mut idx = 0.0f64;
    for _ in 0..cap {
        let i = idx.floor() as usize;
        if let Some(sample) = samples.get(i) {
            out.push(sample.clone());
        }
        idx += step;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec() -> CaptureRecord {
        CaptureRecord {
            timestamp: 0.0,
            subtype: 0,
            bssid: None,
            sa: None,
            da: None,
            frequency: None,
            rssi: None,
            ssid: None,
            reason_code: None,
            category_code: None,
            action_code: None,
            btm_status_code: None,
            assoc_status_code: None,
            frame_len: 0,
            protocols: "wlan_radio:wlan:wlan_mgt".into(),
        }
    }

    #[test]
    fn counts_btm_accept_and_reject() {
        let mut req = rec();
        req.subtype = layout::subtype::ACTION;
        req.category_code = Some(10);
        req.action_code = Some(7);
        req.sa = Some("aa:aa:aa:aa:aa:aa".into());
        req.da = Some("11:22:33:44:55:66".into());

        let mut resp = rec();
        resp.subtype = layout::subtype::ACTION;
        resp.category_code = Some(10);
        resp.action_code = Some(8);
        resp.sa = Some("11:22:33:44:55:66".into());
        resp.da = Some("aa:aa:aa:aa:aa:aa".into());
        resp.btm_status_code = Some(0);

        let records = vec![req, resp];
        let config = EngineConfig::default();
        let out = aggregate(&records, "11:22:33:44:55:66", &config);
        assert_eq!(out.raw.btm_requests, 1);
        assert_eq!(out.raw.btm_responses, 1);
        assert_eq!(out.raw.btm_accept, 1);
        assert_eq!(out.btm_events.len(), 2);
    }

    #[test]
    fn flags_bssid_band_mismatch() {
        let mut a = rec();
        a.bssid = Some("aa:aa:aa:aa:aa:aa".into());
        a.frequency = Some(2442.0);
        let mut b = rec();
        b.bssid = Some("aa:aa:aa:aa:aa:aa".into());
        b.frequency = Some(5180.0);

        let config = EngineConfig::default();
        let out = aggregate(&[a, b], "11:22:33:44:55:66", &config);
        assert_eq!(out.raw.band_mismatches.len(), 1);
    }

    #[test]
    fn downsamples_to_cap() {
        let samples: Vec<SignalSample> = (0..1000)
            .map(|i| SignalSample {
                timestamp: i as f64,
                rssi: -50.0,
                band: Band::Band24,
                sa: Some("x".into()),
                da: None,
            })
            .collect();
        let out = downsample(samples, 500);
        assert_eq!(out.len(), 500);
    }
}
