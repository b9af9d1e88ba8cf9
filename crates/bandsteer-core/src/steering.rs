//! Steering State Machine (C6).
//!
//! Consumes the chronological [`SteeringEvent`] union produced by C5 for the
//! primary client only and reconstructs [`SteeringTransition`] records —
//! never touching the input events themselves (Design Note "Ownership of
//! events").

use serde::{Deserialize, Serialize};

use crate::aggregate::counters::RawStats;
use crate::aggregate::{SteeringEvent, SteeringEventKind};
use crate::deauth::{self, DeauthClass, REASSOC_TIMEOUT_SECONDS};
use crate::dissector::Band;

/// Closed classification of how a transition came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SteeringKind {
    Aggressive,
    Assisted,
    Unknown,
    Preventive,
}

/// One reconstructed band-steering transition for the primary client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringTransition {
    pub client_mac: String,
    pub kind: SteeringKind,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    pub from_bssid: Option<String>,
    pub to_bssid: Option<String>,
    pub from_band: Option<Band>,
    pub to_band: Option<Band>,
    pub is_band_change: bool,
    pub is_successful: bool,
    pub reason_code: Option<i64>,
    pub returned_to_original: bool,
}

struct StartNode {
    timestamp: f64,
    bssid: Option<String>,
    band: Option<Band>,
    reason_code: Option<i64>,
    kind: SteeringKind,
}

/// Builds the transition timeline for `client_mac` out of `events`, which
/// may contain frames resolved to other MACs — those are filtered here.
pub fn build_transitions(events: &[SteeringEvent], client_mac: &str) -> Vec<SteeringTransition> {
    let mut client_events: Vec<&SteeringEvent> = events
        .iter()
        .filter(|e| e.client_mac.eq_ignore_ascii_case(client_mac))
        .collect();
    client_events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut transitions = Vec::new();
    let mut last_btm_req: Option<&SteeringEvent> = None;
    let mut last_deauth: Option<&SteeringEvent> = None;
    let mut current_bssid: Option<String> = None;
    let mut current_band: Option<Band> = None;
    let mut prior_bssid: Option<String> = None;

    for event in client_events {
        match event.kind {
            SteeringEventKind::BtmRequest => {
                last_btm_req = Some(event);
            }
            SteeringEventKind::Deauth | SteeringEventKind::Disassoc => {
                let class = deauth::classify(
                    event.da.as_deref(),
                    event.sa.as_deref(),
                    client_mac,
                    event.reason_code.unwrap_or(1),
                );
                if class == DeauthClass::ForcedToClient {
                    last_deauth = Some(event);
                }
            }
            SteeringEventKind::AssocResponse | SteeringEventKind::ReassocResponse => {
                let is_successful = event.status_code == Some(0);
                let start = pick_start_node(last_deauth, last_btm_req, event.timestamp);

                if is_successful || start.is_some() {
                    let (kind, start_time, from_bssid, from_band, reason_code) = match &start {
                        Some(node) => (
                            node.kind,
                            node.timestamp,
                            node.bssid.clone(),
                            node.band,
                            node.reason_code,
                        ),
                        None => (
                            SteeringKind::Unknown,
                            event.timestamp,
                            current_bssid.clone(),
                            current_band,
                            None,
                        ),
                    };

                    let to_bssid = event.bssid.clone();
                    let to_band = event.band;
                    let is_band_change = match (from_band, to_band) {
                        (Some(a), Some(b)) => a != b,
                        _ => false,
                    };
                    let returned_to_original =
                        prior_bssid.is_some() && prior_bssid == to_bssid && to_bssid != from_bssid;

                    transitions.push(SteeringTransition {
                        client_mac: client_mac.to_string(),
                        kind,
                        start_time,
                        end_time: event.timestamp,
                        duration: (event.timestamp - start_time).max(0.0),
                        from_bssid,
                        to_bssid: to_bssid.clone(),
                        from_band,
                        to_band,
                        is_band_change,
                        is_successful,
                        reason_code,
                        returned_to_original,
                    });

                    if is_successful {
                        prior_bssid = current_bssid.take();
                        current_bssid = to_bssid;
                        current_band = to_band;
                    }
                }

                last_deauth = None;
            }
            _ => {}
        }
    }

    force_band_change_on_consecutive_moves(&mut transitions);
    transitions
}

fn pick_start_node<'a>(
    last_deauth: Option<&'a SteeringEvent>,
    last_btm_req: Option<&'a SteeringEvent>,
    now: f64,
) -> Option<StartNode> {
    if let Some(deauth) = last_deauth {
        if now - deauth.timestamp < REASSOC_TIMEOUT_SECONDS && now >= deauth.timestamp {
            return Some(StartNode {
                timestamp: deauth.timestamp,
                bssid: deauth.bssid.clone(),
                band: deauth.band,
                reason_code: deauth.reason_code,
                kind: SteeringKind::Aggressive,
            });
        }
    }
    if let Some(req) = last_btm_req {
        if now - req.timestamp < REASSOC_TIMEOUT_SECONDS && now >= req.timestamp {
            return Some(StartNode {
                timestamp: req.timestamp,
                bssid: req.bssid.clone(),
                band: req.band,
                reason_code: None,
                kind: SteeringKind::Assisted,
            });
        }
    }
    None
}

/// When consecutive transitions land on different bands, the later one is
/// forced `is_band_change = true` even if its own from/to pair alone
/// wouldn't indicate a change — this is what lets the caller see that
/// physical band movement happened across a run of transitions.
fn force_band_change_on_consecutive_moves(transitions: &mut [SteeringTransition]) {
    for i in 1..transitions.len() {
        let prev_to_band = transitions[i - 1].to_band;
        let curr_to_band = transitions[i].to_band;
        if let (Some(prev), Some(curr)) = (prev_to_band, curr_to_band) {
            if prev != curr {
                transitions[i].is_band_change = true;
            }
        }
    }
}

/// Preventive steering: traffic concentrated on 5GHz with no observed
/// steering frames at all, implying the AP suppressed 2.4GHz outright.
pub fn detect_preventive(raw: &RawStats) -> bool {
    let total_data = raw.total_data();
    raw.beacons_24 > 0 && total_data >= 10 && (raw.data_5 as f64 / total_data as f64) > 0.90
}
