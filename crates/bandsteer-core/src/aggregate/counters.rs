//! Raw counters, the source of truth for C7's checks and C8's
//! `raw_stats`/`wireshark_compare` block. Nothing here is ever revised by
//! downstream components; C6/C7 may only refine what they report, never
//! contradict these numbers (§2).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn top_n(counts: &HashMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

/// Association/reassociation failure record kept for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssocFailure {
    pub timestamp: f64,
    pub bssid: Option<String>,
    pub status_code: Option<i64>,
}

/// Single-pass counters over the whole capture. `update` is called once
/// per record by [`super::aggregate`]; everything else is read-only
/// derived data (`top_protocols`, etc.) computed after the pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStats {
    pub total_packets: u64,
    pub wlan_packets: u64,

    pub protocol_counts: HashMap<String, u64>,
    pub source_counts: HashMap<String, u64>,
    pub destination_counts: HashMap<String, u64>,

    pub beacons_24: u64,
    pub beacons_5: u64,
    pub probe_requests_24: u64,
    pub probe_requests_5: u64,
    pub probe_responses_24: u64,
    pub probe_responses_5: u64,
    pub data_24: u64,
    pub data_5: u64,

    pub btm_requests: u64,
    pub btm_responses: u64,
    pub btm_accept: u64,
    pub btm_reject: u64,
    pub btm_status_codes: Vec<i64>,

    pub assoc_requests: u64,
    pub reassoc_requests: u64,
    pub assoc_responses: u64,
    pub reassoc_responses: u64,
    pub assoc_success: u64,
    pub assoc_failures: Vec<AssocFailure>,

    pub deauth_count: u64,
    pub disassoc_count: u64,
    pub deauth_reason_codes: Vec<i64>,

    pub client_directed_deauth_count: u64,
    pub client_directed_forced_count: u64,

    pub kvr_k: bool,
    pub kvr_v: bool,
    pub kvr_r: bool,

    /// Diagnostic records for I5: a BSSID observed on conflicting bands.
    pub band_mismatches: Vec<String>,
}

impl RawStats {
    pub fn probe_requests(&self) -> u64 {
        self.probe_requests_24 + self.probe_requests_5
    }

    pub fn probe_responses(&self) -> u64 {
        self.probe_responses_24 + self.probe_responses_5
    }

    pub fn total_data(&self) -> u64 {
        self.data_24 + self.data_5
    }
}

impl RawStats {
    pub fn top_protocols(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.protocol_counts, n)
    }

    pub fn top_sources(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.source_counts, n)
    }

    pub fn top_destinations(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.destination_counts, n)
    }

    pub fn bump_protocol(&mut self, protocols: &str) {
        if protocols.is_empty() {
            return;
        }
        *self.protocol_counts.entry(protocols.to_string()).or_insert(0) += 1;
    }

    pub fn bump_source(&mut self, mac: Option<&str>) {
        if let Some(mac) = mac {
            *self.source_counts.entry(mac.to_string()).or_insert(0) += 1;
        }
    }

    pub fn bump_destination(&mut self, mac: Option<&str>) {
        if let Some(mac) = mac {
            *self.destination_counts.entry(mac.to_string()).or_insert(0) += 1;
        }
    }

    pub fn record_btm_status(&mut self, status: i64) {
        if !self.btm_status_codes.contains(&status) {
            self.btm_status_codes.push(status);
        }
    }

    pub fn record_deauth_reason(&mut self, reason: i64) {
        if !self.deauth_reason_codes.contains(&reason) {
            self.deauth_reason_codes.push(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_n_breaks_ties_alphabetically() {
        let mut counts = HashMap::new();
        counts.insert("b".to_string(), 2);
        counts.insert("a".to_string(), 2);
        counts.insert("c".to_string(), 1);
        let top = top_n(&counts, 2);
        assert_eq!(top, vec![("a".to_string(), 2), ("b".to_string(), 2)]);
    }

    #[test]
    fn status_and_reason_dedup() {
        let mut stats = RawStats::default();
        stats.record_btm_status(0);
        stats.record_btm_status(0);
        stats.record_btm_status(1);
        assert_eq!(stats.btm_status_codes, vec![0, 1]);
    }
}
