//! Primary-Client Selector (C4).
//!
//! Picks the MAC address of the device under analysis from the evidence in
//! the capture, or from a user-supplied hint. Runs before the full C5 pass;
//! it only needs the BSSID set and a handful of per-frame weights, so it
//! does its own single pass over the record slice rather than waiting on C5.

use std::collections::{HashMap, HashSet};

use crate::dissector::{layout, CaptureRecord};

/// Result of client selection: the resolved MAC, and an optional warning
/// when a user-supplied hint collided with a known BSSID.
#[derive(Debug, Clone)]
pub struct ClientSelection {
    pub client_mac: String,
    pub warning: Option<String>,
}

/// Selects the primary client MAC from `records`, honoring `hint` when it
/// is a well-formed unicast MAC.
///
/// A hint that resolves to a known BSSID is still used — user intent is
/// respected — but a warning is attached so the caller can surface it.
/// Without a usable hint, falls back to weighted evidence: BTM response
/// sender (+8, a BTM response is sent by the station), association/
/// reassociation request sender (+2 and +5 respectively... see component
/// weights below), RSSI-bearing sender (+2), any other appearance (+1).
/// BSSIDs are never eligible candidates.
///
/// # Examples
/// ```
/// use bandsteer_core::client::select_primary_client;
/// use bandsteer_core::CaptureRecord;
///
/// fn rec() -> CaptureRecord {
///     CaptureRecord {
///         timestamp: 0.0,
///         subtype: 0,
///         bssid: None,
///         sa: None,
///         da: None,
///         frequency: None,
///         rssi: None,
///         ssid: None,
///         reason_code: None,
///         category_code: None,
///         action_code: None,
///         btm_status_code: None,
///         assoc_status_code: None,
///         frame_len: 0,
///         protocols: "wlan".into(),
///     }
/// }
///
/// let records = vec![CaptureRecord {
///     sa: Some("11:22:33:44:55:66".into()),
///     bssid: Some("aa:aa:aa:aa:aa:aa".into()),
///     subtype: 0,
///     ..rec()
/// }];
/// let selection = select_primary_client(&records, None);
/// assert_eq!(selection.client_mac, "11:22:33:44:55:66");
/// ```
pub fn select_primary_client(records: &[CaptureRecord], hint: Option<&str>) -> ClientSelection {
    let bssids: HashSet<String> = records
        .iter()
        .filter_map(|r| r.bssid.as_deref())
        .map(str::to_ascii_lowercase)
        .collect();

    if let Some(hint) = hint {
        let normalized = hint.trim().to_ascii_lowercase();
        if is_unicast_mac(&normalized) {
            let warning = if bssids.contains(&normalized) {
                Some(format!(
                    "client_mac hint {normalized} matches a known BSSID; using it anyway"
                ))
            } else {
                None
            };
            return ClientSelection {
                client_mac: normalized,
                warning,
            };
        }
    }

    let mut scores: HashMap<String, i64> = HashMap::new();

    for rec in records {
        let is_btm_response = rec.action_code == Some(layout::action::BTM_RESPONSE as i64)
            && rec.category_code == Some(layout::category::WNM as i64);
        let is_assoc_or_reassoc_request = matches!(
            rec.subtype,
            layout::subtype::ASSOC_REQUEST | layout::subtype::REASSOC_REQUEST
        );

        if is_btm_response {
            bump(&mut scores, rec.sa.as_deref(), 8, &bssids);
            continue;
        }
        if is_assoc_or_reassoc_request {
            bump(&mut scores, rec.sa.as_deref(), 5, &bssids);
            continue;
        }
        if rec.rssi.is_some() {
            bump(&mut scores, rec.sa.as_deref(), 2, &bssids);
            continue;
        }
        bump(&mut scores, rec.sa.as_deref(), 1, &bssids);
        bump(&mut scores, rec.da.as_deref(), 1, &bssids);
    }

    match scores
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0).reverse()))
    {
        Some((mac, _)) => ClientSelection {
            client_mac: mac,
            warning: None,
        },
        None => ClientSelection {
            client_mac: "00:00:00:00:00:00".to_string(),
            warning: Some("no candidate client MAC found in capture".to_string()),
        },
    }
}

fn bump(scores: &mut HashMap<String, i64>, mac: Option<&str>, weight: i64, bssids: &HashSet<String>) {
    let Some(mac) = mac else { return };
    let mac = mac.trim().to_ascii_lowercase();
    if mac.is_empty() || bssids.contains(&mac) {
        return;
    }
    *scores.entry(mac).or_insert(0) += weight;
}

fn is_unicast_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    if !parts.iter().all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit())) {
        return false;
    }
    let Ok(first) = u8::from_str_radix(parts[0], 16) else {
        return false;
    };
    first & 0x01 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(sa: Option<&str>, da: Option<&str>, bssid: Option<&str>) -> CaptureRecord {
        CaptureRecord {
            timestamp: 0.0,
            subtype: 0,
            bssid: bssid.map(String::from),
            sa: sa.map(String::from),
            da: da.map(String::from),
            frequency: None,
            rssi: None,
            ssid: None,
            reason_code: None,
            category_code: None,
            action_code: None,
            btm_status_code: None,
            assoc_status_code: None,
            frame_len: 0,
            protocols: "wlan".into(),
        }
    }

    #[test]
    fn valid_hint_wins_outright() {
        let records = vec![rec(Some("11:22:33:44:55:66"), None, Some("aa:aa:aa:aa:aa:aa"))];
        let selection = select_primary_client(&records, Some("99:88:77:66:55:44"));
        assert_eq!(selection.client_mac, "99:88:77:66:55:44");
        assert!(selection.warning.is_none());
    }

    #[test]
    fn hint_matching_a_bssid_is_used_with_warning() {
        let records = vec![rec(None, None, Some("aa:aa:aa:aa:aa:aa"))];
        let selection = select_primary_client(&records, Some("aa:aa:aa:aa:aa:aa"));
        assert_eq!(selection.client_mac, "aa:aa:aa:aa:aa:aa");
        assert!(selection.warning.is_some());
    }

    #[test]
    fn bssids_are_never_candidates() {
        let mut records = vec![rec(Some("aa:aa:aa:aa:aa:aa"), None, Some("aa:aa:aa:aa:aa:aa"))];
        records.push(rec(Some("11:22:33:44:55:66"), None, Some("aa:aa:aa:aa:aa:aa")));
        let selection = select_primary_client(&records, None);
        assert_eq!(selection.client_mac, "11:22:33:44:55:66");
    }

    #[test]
    fn btm_response_sender_outweighs_plain_appearances() {
        let mut records: Vec<CaptureRecord> = (0..3)
            .map(|_| rec(Some("cc:cc:cc:cc:cc:cc"), Some("dd:dd:dd:dd:dd:dd"), None))
            .collect();
        let mut btm = rec(Some("11:22:33:44:55:66"), Some("aa:aa:aa:aa:aa:aa"), None);
        btm.action_code = Some(8);
        btm.category_code = Some(10);
        records.push(btm);
        let selection = select_primary_client(&records, None);
        assert_eq!(selection.client_mac, "11:22:33:44:55:66");
    }

    #[test]
    fn empty_capture_yields_placeholder_with_warning() {
        let selection = select_primary_client(&[], None);
        assert!(selection.warning.is_some());
    }
}
