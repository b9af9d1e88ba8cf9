//! Direction resolution: for a given record, which MAC is the client and
//! which is the AP. Pure, no state — the rules in SPEC_FULL.md §4.5,
//! keyed entirely off subtype/action.

use crate::dissector::{layout, CaptureRecord};

/// Resolved (client, AP) pair for a record. Either side may be `None` when
/// the frame carries no client role (e.g. a beacon).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Direction {
    pub client: Option<String>,
    pub ap: Option<String>,
}

/// Resolves the client/AP roles for one record, or `None` for frame types
/// that carry no client (beacons, unrecognized subtypes).
pub fn resolve(rec: &CaptureRecord) -> Option<Direction> {
    match rec.subtype {
        layout::subtype::ASSOC_REQUEST | layout::subtype::REASSOC_REQUEST => Some(Direction {
            client: rec.sa.clone(),
            ap: rec.da.clone(),
        }),
        layout::subtype::ASSOC_RESPONSE | layout::subtype::REASSOC_RESPONSE => Some(Direction {
            client: rec.da.clone(),
            ap: rec.sa.clone().or_else(|| rec.bssid.clone()),
        }),
        layout::subtype::BEACON => None,
        layout::subtype::DISASSOC | layout::subtype::DEAUTH => {
            let sa_is_bssid = match (rec.sa.as_deref(), rec.bssid.as_deref()) {
                (Some(sa), Some(bssid)) => sa.eq_ignore_ascii_case(bssid),
                _ => false,
            };
            if sa_is_bssid {
                Some(Direction {
                    client: rec.da.clone(),
                    ap: rec.sa.clone(),
                })
            } else {
                Some(Direction {
                    client: rec.sa.clone(),
                    ap: rec.da.clone(),
                })
            }
        }
        layout::subtype::ACTION => {
            if rec.action_code == Some(layout::action::BTM_RESPONSE as i64) {
                Some(Direction {
                    client: rec.sa.clone(),
                    ap: rec.da.clone(),
                })
            } else {
                Some(Direction {
                    client: rec.da.clone(),
                    ap: rec.sa.clone(),
                })
            }
        }
        _ => None,
    }
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
            protocols: "wlan".into(),
        }
    }

    #[test]
    fn assoc_request_client_is_sender() {
        let r = CaptureRecord {
            subtype: layout::subtype::ASSOC_REQUEST,
            sa: Some("11:22:33:44:55:66".into()),
            da: Some("aa:aa:aa:aa:aa:aa".into()),
            ..rec()
        };
        let d = resolve(&r).unwrap();
        assert_eq!(d.client.as_deref(), Some("11:22:33:44:55:66"));
        assert_eq!(d.ap.as_deref(), Some("aa:aa:aa:aa:aa:aa"));
    }

    #[test]
    fn deauth_from_bssid_targets_client() {
        let r = CaptureRecord {
            subtype: layout::subtype::DEAUTH,
            sa: Some("aa:aa:aa:aa:aa:aa".into()),
            da: Some("11:22:33:44:55:66".into()),
            bssid: Some("aa:aa:aa:aa:aa:aa".into()),
            ..rec()
        };
        let d = resolve(&r).unwrap();
        assert_eq!(d.client.as_deref(), Some("11:22:33:44:55:66"));
        assert_eq!(d.ap.as_deref(), Some("aa:aa:aa:aa:aa:aa"));
    }

    #[test]
    fn deauth_from_client_targets_ap() {
        let r = CaptureRecord {
            subtype: layout::subtype::DEAUTH,
            sa: Some("11:22:33:44:55:66".into()),
            da: Some("aa:aa:aa:aa:aa:aa".into()),
            bssid: Some("aa:aa:aa:aa:aa:aa".into()),
            ..rec()
        };
        let d = resolve(&r).unwrap();
        assert_eq!(d.client.as_deref(), Some("11:22:33:44:55:66"));
        assert_eq!(d.ap.as_deref(), Some("aa:aa:aa:aa:aa:aa"));
    }

    #[test]
    fn btm_response_inverts_action_default() {
        let r = CaptureRecord {
            subtype: layout::subtype::ACTION,
            action_code: Some(layout::action::BTM_RESPONSE as i64),
            sa: Some("11:22:33:44:55:66".into()),
            da: Some("aa:aa:aa:aa:aa:aa".into()),
            ..rec()
        };
        let d = resolve(&r).unwrap();
        assert_eq!(d.client.as_deref(), Some("11:22:33:44:55:66"));
    }

    #[test]
    fn beacon_has_no_direction() {
        let r = CaptureRecord {
            subtype: layout::subtype::BEACON,
            ..rec()
        };
        assert!(resolve(&r).is_none());
    }
}
