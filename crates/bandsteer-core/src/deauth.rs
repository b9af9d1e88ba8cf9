//! Deauth Validator (C3).
//!
//! Pure functions shared by the aggregator (C5) and the steering state
//! machine (C6): every "was this client exiled, and was it voluntary"
//! decision in the engine goes through this module so the two components
//! never disagree.

/// Time window, in seconds, within which a reassociation is attributed to
/// a preceding deauth/disassoc or BTM request (C6).
pub const REASSOC_TIMEOUT_SECONDS: f64 = 15.0;

const GRACEFUL_REASONS: &[(i64, &str)] = &[
    (3, "STA is leaving (client-initiated)"),
    (4, "Disassociated due to inactivity"),
    (8, "Deauthenticated because of inactivity"),
    (32, "Disassociated due to inactivity"),
];

const FORCED_REASONS: &[(i64, &str)] = &[
    (1, "Unspecified reason (likely AP-initiated)"),
    (2, "Previous authentication no longer valid"),
    (5, "AP unable to handle all currently associated STAs (AP full)"),
    (6, "Class 2 frame received from nonauthenticated STA"),
    (7, "Class 3 frame received from nonassociated STA"),
    (15, "4-Way Handshake timeout"),
    (16, "Group Key Handshake timeout"),
    (17, "IE in 4-Way Handshake differs"),
    (24, "Invalid PMKID"),
    (25, "Invalid MDE"),
    (26, "Invalid FTE"),
    (33, "Disassociated due to lack of QoS resources"),
    (34, "Disassociated due to poor channel conditions"),
];

/// Outcome of classifying a deauth/disassoc event against a client MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeauthClass {
    Broadcast,
    DirectedToOther,
    Graceful,
    ForcedToClient,
    Unknown,
}

/// True for broadcast (`ff:ff:ff:ff:ff:ff`) or multicast (`01:00:5e:…`,
/// `33:33:…`) destination addresses.
///
/// # Examples
/// ```
/// use bandsteer_core::deauth::is_broadcast;
///
/// assert!(is_broadcast("ff:ff:ff:ff:ff:ff"));
/// assert!(is_broadcast("01:00:5e:00:00:01"));
/// assert!(!is_broadcast("11:22:33:44:55:66"));
/// ```
pub fn is_broadcast(da: &str) -> bool {
    let da = da.trim().to_ascii_lowercase();
    da == "ff:ff:ff:ff:ff:ff" || da.starts_with("01:00:5e") || da.starts_with("33:33")
}

/// True iff the frame involves `client_mac` as sender or receiver and the
/// destination is not broadcast/multicast.
///
/// # Examples
/// ```
/// use bandsteer_core::deauth::is_directed_to_client;
///
/// assert!(is_directed_to_client(Some("11:22:33:44:55:66"), Some("aa:aa:aa:aa:aa:aa"), "11:22:33:44:55:66"));
/// assert!(!is_directed_to_client(Some("ff:ff:ff:ff:ff:ff"), Some("aa:aa:aa:aa:aa:aa"), "11:22:33:44:55:66"));
/// ```
pub fn is_directed_to_client(da: Option<&str>, sa: Option<&str>, client_mac: &str) -> bool {
    let client = client_mac.trim().to_ascii_lowercase();
    if client.is_empty() {
        return false;
    }
    let da_norm = da.map(|v| v.trim().to_ascii_lowercase());
    let sa_norm = sa.map(|v| v.trim().to_ascii_lowercase());

    if let Some(da) = da_norm.as_deref() {
        if is_broadcast(da) {
            return false;
        }
        if da == client {
            return true;
        }
    }
    sa_norm.as_deref() == Some(client.as_str())
}

/// Classifies a reason code as forced (true) or graceful (false). Any code
/// outside the known graceful set — including unparsable codes — is
/// treated as forced: better a false positive than a false negative.
///
/// # Examples
/// ```
/// use bandsteer_core::deauth::is_forced;
///
/// assert!(!is_forced(3));
/// assert!(is_forced(5));
/// assert!(is_forced(9999));
/// ```
pub fn is_forced(reason_code: i64) -> bool {
    !GRACEFUL_REASONS.iter().any(|(code, _)| *code == reason_code)
}

/// Human-readable description of a reason code, for Check 1/Check 2
/// `details` text and diagnostics.
pub fn reason_description(reason_code: i64) -> String {
    if let Some((_, desc)) = GRACEFUL_REASONS.iter().find(|(code, _)| *code == reason_code) {
        return desc.to_string();
    }
    if let Some((_, desc)) = FORCED_REASONS.iter().find(|(code, _)| *code == reason_code) {
        return desc.to_string();
    }
    format!("Reserved/Unknown (0x{:04x})", reason_code & 0xffff)
}

/// Classifies a deauth/disassoc event into one of five closed categories.
///
/// If the client is the sender (voluntary departure), the result is always
/// `Graceful` regardless of the reason code — a client leaving on its own
/// initiative is never "forced", even when it reuses a reason code that
/// would otherwise read as forced.
///
/// # Examples
/// ```
/// use bandsteer_core::deauth::{classify, DeauthClass};
///
/// let class = classify(Some("11:22:33:44:55:66"), Some("aa:aa:aa:aa:aa:aa"), "11:22:33:44:55:66", 5);
/// assert_eq!(class, DeauthClass::ForcedToClient);
/// ```
pub fn classify(da: Option<&str>, sa: Option<&str>, client_mac: &str, reason_code: i64) -> DeauthClass {
    let da_norm = da.map(|v| v.trim().to_ascii_lowercase());
    let sa_norm = sa.map(|v| v.trim().to_ascii_lowercase());

    if let Some(da) = da_norm.as_deref() {
        if is_broadcast(da) {
            return DeauthClass::Broadcast;
        }
    }
    if da_norm.is_none() && sa_norm.is_none() {
        return DeauthClass::Unknown;
    }

    let client = client_mac.trim().to_ascii_lowercase();
    let client_is_receiver = da_norm.as_deref() == Some(client.as_str());
    let client_is_sender = sa_norm.as_deref() == Some(client.as_str());

    if !client_is_receiver && !client_is_sender {
        return DeauthClass::DirectedToOther;
    }

    if client_is_sender {
        return DeauthClass::Graceful;
    }

    if is_forced(reason_code) {
        DeauthClass::ForcedToClient
    } else {
        DeauthClass::Graceful
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_wins_even_with_client_as_sender() {
        let class = classify(
            Some("ff:ff:ff:ff:ff:ff"),
            Some("11:22:33:44:55:66"),
            "11:22:33:44:55:66",
            1,
        );
        assert_eq!(class, DeauthClass::Broadcast);
    }

    #[test]
    fn client_as_sender_is_always_graceful() {
        let class = classify(
            Some("aa:aa:aa:aa:aa:aa"),
            Some("11:22:33:44:55:66"),
            "11:22:33:44:55:66",
            5,
        );
        assert_eq!(class, DeauthClass::Graceful);
    }

    #[test]
    fn ap_to_client_with_forced_reason_is_forced() {
        let class = classify(
            Some("11:22:33:44:55:66"),
            Some("aa:aa:aa:aa:aa:aa"),
            "11:22:33:44:55:66",
            5,
        );
        assert_eq!(class, DeauthClass::ForcedToClient);
    }

    #[test]
    fn ap_to_client_with_graceful_reason_is_graceful() {
        let class = classify(
            Some("11:22:33:44:55:66"),
            Some("aa:aa:aa:aa:aa:aa"),
            "11:22:33:44:55:66",
            4,
        );
        assert_eq!(class, DeauthClass::Graceful);
    }

    #[test]
    fn unrelated_frame_is_directed_to_other() {
        let class = classify(
            Some("cc:cc:cc:cc:cc:cc"),
            Some("aa:aa:aa:aa:aa:aa"),
            "11:22:33:44:55:66",
            1,
        );
        assert_eq!(class, DeauthClass::DirectedToOther);
    }

    #[test]
    fn unknown_reason_code_is_conservatively_forced() {
        assert!(is_forced(250));
    }
}
