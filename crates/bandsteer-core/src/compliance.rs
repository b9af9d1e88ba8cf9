//! Compliance Evaluator (C7).
//!
//! Four checks, always run in order, always producing four entries — this
//! evaluator never raises; a missing counter degrades a check to `fail`
//! with diagnostic details instead (§7).

use serde::{Deserialize, Serialize};

use crate::aggregate::counters::RawStats;
use crate::deauth;
use crate::steering::{SteeringKind, SteeringTransition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Btm,
    Association,
    Performance,
    Kvr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// `EXCELLENT`/`GOOD` are legacy verdict spellings from the original
/// service; the engine tolerates them on read (older registries may still
/// have them on disk) but never emits them (§2a).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    #[serde(alias = "EXCELLENT", alias = "GOOD")]
    Success,
    Partial,
    Failed,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Success => "SUCCESS",
            Verdict::Partial => "PARTIAL",
            Verdict::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub name: String,
    pub category: CheckCategory,
    pub passed: bool,
    pub severity: Severity,
    pub details: String,
    pub recommendation: Option<String>,
}

/// 802.11k/v/r support flags, carried straight from [`RawStats`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct KvrSupport {
    pub k: bool,
    pub v: bool,
    pub r: bool,
}

/// Runs the four compliance checks over the raw counters and the
/// reconstructed transition set, in spec order.
pub fn evaluate_checks(raw: &RawStats, transitions: &[SteeringTransition]) -> Vec<ComplianceCheck> {
    vec![
        check_btm_support(raw),
        check_association(raw),
        check_effective_steering(raw, transitions),
        check_kvr_standards(raw),
    ]
}

fn check_btm_support(raw: &RawStats) -> ComplianceCheck {
    let name = "BTM Support (802.11v)".to_string();

    if raw.btm_requests == 0 && raw.btm_responses == 0 {
        return ComplianceCheck {
            name,
            category: CheckCategory::Btm,
            passed: false,
            severity: Severity::High,
            details: "BTM not observed".to_string(),
            recommendation: Some(
                "Verify the AP advertises 802.11v BSS Transition Management and that the client supports it."
                    .to_string(),
            ),
        };
    }

    if raw.btm_requests > 0 && raw.btm_responses == 0 {
        return ComplianceCheck {
            name,
            category: CheckCategory::Btm,
            passed: false,
            severity: Severity::High,
            details: "BTM requested but client did not reply".to_string(),
            recommendation: Some("Check client-side 802.11v support or RF conditions at request time.".to_string()),
        };
    }

    let passed = raw.btm_accept > 0;
    let status_descriptions: Vec<String> = raw
        .btm_status_codes
        .iter()
        .map(|code| format!("{code} ({})", btm_status_description(*code)))
        .collect();
    let details = format!(
        "BTM status codes observed: [{}]",
        status_descriptions.join(", ")
    );

    ComplianceCheck {
        name,
        category: CheckCategory::Btm,
        passed,
        severity: if passed { Severity::Low } else { Severity::High },
        details,
        recommendation: if passed {
            None
        } else {
            Some("Client replied to every BTM request without accepting; inspect candidate list quality.".to_string())
        },
    }
}

fn check_association(raw: &RawStats) -> ComplianceCheck {
    let name = "Association and Reassociation".to_string();
    let completed_cycle = raw.assoc_success > 0;
    let directed_nonzero = raw.client_directed_deauth_count > 0;

    let details = format!(
        "client-directed deauth/disassoc: {}, forced-to-client: {}, assoc successes: {}, assoc failures: {}",
        raw.client_directed_deauth_count,
        raw.client_directed_forced_count,
        raw.assoc_success,
        raw.assoc_failures.len(),
    );

    if !raw.assoc_failures.is_empty() {
        return ComplianceCheck {
            name,
            category: CheckCategory::Association,
            passed: false,
            severity: Severity::High,
            details,
            recommendation: Some(
                "Inspect association failure status codes; the client was explicitly refused.".to_string(),
            ),
        };
    }

    let passed = completed_cycle && !directed_nonzero;
    ComplianceCheck {
        name,
        category: CheckCategory::Association,
        passed,
        severity: if passed { Severity::Low } else { Severity::High },
        details,
        recommendation: if passed {
            None
        } else if !completed_cycle {
            Some("No completed association/reassociation cycle was observed for this client.".to_string())
        } else {
            Some("Client-directed deauth/disassoc frames were observed during this session.".to_string())
        },
    }
}

fn check_effective_steering(raw: &RawStats, transitions: &[SteeringTransition]) -> ComplianceCheck {
    let name = "Effective Steering".to_string();
    let band_change_count = transitions
        .iter()
        .filter(|t| t.is_successful && t.is_band_change)
        .count();
    let total_successful = transitions.iter().filter(|t| t.is_successful).count();
    let btm_accept = raw.btm_accept;

    let passed = band_change_count >= 2 || (band_change_count >= 1 && btm_accept > 0);
    let details = format!(
        "band-change-transitions: {band_change_count} | total-successful-transitions: {total_successful} | BTM-accept-count: {btm_accept}"
    );

    ComplianceCheck {
        name,
        category: CheckCategory::Performance,
        passed,
        severity: if passed { Severity::Low } else { Severity::Medium },
        details,
        recommendation: if passed {
            None
        } else {
            Some("No sustained physical band change was observed; a single BTM Accept alone is not effective steering.".to_string())
        },
    }
}

fn check_kvr_standards(raw: &RawStats) -> ComplianceCheck {
    let name = "KVR Standards".to_string();
    let passed = raw.kvr_k || raw.kvr_v || raw.kvr_r;
    ComplianceCheck {
        name,
        category: CheckCategory::Kvr,
        passed,
        severity: if passed { Severity::Low } else { Severity::Medium },
        details: format!("k={}, v={}, r={}", raw.kvr_k, raw.kvr_v, raw.kvr_r),
        recommendation: if passed {
            None
        } else {
            Some("Enable at least one of 802.11k/v/r on the infrastructure.".to_string())
        },
    }
}

fn btm_status_description(code: i64) -> &'static str {
    match code {
        0 => "Accept",
        1 => "Reject - Unspecified",
        2 => "Reject - Insufficient Beacon Report",
        3 => "Reject - Insufficient Capability",
        4 => "Reject - BSS Termination Undesired",
        5 => "Reject - BSS Termination Delay Requested",
        6 => "Reject - STA BSS Transition Candidate List Provided",
        7 => "Reject - No Suitable BSS Transition Candidates",
        8 => "Reject - Leaving ESS",
        _ => "Reserved/Unknown",
    }
}

/// Applies verdict rules 1-4 of the seven-rule cascade; rules 5-7 need raw
/// BTM rates and the preventive-steering flag and are applied afterward by
/// [`refine_verdict_with_rates`].
pub fn determine_verdict(checks: &[ComplianceCheck], transitions: &[SteeringTransition]) -> Verdict {
    let check = |name_category: CheckCategory| checks.iter().find(|c| c.category == name_category);

    let check1_btm = check(CheckCategory::Btm);
    let check2_assoc = check(CheckCategory::Association);
    let check3_steering = check(CheckCategory::Performance);

    if check2_assoc.is_some_and(|c| !c.passed) {
        return Verdict::Failed;
    }
    if check1_btm.is_some_and(|c| !c.passed) {
        return Verdict::Failed;
    }
    if check3_steering.is_some_and(|c| c.passed) {
        return Verdict::Success;
    }

    let any_successful_transition = transitions.iter().any(|t| t.is_successful);
    if any_successful_transition {
        return if check1_btm.is_some_and(|c| c.passed) {
            Verdict::Partial
        } else {
            Verdict::Failed
        };
    }

    Verdict::Failed
}

/// Rule 5/6 need the raw BTM accept/response counts directly (not just the
/// pass/fail bit), so the orchestrator calls this after
/// [`determine_verdict`] has already resolved rules 1-4.
pub fn refine_verdict_with_rates(verdict: Verdict, raw: &RawStats, transitions: &[SteeringTransition], preventive: bool) -> Verdict {
    if verdict != Verdict::Failed {
        return verdict;
    }

    let no_band_change = !transitions.iter().any(|t| t.is_successful && t.is_band_change);
    let btm_success_rate = if raw.btm_responses > 0 {
        raw.btm_accept as f64 / raw.btm_responses as f64
    } else {
        0.0
    };
    if raw.btm_accept > 0 && btm_success_rate > 0.5 && no_band_change {
        return Verdict::Partial;
    }

    if preventive {
        return Verdict::Success;
    }

    Verdict::Failed
}

/// Textual description table used by Check 1 details, exposed for C8's
/// narrative-text contract and for tests.
pub fn deauth_reason_description(reason_code: i64) -> String {
    deauth::reason_description(reason_code)
}
