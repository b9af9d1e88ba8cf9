//! Top-level orchestrator: wires C1 through C8 into one call.

use std::path::Path;
use std::time::Instant;

use uuid::Uuid;

use crate::aggregate::{self, AggregateOutput};
use crate::client;
use crate::compliance::{self, ComplianceCheck, KvrSupport, Verdict};
use crate::config::{EngineConfig, UserMetadata};
use crate::device::{self, DeviceHints, DeviceInfo};
use crate::dissector::{CaptureRecord, DissectorError, RecordSource, TsharkSource};
use crate::error::AnalysisError;
use crate::model::{BandSteeringAnalysis, WiresharkCompare};
use crate::steering;

/// Runs the full pipeline over `path` and returns the in-memory artifact.
/// Persistence (C8's disk write) is the caller's responsibility via
/// [`crate::persist::persist_analysis`] — this function never touches the
/// filesystem beyond reading the capture.
pub fn analyze_capture(
    path: &Path,
    metadata: &UserMetadata,
    config: &EngineConfig,
) -> Result<BandSteeringAnalysis, AnalysisError> {
    let started = Instant::now();

    let mut source = TsharkSource::spawn(&config.dissector_bin, path, config.dissector_timeout)?;
    let records = drain(&mut source)?;
    analyze_records(path, &records, metadata, config, started.elapsed().as_millis() as u64)
}

/// Runs C2 onward over an already-materialized record set. Split out from
/// [`analyze_capture`] so tests can drive the pipeline with a
/// [`crate::dissector::VecRecordSource`] instead of a real dissector.
pub fn analyze_records(
    path: &Path,
    records: &[CaptureRecord],
    metadata: &UserMetadata,
    config: &EngineConfig,
    analysis_duration_ms: u64,
) -> Result<BandSteeringAnalysis, AnalysisError> {
    if records.is_empty() {
        return Err(AnalysisError::InvalidCapture);
    }

    let selection = client::select_primary_client(records, metadata.client_mac.as_deref());
    let client_mac = selection.client_mac.clone();

    let aggregated = aggregate::aggregate(&records, &client_mac, config);
    let transitions = steering::build_transitions(&aggregated.steering_events, &client_mac);
    let preventive = steering::detect_preventive(&aggregated.raw);

    let compliance_checks = compliance::evaluate_checks(&aggregated.raw, &transitions);
    let verdict = compliance::determine_verdict(&compliance_checks, &transitions);
    let verdict = compliance::refine_verdict_with_rates(verdict, &aggregated.raw, &transitions, preventive);

    let device_info = resolve_device(&client_mac, metadata, path);

    let assembled = assemble(
        path,
        &aggregated,
        transitions,
        compliance_checks,
        verdict,
        vec![device_info],
        analysis_duration_ms,
    );

    Ok(assembled)
}

fn drain(source: &mut TsharkSource) -> Result<Vec<CaptureRecord>, DissectorError> {
    let mut records = Vec::new();
    while let Some(record) = source.next_record()? {
        records.push(record);
    }
    Ok(records)
}

fn resolve_device(client_mac: &str, metadata: &UserMetadata, path: &Path) -> DeviceInfo {
    let hints = DeviceHints {
        brand: metadata.device_brand.clone(),
        model: metadata.device_model.clone(),
    };
    let filename = path.file_name().and_then(|f| f.to_str());
    device::classify_device(client_mac, &hints, filename)
}

#[allow(clippy::too_many_arguments)]
fn assemble(
    path: &Path,
    aggregated: &AggregateOutput,
    transitions: Vec<crate::steering::SteeringTransition>,
    compliance_checks: Vec<ComplianceCheck>,
    verdict: Verdict,
    devices: Vec<DeviceInfo>,
    analysis_duration_ms: u64,
) -> BandSteeringAnalysis {
    let raw = &aggregated.raw;

    let successful_transitions_derived = transitions.iter().filter(|t| t.is_successful).count() as u64;
    let failed_transitions_derived = transitions.iter().filter(|t| !t.is_successful).count() as u64;
    let successful_transitions = successful_transitions_derived.max(raw.btm_accept);
    let failed_transitions = failed_transitions_derived;

    let loops_detected = transitions.iter().filter(|t| t.returned_to_original).count() as u64;

    let btm_success_rate = if raw.btm_responses > 0 {
        raw.btm_accept as f64 / raw.btm_responses as f64
    } else {
        0.0
    };

    let kvr_support = KvrSupport {
        k: raw.kvr_k,
        v: raw.kvr_v,
        r: raw.kvr_r,
    };

    let wireshark_compare = WiresharkCompare::build(
        raw,
        raw.btm_requests,
        raw.btm_responses,
        successful_transitions,
        failed_transitions,
    );

    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("capture")
        .to_string();

    let analysis_timestamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();

    BandSteeringAnalysis {
        analysis_id: Uuid::new_v4().to_string(),
        filename,
        analysis_timestamp,
        total_packets: raw.total_packets,
        wlan_packets: raw.wlan_packets,
        analysis_duration_ms,
        devices,
        btm_events: aggregated.btm_events.clone(),
        transitions,
        signal_samples: aggregated.signal_samples.clone(),
        btm_requests: raw.btm_requests,
        btm_responses: raw.btm_responses,
        btm_success_rate,
        successful_transitions,
        failed_transitions,
        loops_detected,
        kvr_support,
        compliance_checks,
        verdict,
        raw_stats: raw.clone(),
        wireshark_compare,
        original_file_path: path.display().to_string(),
        analysis_text: String::new(),
    }
}
