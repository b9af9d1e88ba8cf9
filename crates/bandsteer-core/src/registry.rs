//! Report Registry (C9).
//!
//! Reads query the persisted analysis tree directly and never lock
//! (§5 "multi-reader / single-writer"); deletes take the same
//! per-directory advisory lock [`crate::persist::persist_analysis`] uses
//! before touching the filesystem. Nothing here mutates an artifact in
//! place — deletions are whole-file removals (§3 Lifecycle).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compliance::Verdict;
use crate::config::EngineConfig;
use crate::dissector::Band;
use crate::error::PersistenceError;
use crate::model::BandSteeringAnalysis;
use crate::steering::SteeringTransition;

/// One analysis JSON file found under `config.analyses_dir`, with the path
/// it was read from (needed by delete operations to locate the companion
/// capture file and the per-directory lock).
struct Located {
    path: PathBuf,
    analysis: BandSteeringAnalysis,
}

fn walk_json_files(base: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk_json_files_into(base, &mut out);
    out
}

fn walk_json_files_into(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk_json_files_into(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            out.push(path);
        }
    }
}

fn load_all(config: &EngineConfig) -> Vec<Located> {
    walk_json_files(&config.analyses_dir)
        .into_iter()
        .filter_map(|path| {
            let bytes = fs::read(&path).ok()?;
            let analysis: BandSteeringAnalysis = serde_json::from_slice(&bytes).ok()?;
            Some(Located { path, analysis })
        })
        .collect()
}

fn sort_desc(entries: &mut [Located]) {
    entries.sort_by(|a, b| {
        b.analysis
            .analysis_timestamp
            .cmp(&a.analysis.analysis_timestamp)
            .then_with(|| b.analysis.analysis_id.cmp(&a.analysis.analysis_id))
    });
}

/// Lists every persisted analysis, sorted by `analysis_timestamp`
/// descending, ties broken by `analysis_id` descending.
pub fn list_all(config: &EngineConfig) -> Vec<BandSteeringAnalysis> {
    let mut entries = load_all(config);
    sort_desc(&mut entries);
    entries.into_iter().map(|e| e.analysis).collect()
}

/// Dumps the full registry as one JSON array (no pagination), in the same
/// order as [`list_all`].
pub fn export_all(config: &EngineConfig) -> Vec<BandSteeringAnalysis> {
    list_all(config)
}

/// Fetches a single analysis by `analysis_id`.
pub fn get_by_id(config: &EngineConfig, analysis_id: &str) -> Option<BandSteeringAnalysis> {
    load_all(config)
        .into_iter()
        .find(|e| e.analysis.analysis_id == analysis_id)
        .map(|e| e.analysis)
}

/// Deletes a single analysis (and its companion capture file, if present)
/// by id. Returns `true` if something was deleted.
pub fn delete_by_id(config: &EngineConfig, analysis_id: &str) -> Result<bool, PersistenceError> {
    let entries = load_all(config);
    let Some(located) = entries.into_iter().find(|e| e.analysis.analysis_id == analysis_id) else {
        return Ok(false);
    };
    delete_located(&located)?;
    Ok(true)
}

/// Deletes every analysis belonging to `vendor` (case-sensitive, matching
/// the stored `devices[0].vendor`). Returns the number deleted.
pub fn delete_by_vendor(config: &EngineConfig, vendor: &str) -> Result<u64, PersistenceError> {
    let entries = load_all(config);
    let mut count = 0u64;
    for located in entries.iter().filter(|e| {
        e.analysis
            .devices
            .first()
            .is_some_and(|d| d.vendor == vendor)
    }) {
        delete_located(located)?;
        count += 1;
    }
    Ok(count)
}

/// Deletes every analysis whose id is in `ids`. Returns the number deleted
/// (ids with no matching analysis are silently skipped).
pub fn delete_by_ids(config: &EngineConfig, ids: &[String]) -> Result<u64, PersistenceError> {
    let entries = load_all(config);
    let mut count = 0u64;
    for located in entries
        .iter()
        .filter(|e| ids.iter().any(|id| id == &e.analysis.analysis_id))
    {
        delete_located(located)?;
        count += 1;
    }
    Ok(count)
}

/// Deletes every persisted analysis. Returns the number deleted.
pub fn delete_all(config: &EngineConfig) -> Result<u64, PersistenceError> {
    let entries = load_all(config);
    let mut count = 0u64;
    for located in &entries {
        delete_located(located)?;
        count += 1;
    }
    Ok(count)
}

fn delete_located(located: &Located) -> Result<(), PersistenceError> {
    let dir = located
        .path
        .parent()
        .ok_or_else(|| PersistenceError::NotFound(located.analysis.analysis_id.clone()))?;
    let _guard = crate::persist::lock_directory(dir)?;

    for companion in companion_files(dir, &located.analysis.analysis_id) {
        fs::remove_file(&companion)?;
    }
    fs::remove_file(&located.path)?;
    Ok(())
}

fn companion_files(dir: &Path, analysis_id: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let prefix = format!("{analysis_id}_");
    entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix))
        })
        .collect()
}

/// Aggregate statistics over the whole registry (§2a `get_reports_stats`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub count: u64,
    pub verdict_distribution: HashMap<String, u64>,
    pub top_vendors: Vec<(String, u64)>,
    pub latest_capture_time: Option<String>,
    /// Fraction of analyses whose verdict reads as success — `SUCCESS` plus
    /// the legacy `EXCELLENT`/`GOOD` spellings tolerated on read.
    pub success_rate: f64,
}

/// Computes [`RegistryStats`] over every persisted analysis.
pub fn stats(config: &EngineConfig) -> RegistryStats {
    let all = list_all(config);
    let count = all.len() as u64;

    let mut verdict_distribution: HashMap<String, u64> = HashMap::new();
    let mut vendor_counts: HashMap<String, u64> = HashMap::new();
    let mut latest_capture_time: Option<String> = None;
    let mut successes = 0u64;

    for analysis in &all {
        *verdict_distribution
            .entry(analysis.verdict.to_string())
            .or_insert(0) += 1;
        if analysis.verdict == Verdict::Success {
            successes += 1;
        }
        if let Some(vendor) = analysis.devices.first().map(|d| d.vendor.clone()) {
            *vendor_counts.entry(vendor).or_insert(0) += 1;
        }
        latest_capture_time = match latest_capture_time {
            Some(current) if current >= analysis.analysis_timestamp => Some(current),
            _ => Some(analysis.analysis_timestamp.clone()),
        };
    }

    let mut top_vendors: Vec<(String, u64)> = vendor_counts.into_iter().collect();
    top_vendors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_vendors.truncate(3);

    let success_rate = if count > 0 {
        successes as f64 / count as f64
    } else {
        0.0
    };

    RegistryStats {
        count,
        verdict_distribution,
        top_vendors,
        latest_capture_time,
        success_rate,
    }
}

/// Per-band time and per-transition durations reconstructed from a single
/// stored analysis (§4.9 `_calculate_band_times`).
#[derive(Debug, Clone, PartialEq)]
pub struct BandTimes {
    pub time_2_4ghz: f64,
    pub time_5ghz: f64,
    pub transition_times: Vec<f64>,
}

/// A transition counts toward the band-time exclusion windows (and its own
/// duration is reported separately) only when it actually completed and
/// moved the client across a resolved band boundary.
fn valid_transitions(transitions: &[SteeringTransition]) -> Vec<&SteeringTransition> {
    transitions
        .iter()
        .filter(|t| {
            t.is_successful
                && t.is_band_change
                && matches!((t.from_band, t.to_band), (Some(a), Some(b)) if a != b)
        })
        .collect()
}

/// Computes [`BandTimes`] for `analysis`. Uses `signal_samples` as the
/// source of truth when present; falls back to a coarser
/// transition-bracketed estimate when C5 produced no samples at all.
pub fn band_times(analysis: &BandSteeringAnalysis) -> BandTimes {
    let valid = valid_transitions(&analysis.transitions);
    let transition_times: Vec<f64> = valid
        .iter()
        .map(|t| t.end_time - t.start_time)
        .filter(|d| *d > 0.0)
        .collect();

    let (time_24, time_5) = if !analysis.signal_samples.is_empty() {
        band_times_from_samples(analysis, &valid)
    } else if !valid.is_empty() {
        band_times_from_transitions_fallback(&valid)
    } else {
        (0.0, 0.0)
    };

    let span = observed_span(analysis);
    let total = time_24 + time_5 + transition_times.iter().sum::<f64>();
    let (time_24, time_5) = if span > 0.0 && total > span * 1.1 && (time_24 + time_5) > 0.0 {
        let scale = (span - transition_times.iter().sum::<f64>()).max(0.0) / (time_24 + time_5);
        (time_24 * scale, time_5 * scale)
    } else {
        (time_24, time_5)
    };

    BandTimes {
        time_2_4ghz: time_24,
        time_5ghz: time_5,
        transition_times,
    }
}

/// Groups consecutive same-band samples into intervals (new interval on a
/// band change or a >5s gap), then subtracts any overlap with a valid
/// transition window so that time is never double-counted.
fn band_times_from_samples(
    analysis: &BandSteeringAnalysis,
    valid: &[&SteeringTransition],
) -> (f64, f64) {
    const MAX_GAP_SECONDS: f64 = 5.0;

    let mut samples = analysis.signal_samples.clone();
    samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let mut intervals: Vec<(Band, f64, f64)> = Vec::new();
    for sample in &samples {
        match intervals.last_mut() {
            Some((band, _start, end)) if *band == sample.band && sample.timestamp - *end <= MAX_GAP_SECONDS => {
                *end = sample.timestamp;
            }
            _ => intervals.push((sample.band, sample.timestamp, sample.timestamp)),
        }
    }

    let mut time_24 = 0.0;
    let mut time_5 = 0.0;
    for (band, start, end) in intervals {
        let duration = subtract_transition_overlap(start, end, valid);
        match band {
            Band::Band24 => time_24 += duration,
            Band::Band5 => time_5 += duration,
        }
    }
    (time_24, time_5)
}

/// Subtracts the portion of `[start, end]` that overlaps any valid
/// transition window, so that transition time is attributed only to
/// `transition_times`, never double-counted into band time.
fn subtract_transition_overlap(start: f64, end: f64, valid: &[&SteeringTransition]) -> f64 {
    let mut remaining = (end - start).max(0.0);
    for t in valid {
        let overlap_start = start.max(t.start_time);
        let overlap_end = end.min(t.end_time);
        if overlap_end > overlap_start {
            remaining -= overlap_end - overlap_start;
        }
    }
    remaining.max(0.0)
}

/// When C5 produced no signal samples, attribute each inter-transition gap
/// to the band that was active before the gap (the earlier transition's
/// `to_band`).
fn band_times_from_transitions_fallback(valid: &[&SteeringTransition]) -> (f64, f64) {
    let mut sorted: Vec<&&SteeringTransition> = valid.iter().collect();
    sorted.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut time_24 = 0.0;
    let mut time_5 = 0.0;
    for pair in sorted.windows(2) {
        let prev = pair[0];
        let next = pair[1];
        let gap = (next.start_time - prev.end_time).max(0.0);
        match prev.to_band {
            Some(Band::Band24) => time_24 += gap,
            Some(Band::Band5) => time_5 += gap,
            None => {}
        }
    }
    (time_24, time_5)
}

fn observed_span(analysis: &BandSteeringAnalysis) -> f64 {
    let mut timestamps: Vec<f64> = analysis
        .signal_samples
        .iter()
        .map(|s| s.timestamp)
        .collect();
    for t in &analysis.transitions {
        timestamps.push(t.start_time);
        timestamps.push(t.end_time);
    }
    if timestamps.is_empty() {
        return 0.0;
    }
    let min = timestamps.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = timestamps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (max - min).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::SignalSample;
    use crate::compliance::{KvrSupport, Verdict};
    use crate::device::{DeviceCategory, DeviceInfo};
    use crate::model::WiresharkCompare;
    use crate::steering::SteeringKind;
    use tempfile::TempDir;

    fn sample_analysis(id: &str, vendor: &str, verdict: Verdict, timestamp: &str) -> BandSteeringAnalysis {
        BandSteeringAnalysis {
            analysis_id: id.to_string(),
            filename: "capture.pcapng".to_string(),
            analysis_timestamp: timestamp.to_string(),
            total_packets: 10,
            wlan_packets: 10,
            analysis_duration_ms: 5,
            devices: vec![DeviceInfo {
                mac_address: "11:22:33:44:55:66".to_string(),
                oui: "11:22:33".to_string(),
                vendor: vendor.to_string(),
                device_model: None,
                device_category: DeviceCategory::Mobile,
                is_virtual: false,
                confidence: 1.0,
            }],
            btm_events: vec![],
            transitions: vec![],
            signal_samples: vec![],
            btm_requests: 0,
            btm_responses: 0,
            btm_success_rate: 0.0,
            successful_transitions: 0,
            failed_transitions: 0,
            loops_detected: 0,
            kvr_support: KvrSupport::default(),
            compliance_checks: vec![],
            verdict,
            raw_stats: Default::default(),
            wireshark_compare: WiresharkCompare::build(&Default::default(), 0, 0, 0, 0),
            original_file_path: "capture.pcapng".to_string(),
            analysis_text: String::new(),
        }
    }

    fn write_fixture(config: &EngineConfig, vendor: &str, analysis: &BandSteeringAnalysis) -> PathBuf {
        let dir = config.analyses_dir.join(vendor).join("device");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{}.json", analysis.analysis_id));
        fs::write(&path, serde_json::to_vec_pretty(analysis).unwrap()).unwrap();
        path
    }

    #[test]
    fn list_all_sorts_by_timestamp_descending() {
        let temp = TempDir::new().unwrap();
        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");

        let older = sample_analysis("a", "Acme", Verdict::Success, "2026-01-01T00:00:00Z");
        let newer = sample_analysis("b", "Acme", Verdict::Failed, "2026-01-02T00:00:00Z");
        write_fixture(&config, "Acme", &older);
        write_fixture(&config, "Acme", &newer);

        let listed = list_all(&config);
        assert_eq!(listed[0].analysis_id, "b");
        assert_eq!(listed[1].analysis_id, "a");
    }

    #[test]
    fn get_by_id_finds_a_nested_analysis() {
        let temp = TempDir::new().unwrap();
        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");
        let analysis = sample_analysis("abc", "Acme", Verdict::Success, "2026-01-01T00:00:00Z");
        write_fixture(&config, "Acme", &analysis);

        let found = get_by_id(&config, "abc").expect("found");
        assert_eq!(found.analysis_id, "abc");
        assert!(get_by_id(&config, "missing").is_none());
    }

    #[test]
    fn delete_by_id_removes_json_and_companion_capture() {
        let temp = TempDir::new().unwrap();
        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");
        let analysis = sample_analysis("abc", "Acme", Verdict::Success, "2026-01-01T00:00:00Z");
        let json_path = write_fixture(&config, "Acme", &analysis);
        let companion = json_path.parent().unwrap().join("abc_capture.pcapng");
        fs::write(&companion, b"fake").unwrap();

        let deleted = delete_by_id(&config, "abc").unwrap();
        assert!(deleted);
        assert!(!json_path.exists());
        assert!(!companion.exists());
        assert!(!delete_by_id(&config, "abc").unwrap());
    }

    #[test]
    fn delete_by_vendor_only_removes_matching_vendor() {
        let temp = TempDir::new().unwrap();
        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");
        write_fixture(&config, "Acme", &sample_analysis("a", "Acme", Verdict::Success, "t1"));
        write_fixture(&config, "Other", &sample_analysis("b", "Other", Verdict::Success, "t2"));

        let count = delete_by_vendor(&config, "Acme").unwrap();
        assert_eq!(count, 1);
        assert_eq!(list_all(&config).len(), 1);
    }

    #[test]
    fn delete_by_ids_and_delete_all() {
        let temp = TempDir::new().unwrap();
        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");
        write_fixture(&config, "Acme", &sample_analysis("a", "Acme", Verdict::Success, "t1"));
        write_fixture(&config, "Acme", &sample_analysis("b", "Acme", Verdict::Success, "t2"));
        write_fixture(&config, "Acme", &sample_analysis("c", "Acme", Verdict::Success, "t3"));

        let count = delete_by_ids(&config, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(count, 2);
        assert_eq!(list_all(&config).len(), 1);

        let count = delete_all(&config).unwrap();
        assert_eq!(count, 1);
        assert_eq!(list_all(&config).len(), 0);
    }

    #[test]
    fn stats_counts_verdicts_and_top_vendors() {
        let temp = TempDir::new().unwrap();
        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");
        write_fixture(&config, "Acme", &sample_analysis("a", "Acme", Verdict::Success, "2026-01-01T00:00:00Z"));
        write_fixture(&config, "Acme", &sample_analysis("b", "Acme", Verdict::Failed, "2026-01-02T00:00:00Z"));
        write_fixture(&config, "Other", &sample_analysis("c", "Other", Verdict::Success, "2026-01-03T00:00:00Z"));

        let report = stats(&config);
        assert_eq!(report.count, 3);
        assert_eq!(report.verdict_distribution.get("SUCCESS"), Some(&2));
        assert_eq!(report.verdict_distribution.get("FAILED"), Some(&1));
        assert_eq!(report.top_vendors[0], ("Acme".to_string(), 2));
        assert_eq!(report.latest_capture_time.as_deref(), Some("2026-01-03T00:00:00Z"));
        assert!((report.success_rate - (2.0 / 3.0)).abs() < 1e-9);
    }

    fn transition(start: f64, end: f64, from: Band, to: Band, successful: bool) -> SteeringTransition {
        SteeringTransition {
            client_mac: "11:22:33:44:55:66".to_string(),
            kind: SteeringKind::Assisted,
            start_time: start,
            end_time: end,
            duration: end - start,
            from_bssid: Some("aa:aa:aa:aa:aa:aa".to_string()),
            to_bssid: Some("bb:bb:bb:bb:bb:bb".to_string()),
            from_band: Some(from),
            to_band: Some(to),
            is_band_change: from != to,
            is_successful: successful,
            reason_code: None,
            returned_to_original: false,
        }
    }

    fn signal(ts: f64, band: Band) -> SignalSample {
        SignalSample {
            timestamp: ts,
            rssi: -50.0,
            band,
            sa: Some("11:22:33:44:55:66".to_string()),
            da: None,
        }
    }

    #[test]
    fn band_times_excludes_transition_window_from_sample_intervals() {
        let mut analysis = sample_analysis("a", "Acme", Verdict::Success, "t");
        analysis.signal_samples = vec![
            signal(0.0, Band::Band5),
            signal(1.0, Band::Band5),
            signal(2.0, Band::Band24),
            signal(3.0, Band::Band24),
        ];
        analysis.transitions = vec![transition(1.0, 2.0, Band::Band5, Band::Band24, true)];

        let times = band_times(&analysis);
        assert_eq!(times.transition_times, vec![1.0]);
        assert!(times.time_5ghz <= 1.0);
        assert!(times.time_2_4ghz <= 1.0);
    }

    #[test]
    fn band_times_falls_back_to_transition_brackets_without_samples() {
        let mut analysis = sample_analysis("a", "Acme", Verdict::Success, "t");
        analysis.transitions = vec![
            transition(0.0, 1.0, Band::Band5, Band::Band24, true),
            transition(10.0, 11.0, Band::Band24, Band::Band5, true),
        ];

        let times = band_times(&analysis);
        assert_eq!(times.transition_times, vec![1.0, 1.0]);
        assert!((times.time_2_4ghz - 9.0).abs() < 1e-9);
        assert_eq!(times.time_5ghz, 0.0);
    }

    #[test]
    fn band_times_empty_analysis_is_zero() {
        let analysis = sample_analysis("a", "Acme", Verdict::Success, "t");
        let times = band_times(&analysis);
        assert_eq!(times.time_2_4ghz, 0.0);
        assert_eq!(times.time_5ghz, 0.0);
        assert!(times.transition_times.is_empty());
    }
}
