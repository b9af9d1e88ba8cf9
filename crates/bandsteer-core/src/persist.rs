//! Analysis Assembler & Persistence (C8), write half.
//!
//! [`crate::analyze::analyze_capture`] only builds the in-memory artifact;
//! this module owns the on-disk side: directory layout, the advisory
//! per-directory lock (§5), and the atomic JSON write.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;

use crate::config::EngineConfig;
use crate::error::PersistenceError;
use crate::model::BandSteeringAnalysis;

/// Length of a UUID string (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`), used to
/// recognize and strip an already-UUID-prefixed filename before copying the
/// capture alongside its artifact (§4.8). Distinct from the classifier's
/// more lenient `>= 32` filename-inference filter — see DESIGN.md.
const UUID_PREFIX_LEN: usize = 36;

/// Writes `analysis` and a copy of the original capture under
/// `{analyses_dir}/{vendor_slug}/{device_slug}/`, returning the JSON path.
///
/// Directory creation is idempotent. The write takes the advisory
/// per-directory lock described in §5 before touching the filesystem, and
/// releases it once both files have landed.
pub fn persist_analysis(
    analysis: &BandSteeringAnalysis,
    capture_path: &Path,
    config: &EngineConfig,
) -> Result<PathBuf, PersistenceError> {
    let device = analysis
        .devices
        .first()
        .expect("analyze_records always resolves exactly one device for the primary client");

    let target_dir = target_directory(&config.analyses_dir, &device.vendor, device);
    fs::create_dir_all(&target_dir)?;

    let _guard = lock_directory(&target_dir)?;

    let json_path = target_dir.join(format!("{}.json", analysis.analysis_id));
    let json = serde_json::to_string_pretty(analysis)?;
    write_atomic(&json_path, json.as_bytes())?;

    if capture_path.is_file() {
        let stripped = strip_uuid_prefix(&file_name_or(capture_path, &analysis.filename));
        let dest = target_dir.join(format!("{}_{}", analysis.analysis_id, stripped));
        fs::copy(capture_path, &dest)?;
    }

    Ok(json_path)
}

/// `{vendor}/{model-or-mac}` as named by §4.8 (ported from
/// `_save_analysis_result`'s `device_id` rule in the original service).
fn target_directory(base: &Path, vendor: &str, device: &crate::device::DeviceInfo) -> PathBuf {
    let vendor_slug = vendor.replace(' ', "_");
    let device_slug = match device.device_model.as_deref() {
        Some(model) if !model.trim().is_empty() => model.replace(' ', "_"),
        _ => device.mac_address.replace(':', ""),
    };
    base.join(vendor_slug).join(device_slug)
}

fn file_name_or<'a>(path: &'a Path, fallback: &'a str) -> std::borrow::Cow<'a, str> {
    match path.file_name().and_then(|f| f.to_str()) {
        Some(name) => std::borrow::Cow::Borrowed(name),
        None => std::borrow::Cow::Borrowed(fallback),
    }
}

fn strip_uuid_prefix(filename: &str) -> &str {
    match filename.split_once('_') {
        Some((head, tail)) if head.len() == UUID_PREFIX_LEN => tail,
        _ => filename,
    }
}

/// Takes the advisory lock on `{dir}/.lock`, as described in §5. The guard
/// releases the lock on drop.
pub(crate) fn lock_directory(dir: &Path) -> Result<fd_lock::RwLockWriteGuard<'static, File>, PersistenceError> {
    let lock_path = dir.join(".lock");
    let file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;
    // Leak the `RwLock` itself (not the underlying file descriptor) so the
    // returned guard can outlive this function; one per write call, freed
    // when the process exits or the guard drops and the OS reclaims the fd.
    let lock: &'static mut RwLock<File> = Box::leak(Box::new(RwLock::new(file)));
    let guard = lock.write()?;
    Ok(guard)
}

/// Temp-file-then-rename write, matching the teacher CLI's
/// `write_report_atomic`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    fs::write(&tmp_path, bytes)?;
    if let Err(err) = fs::rename(&tmp_path, path) {
        if path.exists() {
            fs::remove_file(path)?;
            fs::rename(&tmp_path, path)?;
        } else {
            return Err(PersistenceError::Io(err));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::{KvrSupport, Verdict};
    use crate::device::{DeviceCategory, DeviceInfo};
    use crate::model::WiresharkCompare;
    use tempfile::TempDir;

    fn sample_analysis(vendor: &str, model: Option<&str>) -> BandSteeringAnalysis {
        BandSteeringAnalysis {
            analysis_id: "11111111-1111-1111-1111-111111111111".to_string(),
            filename: "capture.pcapng".to_string(),
            analysis_timestamp: "2026-01-01T00:00:00Z".to_string(),
            total_packets: 10,
            wlan_packets: 10,
            analysis_duration_ms: 5,
            devices: vec![DeviceInfo {
                mac_address: "11:22:33:44:55:66".to_string(),
                oui: "11:22:33".to_string(),
                vendor: vendor.to_string(),
                device_model: model.map(|m| m.to_string()),
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
            verdict: Verdict::Failed,
            raw_stats: Default::default(),
            wireshark_compare: WiresharkCompare::build(&Default::default(), 0, 0, 0, 0),
            original_file_path: "capture.pcapng".to_string(),
            analysis_text: String::new(),
        }
    }

    #[test]
    fn persists_json_under_vendor_model_tree() {
        let temp = TempDir::new().unwrap();
        let capture = temp.path().join("capture.pcapng");
        fs::write(&capture, b"fake").unwrap();

        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");

        let analysis = sample_analysis("Samsung", Some("Galaxy S21"));
        let json_path = persist_analysis(&analysis, &capture, &config).unwrap();

        assert!(json_path.ends_with("Samsung/Galaxy_S21/11111111-1111-1111-1111-111111111111.json"));
        assert!(json_path.exists());

        let copied = json_path
            .parent()
            .unwrap()
            .join("11111111-1111-1111-1111-111111111111_capture.pcapng");
        assert!(copied.exists());
    }

    #[test]
    fn falls_back_to_mac_when_model_unknown() {
        let temp = TempDir::new().unwrap();
        let capture = temp.path().join("capture.pcapng");
        fs::write(&capture, b"fake").unwrap();

        let mut config = EngineConfig::default();
        config.analyses_dir = temp.path().join("data/analyses");

        let analysis = sample_analysis("Unknown", None);
        let json_path = persist_analysis(&analysis, &capture, &config).unwrap();

        assert!(json_path.ends_with("Unknown/112233445566/11111111-1111-1111-1111-111111111111.json"));
    }

    #[test]
    fn strips_existing_uuid_prefix_before_copying() {
        assert_eq!(
            strip_uuid_prefix("550e8400-e29b-41d4-a716-446655440000_capture.pcapng"),
            "capture.pcapng"
        );
        assert_eq!(strip_uuid_prefix("capture.pcapng"), "capture.pcapng");
    }
}
