//! Engine-wide configuration, threaded explicitly through `analyze_capture`
//! and the registry functions (Design Note "Global mutable state -> passed
//! context"). Nothing in this crate reads the environment directly; the CLI
//! is responsible for turning flags/env vars into an `EngineConfig`.

use std::path::PathBuf;
use std::time::Duration;

/// Settings shared by the analysis pipeline and the persisted-report tree.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name (or path) of the `tshark`-compatible dissector binary.
    pub dissector_bin: String,
    /// Hard wall-clock timeout for one dissector subprocess run.
    pub dissector_timeout: Duration,
    /// Base directory for the persisted analysis tree (`data/analyses` by
    /// default).
    pub analyses_dir: PathBuf,
    /// Worker pool size for `batch` analysis of multiple captures.
    pub max_workers: usize,
    /// Maximum beacons retained per BSSID in the raw sample set (§4.5).
    pub beacon_quota_per_bssid: usize,
    /// Maximum signal samples retained per analysis after downsampling.
    pub signal_sample_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dissector_bin: "tshark".to_string(),
            dissector_timeout: Duration::from_secs(300),
            analyses_dir: PathBuf::from("data/analyses"),
            max_workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            beacon_quota_per_bssid: 3,
            signal_sample_cap: 500,
        }
    }
}

/// Optional user-supplied metadata accompanying an analysis request.
#[derive(Debug, Clone, Default)]
pub struct UserMetadata {
    pub ssid: Option<String>,
    pub client_mac: Option<String>,
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
}
