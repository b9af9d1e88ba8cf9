//! BandSteer command-line interface.
//!
//! This binary runs offline band-steering compliance analysis over
//! 802.11 captures and persists each result as a versioned JSON artifact
//! under a vendor/device tree. It is a thin wrapper over the
//! `bandsteer-core` analysis pipeline.
//!
//! Typical usage:
//! - `bandsteer analyze capture.pcapng -o report.json`
//! - `bandsteer batch captures/*.pcapng --workers 4`
//! - `bandsteer list --json`
//! - `bandsteer show <id>`
//! - `bandsteer stats`
//! - `bandsteer delete --vendor Samsung`
//!
//! Errors are reported to stderr; exit codes follow §7: 0 success, 2
//! invalid input, 3 dissector failure, 4 I/O/persistence failure.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bandsteer_core::{AnalysisError, EngineConfig, UserMetadata};
use clap::{Parser, Subcommand};
use glob::glob;
use serde::Serialize;

mod worker;

#[derive(Parser, Debug)]
#[command(name = "bandsteer")]
#[command(
    version = concat!(
        env!("CARGO_PKG_VERSION"),
        " (commit ",
        env!("BANDSTEER_BUILD_COMMIT"),
        ", built ",
        env!("BANDSTEER_BUILD_DATE"),
        ")"
    )
)]
#[command(
    about = "Offline-first 802.11 band-steering compliance analyzer.",
    long_about = None,
    after_help = "Examples:\n  bandsteer analyze capture.pcapng -o report.json\n  bandsteer batch captures/*.pcapng --workers 4\n  bandsteer list --json\n  bandsteer show <id>\n  bandsteer stats\n  bandsteer delete --vendor Samsung"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a single capture and persist a JSON artifact.
    Analyze {
        /// Path to a .pcap or .pcapng file (glob patterns resolve to a single match)
        input: PathBuf,

        #[arg(long)]
        ssid: Option<String>,
        #[arg(long)]
        client_mac: Option<String>,
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        model: Option<String>,

        /// Output report path (JSON); defaults to the persisted registry location
        #[arg(short = 'o', long, conflicts_with = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout instead of persisting it
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        #[arg(long, conflicts_with = "compact")]
        pretty: bool,
        #[arg(long)]
        compact: bool,
        #[arg(long)]
        quiet: bool,
    },
    /// Analyze many captures concurrently, one artifact each.
    Batch {
        /// Paths or glob patterns, one or more
        inputs: Vec<PathBuf>,

        /// Worker pool size (defaults to `EngineConfig::max_workers`)
        #[arg(long)]
        workers: Option<usize>,

        #[arg(long)]
        quiet: bool,
    },
    /// List persisted analyses.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print a single persisted analysis.
    Show {
        analysis_id: String,

        #[arg(long, conflicts_with = "compact")]
        pretty: bool,
        #[arg(long)]
        compact: bool,
    },
    /// Print aggregate registry statistics.
    Stats {
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,
        #[arg(long)]
        compact: bool,
    },
    /// Dump the full registry as one JSON array.
    Export {
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        #[arg(long, conflicts_with = "compact")]
        pretty: bool,
        #[arg(long)]
        compact: bool,
    },
    /// Delete one or more persisted analyses.
    Delete {
        /// Single analysis id
        analysis_id: Option<String>,

        #[arg(long)]
        vendor: Option<String>,

        /// Comma-separated list of ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        #[arg(long)]
        all: bool,

        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            input,
            ssid,
            client_mac,
            brand,
            model,
            report,
            stdout,
            pretty,
            compact,
            quiet,
        } => cmd_analyze(
            input, ssid, client_mac, brand, model, report, stdout, pretty, compact, quiet,
        ),
        Commands::Batch {
            inputs,
            workers,
            quiet,
        } => cmd_batch(inputs, workers, quiet),
        Commands::List { json } => cmd_list(json),
        Commands::Show {
            analysis_id,
            pretty,
            compact,
        } => cmd_show(analysis_id, pretty, compact),
        Commands::Stats { pretty, compact } => cmd_stats(pretty, compact),
        Commands::Export {
            output,
            pretty,
            compact,
        } => cmd_export(output, pretty, compact),
        Commands::Delete {
            analysis_id,
            vendor,
            ids,
            all,
            quiet,
        } => cmd_delete(analysis_id, vendor, ids, all, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(err.exit_code)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
    exit_code: u8,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>, exit_code: u8) -> Self {
        Self {
            message: message.into(),
            hint,
            exit_code,
        }
    }

    fn invalid(message: impl Into<String>, hint: Option<String>) -> Self {
        Self::new(message, hint, 2)
    }

    fn io(message: impl Into<String>) -> Self {
        Self::new(message, None, 4)
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None, 4)
    }
}

impl From<AnalysisError> for CliError {
    fn from(err: AnalysisError) -> Self {
        let exit_code = match &err {
            AnalysisError::Dissector(_) => 3,
            AnalysisError::InvalidCapture | AnalysisError::InvalidInput(_) => 2,
            AnalysisError::Persistence(_) => 4,
        };
        CliError::new(err.to_string(), None, exit_code)
    }
}

impl From<bandsteer_core::PersistenceError> for CliError {
    fn from(err: bandsteer_core::PersistenceError) -> Self {
        CliError::io(err.to_string())
    }
}

/// Builds an [`EngineConfig`] from environment overrides, matching the
/// teacher's "CLI reads the environment, the library never does" split
/// (config.rs's Design Note).
fn config_from_env() -> EngineConfig {
    let mut config = EngineConfig::default();
    if let Ok(bin) = std::env::var("BANDSTEER_DISSECTOR") {
        if !bin.is_empty() {
            config.dissector_bin = bin;
        }
    }
    if let Ok(dir) = std::env::var("BANDSTEER_DATA_DIR") {
        if !dir.is_empty() {
            config.analyses_dir = PathBuf::from(dir);
        }
    }
    config
}

#[allow(clippy::too_many_arguments)]
fn cmd_analyze(
    input: PathBuf,
    ssid: Option<String>,
    client_mac: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;

    let metadata = UserMetadata {
        ssid,
        client_mac,
        device_brand: brand,
        device_model: model,
    };
    let config = config_from_env();

    let analysis = bandsteer_core::analyze_capture(&resolved_input, &metadata, &config)?;
    let json = serialize_json(&analysis, pretty, compact)?;

    if stdout {
        print!("{}", json);
        return Ok(());
    }

    if let Some(report_path) = report.as_ref() {
        write_report_atomic(report_path, &json)?;
        if !quiet {
            eprintln!("OK: report written -> {}", report_path.display());
        }
        return Ok(());
    }

    let json_path = bandsteer_core::persist::persist_analysis(&analysis, &resolved_input, &config)?;
    if !quiet {
        eprintln!(
            "OK: {} -> {}",
            analysis.verdict,
            json_path.display()
        );
    }
    Ok(())
}

fn cmd_batch(inputs: Vec<PathBuf>, workers: Option<usize>, quiet: bool) -> Result<(), CliError> {
    if inputs.is_empty() {
        return Err(CliError::invalid(
            "no input captures given",
            Some("pass one or more paths or glob patterns".to_string()),
        ));
    }

    let mut resolved = Vec::new();
    for input in &inputs {
        resolved.extend(resolve_input_paths(input)?);
    }

    let config = config_from_env();
    let worker_count = workers.unwrap_or(config.max_workers).max(1);

    let results = worker::run_batch(resolved, config, worker_count);

    let mut failures = 0u64;
    for result in &results {
        match result {
            Ok((path, json_path)) => {
                if !quiet {
                    eprintln!("OK: {} -> {}", path.display(), json_path.display());
                }
            }
            Err((path, err)) => {
                failures += 1;
                eprintln!("error: {}: {}", path.display(), err);
            }
        }
    }

    if failures > 0 {
        return Err(CliError::new(
            format!("{failures} of {} captures failed", results.len()),
            Some("see per-capture errors above".to_string()),
            3,
        ));
    }
    Ok(())
}

fn cmd_list(json: bool) -> Result<(), CliError> {
    let config = config_from_env();
    let analyses = bandsteer_core::registry::list_all(&config);

    if json {
        let output = serialize_json(&analyses, false, true)?;
        println!("{}", output);
        return Ok(());
    }

    for analysis in &analyses {
        println!(
            "{}  {}  {}  {}",
            analysis.analysis_id,
            analysis.analysis_timestamp,
            analysis.verdict,
            analysis
                .devices
                .first()
                .map(|d| d.vendor.as_str())
                .unwrap_or("unknown"),
        );
    }
    Ok(())
}

fn cmd_show(analysis_id: String, pretty: bool, compact: bool) -> Result<(), CliError> {
    let config = config_from_env();
    let analysis = bandsteer_core::registry::get_by_id(&config, &analysis_id).ok_or_else(|| {
        CliError::new(
            format!("no analysis found with id '{analysis_id}'"),
            Some("run `bandsteer list` to see known ids".to_string()),
            2,
        )
    })?;
    let json = serialize_json(&analysis, pretty, compact)?;
    println!("{}", json);
    Ok(())
}

fn cmd_stats(pretty: bool, compact: bool) -> Result<(), CliError> {
    let config = config_from_env();
    let report = bandsteer_core::registry::stats(&config);
    let json = serialize_json(&report, pretty, compact)?;
    println!("{}", json);
    Ok(())
}

fn cmd_export(output: Option<PathBuf>, pretty: bool, compact: bool) -> Result<(), CliError> {
    let config = config_from_env();
    let analyses = bandsteer_core::registry::export_all(&config);
    let json = serialize_json(&analyses, pretty, compact)?;

    match output {
        Some(path) => {
            write_report_atomic(&path, &json)?;
            eprintln!("OK: exported {} analyses -> {}", analyses.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn cmd_delete(
    analysis_id: Option<String>,
    vendor: Option<String>,
    ids: Vec<String>,
    all: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let config = config_from_env();

    let selectors = [
        analysis_id.is_some(),
        vendor.is_some(),
        !ids.is_empty(),
        all,
    ]
    .iter()
    .filter(|s| **s)
    .count();
    if selectors == 0 {
        return Err(CliError::invalid(
            "no delete target given",
            Some("pass an id, --vendor, --ids, or --all".to_string()),
        ));
    }
    if selectors > 1 {
        return Err(CliError::invalid(
            "pass exactly one of: id, --vendor, --ids, --all",
            None,
        ));
    }

    let deleted = if all {
        bandsteer_core::registry::delete_all(&config)?
    } else if let Some(vendor) = vendor {
        bandsteer_core::registry::delete_by_vendor(&config, &vendor)?
    } else if !ids.is_empty() {
        bandsteer_core::registry::delete_by_ids(&config, &ids)?
    } else {
        let id = analysis_id.expect("selectors == 1 guarantees one branch matches");
        if bandsteer_core::registry::delete_by_id(&config, &id)? {
            1
        } else {
            0
        }
    };

    if !quiet {
        eprintln!("OK: deleted {deleted} analyses");
    }
    Ok(())
}

fn serialize_json<T: Serialize>(value: &T, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::invalid(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn write_report_atomic(path: &Path, json: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    fs::write(&tmp_path, json)
        .with_context(|| format!("Failed to write report: {}", tmp_path.display()))?;

    if let Err(err) = fs::rename(&tmp_path, path) {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to replace report: {}", path.display()))?;
            fs::rename(&tmp_path, path)
                .with_context(|| format!("Failed to replace report: {}", path.display()))?;
        } else {
            return Err(CliError::io(format!("Failed to move report into place: {err}")));
        }
    }

    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::invalid(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::invalid(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = resolve_glob(&pattern)?;
    if matches.is_empty() {
        return Err(CliError::invalid(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        ));
    }
    if matches.len() > 1 {
        let hint = "pass a single capture file, or use `bandsteer batch` for many".to_string();
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed = matches.iter().take(3).collect::<Vec<_>>();
        if !listed.is_empty() {
            let mut details = String::new();
            details.push_str("; matches: ");
            details.push_str(
                &listed
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            if matches.len() > 3 {
                details.push_str(", ...");
            }
            message.push_str(&details);
        }
        return Err(CliError::invalid(message, Some(hint)));
    }

    Ok(matches.remove(0))
}

/// Like [`resolve_input_path`] but returns every match instead of rejecting
/// multi-match globs — used by `batch`, which is built for exactly that.
fn resolve_input_paths(input: &Path) -> Result<Vec<PathBuf>, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(vec![input.to_path_buf()]);
    }
    let matches = resolve_glob(&pattern)?;
    if matches.is_empty() {
        return Err(CliError::invalid(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        ));
    }
    Ok(matches)
}

fn resolve_glob(pattern: &str) -> Result<Vec<PathBuf>, CliError> {
    let mut matches = Vec::new();
    let paths = glob(pattern).map_err(|err| {
        CliError::invalid(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::invalid(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }
    Ok(matches)
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
