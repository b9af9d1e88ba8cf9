use assert_cmd::Command;
use bandsteer_core::compliance::{KvrSupport, Verdict};
use bandsteer_core::device::{DeviceCategory, DeviceInfo};
use bandsteer_core::model::{BandSteeringAnalysis, WiresharkCompare};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use predicates::str::is_match;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("bandsteer"))
}

fn parse_verdict(verdict: &str) -> Verdict {
    match verdict {
        "SUCCESS" => Verdict::Success,
        "PARTIAL" => Verdict::Partial,
        "FAILED" => Verdict::Failed,
        other => panic!("unknown verdict '{other}'"),
    }
}

/// Captures are not available in this environment (no real 802.11 dissector
/// fixtures); these tests drive argument handling, registry commands, and
/// error surfaces, which don't require a live `tshark`. Fixtures are built
/// from the real artifact type (not hand-written JSON) so they always match
/// the persisted shape.
fn write_fixture_analysis(data_dir: &std::path::Path, id: &str, vendor: &str, verdict: &str) {
    let analysis = BandSteeringAnalysis {
        analysis_id: id.to_string(),
        filename: "capture.pcapng".to_string(),
        analysis_timestamp: "2026-01-01T00:00:00Z".to_string(),
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
        verdict: parse_verdict(verdict),
        raw_stats: Default::default(),
        wireshark_compare: WiresharkCompare::build(&Default::default(), 0, 0, 0, 0),
        original_file_path: "capture.pcapng".to_string(),
        analysis_text: String::new(),
    };

    let dir = data_dir.join(vendor).join("device");
    std::fs::create_dir_all(&dir).expect("create fixture dir");
    std::fs::write(
        dir.join(format!("{id}.json")),
        serde_json::to_vec_pretty(&analysis).expect("serialize fixture"),
    )
    .expect("write fixture analysis");
}

#[test]
fn version_includes_commit() {
    cmd().arg("--version").assert().success().stdout(
        contains("commit")
            .and(contains("built"))
            .and(is_match(r"commit\s+\w+").expect("regex")),
    );
}

#[test]
fn analyze_missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcapng");

    cmd()
        .arg("analyze")
        .arg(missing)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn analyze_invalid_extension_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.txt");
    std::fs::write(&input, "dummy").expect("write file");

    cmd()
        .arg("analyze")
        .arg(input)
        .assert()
        .failure()
        .stderr(contains("error: unsupported input format").and(contains("hint: expected")));
}

#[test]
fn analyze_glob_no_match_errors() {
    let temp = TempDir::new().expect("tempdir");
    let pattern = temp.path().join("*.pcapng");

    cmd()
        .arg("analyze")
        .arg(pattern.to_string_lossy().to_string())
        .assert()
        .failure()
        .stderr(contains("error: no files match pattern").and(contains("hint:")));
}

#[test]
fn analyze_glob_multiple_matches_errors() {
    let temp = TempDir::new().expect("tempdir");
    let file_a = temp.path().join("a.pcapng");
    let file_b = temp.path().join("b.pcapng");
    std::fs::write(&file_a, []).expect("write file");
    std::fs::write(&file_b, []).expect("write file");

    let pattern = temp.path().join("*.pcapng");

    cmd()
        .arg("analyze")
        .arg(pattern.to_string_lossy().to_string())
        .assert()
        .failure()
        .stderr(contains("error: multiple files match pattern").and(contains("hint:")));
}

#[test]
fn analyze_stdout_and_report_conflict() {
    // clap rejects --stdout/--report before the capture is ever read, so
    // this doesn't depend on a working dissector being on PATH.
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.pcapng");
    std::fs::write(&input, []).expect("write fixture");
    let report = temp.path().join("report.json");

    cmd()
        .arg("analyze")
        .arg(&input)
        .arg("--stdout")
        .arg("-o")
        .arg(&report)
        .assert()
        .failure();
}

#[test]
fn batch_with_no_inputs_errors() {
    cmd()
        .arg("batch")
        .assert()
        .failure()
        .stderr(contains("no input captures given").and(contains("hint:")));
}

#[test]
fn batch_reports_per_capture_dissector_failures() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    let a = temp.path().join("a.pcapng");
    let b = temp.path().join("b.pcapng");
    std::fs::write(&a, []).expect("write file");
    std::fs::write(&b, []).expect("write file");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .env("BANDSTEER_DISSECTOR", "bandsteer-test-missing-dissector")
        .arg("batch")
        .arg(&a)
        .arg(&b)
        .assert()
        .failure()
        .stderr(contains("captures failed"));
}

#[test]
fn list_on_empty_registry_prints_nothing() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn list_json_outputs_an_array() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    write_fixture_analysis(&data_dir, "11111111-1111-1111-1111-111111111111", "Acme", "SUCCESS");

    let assert = cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("list")
        .arg("--json")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert!(value.is_array());
    assert_eq!(value.as_array().unwrap().len(), 1);
}

#[test]
fn show_missing_id_is_an_error() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("show")
        .arg("does-not-exist")
        .assert()
        .failure()
        .stderr(contains("no analysis found").and(contains("hint:")));
}

#[test]
fn show_prints_the_persisted_analysis() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    write_fixture_analysis(&data_dir, "22222222-2222-2222-2222-222222222222", "Acme", "FAILED");

    let assert = cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("show")
        .arg("22222222-2222-2222-2222-222222222222")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["analysis_id"], "22222222-2222-2222-2222-222222222222");
    assert_eq!(value["verdict"], "FAILED");
}

#[test]
fn stats_on_populated_registry_reports_counts() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    write_fixture_analysis(&data_dir, "33333333-3333-3333-3333-333333333333", "Acme", "SUCCESS");
    write_fixture_analysis(&data_dir, "44444444-4444-4444-4444-444444444444", "Acme", "FAILED");

    let assert = cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("stats")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["count"], 2);
}

#[test]
fn export_writes_full_registry_to_a_file() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    write_fixture_analysis(&data_dir, "55555555-5555-5555-5555-555555555555", "Acme", "SUCCESS");
    let out = temp.path().join("export.json");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("export")
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).expect("read export");
    let value: Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(value.as_array().unwrap().len(), 1);
}

#[test]
fn delete_with_no_target_is_an_error() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("delete")
        .assert()
        .failure()
        .stderr(contains("no delete target given"));
}

#[test]
fn delete_by_id_removes_a_single_analysis() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    write_fixture_analysis(&data_dir, "66666666-6666-6666-6666-666666666666", "Acme", "SUCCESS");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("delete")
        .arg("66666666-6666-6666-6666-666666666666")
        .assert()
        .success()
        .stderr(contains("deleted 1 analyses"));

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout("");
}

#[test]
fn delete_by_vendor_removes_matching_analyses_only() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    write_fixture_analysis(&data_dir, "77777777-7777-7777-7777-777777777777", "Acme", "SUCCESS");
    write_fixture_analysis(&data_dir, "88888888-8888-8888-8888-888888888888", "Other", "SUCCESS");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("delete")
        .arg("--vendor")
        .arg("Acme")
        .assert()
        .success()
        .stderr(contains("deleted 1 analyses"));

    let assert = cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("list")
        .arg("--json")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["devices"][0]["vendor"], "Other");
}

#[test]
fn delete_rejects_conflicting_selectors() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("delete")
        .arg("some-id")
        .arg("--all")
        .assert()
        .failure()
        .stderr(contains("pass exactly one of"));
}

#[test]
fn delete_all_clears_the_registry() {
    let temp = TempDir::new().expect("tempdir");
    let data_dir = temp.path().join("analyses");
    write_fixture_analysis(&data_dir, "99999999-9999-9999-9999-999999999999", "Acme", "SUCCESS");
    write_fixture_analysis(&data_dir, "aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa", "Other", "FAILED");

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("delete")
        .arg("--all")
        .assert()
        .success()
        .stderr(contains("deleted 2 analyses"));

    cmd()
        .env("BANDSTEER_DATA_DIR", &data_dir)
        .arg("list")
        .assert()
        .success()
        .stdout("");
}
