use netperf_sweep::perf::Metric;
use netperf_sweep::report;
use netperf_sweep::stats::{Aggregate, MetricAggregate};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "netperf-sweep-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_report(dir: &PathBuf, name: &str) -> PathBuf {
    let path = dir.join(name);
    let report: Vec<MetricAggregate> = Metric::ALL
        .into_iter()
        .enumerate()
        .map(|(i, metric)| {
            let base = 100.0 * (i + 1) as f64;
            MetricAggregate {
                metric,
                aggregate: Aggregate {
                    sum: vec![base * 2.0, base * 4.0],
                    mean: vec![base, base * 2.0],
                    stddev: vec![0.5, 1.0],
                },
            }
        })
        .collect();
    report::save(&path, &report).expect("write report");
    path
}

fn perf_sweep() -> Command {
    Command::new(env!("CARGO_BIN_EXE_perf_sweep"))
}

#[test]
fn perf_sweep_requires_runs_or_file() {
    let output = perf_sweep().arg("--print").output().expect("run perf_sweep");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--runs") || stderr.contains("--file"), "{stderr}");
}

#[test]
fn perf_sweep_rejects_runs_and_file_together() {
    let dir = unique_temp_dir("both");
    let input = write_report(&dir, "in.bin");

    let output = perf_sweep()
        .args(["--runs", "2", "--file", input.to_str().unwrap()])
        .output()
        .expect("run perf_sweep");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be used with"), "{stderr}");
}

#[test]
fn perf_sweep_rejects_zero_runs() {
    let output = perf_sweep()
        .args(["--runs", "0"])
        .output()
        .expect("run perf_sweep");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("runs must be positive"), "{stderr}");
}

#[test]
fn perf_sweep_prints_loaded_report() {
    let dir = unique_temp_dir("print");
    let input = write_report(&dir, "in.bin");

    let output = perf_sweep()
        .args(["--file", input.to_str().unwrap(), "--print", "--quiet"])
        .output()
        .expect("run perf_sweep");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let headers: Vec<&str> = stdout
        .lines()
        .filter(|line| line.starts_with("!! Data Collected"))
        .collect();
    assert_eq!(
        headers,
        [
            "!! Data Collected from the File Size Test !!",
            "!! Data Collected from the Latency Test !!",
            "!! Data Collected from the Loss Rate Test !!",
        ]
    );
    assert!(stdout.contains("[300.000, 600.000]"), "{stdout}");
}

#[test]
fn perf_sweep_reexports_binary_and_json() {
    let dir = unique_temp_dir("export");
    let input = write_report(&dir, "in.bin");
    let copy = dir.join("copy.bin");
    let json = dir.join("report.json");

    let output = perf_sweep()
        .args([
            "--file",
            input.to_str().unwrap(),
            "--output",
            copy.to_str().unwrap(),
            "--json",
            json.to_str().unwrap(),
            "--quiet",
        ])
        .output()
        .expect("run perf_sweep");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty(), "nothing printed without --print");

    let original = report::load(&input).expect("load input");
    let reloaded = report::load(&copy).expect("load copy");
    assert_eq!(original, reloaded);

    let value: Value = serde_json::from_str(&fs::read_to_string(&json).expect("read json"))
        .expect("parse json");
    let metrics: Vec<&str> = value
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry["metric"].as_str().expect("metric"))
        .collect();
    assert_eq!(metrics, ["file_size", "latency", "loss"]);
    assert_eq!(value[2]["stddev"][1], 1.0);
}

#[test]
fn perf_sweep_reports_missing_input_file() {
    let dir = unique_temp_dir("missing");
    let output = perf_sweep()
        .args(["--file", dir.join("nope.bin").to_str().unwrap(), "--quiet"])
        .output()
        .expect("run perf_sweep");
    assert!(!output.status.success());
}
