//! CLI surface checks: argument validation, exit codes and the printed
//! summary in both text and JSON form.

mod common;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;

use common::{grid_gcps, write_gcp_table, write_jobs_csv, write_plain_raster, TestEnv, TEST_PROJ4};

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("georef").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_arguments_print_usage() {
    cmd().assert().failure().stderr(contains("Usage"));
}

#[test]
fn invalid_projection_is_rejected() {
    let env = TestEnv::new();
    write_jobs_csv(&env.path("jobs.csv"), &[]);
    cmd()
        .arg(env.path("jobs.csv"))
        .arg("not a projection")
        .assert()
        .failure()
        .stderr(contains("invalid PROJ.4"));
}

#[test]
fn empty_job_table_reports_zero_rows() {
    let env = TestEnv::new();
    write_jobs_csv(&env.path("jobs.csv"), &[]);
    cmd()
        .arg(env.path("jobs.csv"))
        .arg(TEST_PROJ4)
        .assert()
        .success()
        .stdout(contains("0 rows: 0 processed, 0 skipped, 0 failed"));
}

#[test]
fn ignored_rows_are_reported_as_skipped() {
    let env = TestEnv::new();
    write_gcp_table(&env.path("plan-1.jpg.points"), &grid_gcps());
    write_jobs_csv(
        &env.path("jobs.csv"),
        &[format!(
            "{},{},1,1,,",
            env.path("plan-1.jpg").display(),
            env.path("plan-1.jpg.points").display()
        )],
    );
    cmd()
        .arg(env.path("jobs.csv"))
        .arg(TEST_PROJ4)
        .assert()
        .success()
        .stdout(contains("skipped (ignored)"));
}

#[test]
fn failing_rows_set_the_exit_code() {
    let env = TestEnv::new();
    write_gcp_table(&env.path("plan-2.points"), &grid_gcps());
    write_jobs_csv(
        &env.path("jobs.csv"),
        &[format!(
            "{},{},2,,,",
            env.path("plan-2.jpg").display(),
            env.path("plan-2.points").display()
        )],
    );
    cmd()
        .arg(env.path("jobs.csv"))
        .arg(TEST_PROJ4)
        .assert()
        .code(1)
        .stdout(contains("failed"));
}

#[test]
fn json_summary_carries_status_tags() {
    let env = TestEnv::new();
    write_gcp_table(&env.path("plan-3.jpg.points"), &grid_gcps());
    write_jobs_csv(
        &env.path("jobs.csv"),
        &[format!(
            "{},{},3,1,,",
            env.path("plan-3.jpg").display(),
            env.path("plan-3.jpg.points").display()
        )],
    );
    let output = cmd()
        .arg(env.path("jobs.csv"))
        .arg(TEST_PROJ4)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: Value = serde_json::from_slice(&output).expect("valid json output");
    assert_eq!(summary["rows"][0]["status"], "skipped_ignored");
    assert_eq!(summary["rows"][0]["id"], "3");
}

#[test]
fn full_run_georeferences_the_raster() {
    let env = TestEnv::new();
    write_plain_raster(&env.path("plan-4.jpg"));
    write_gcp_table(&env.path("plan-4.jpg.points"), &grid_gcps());
    write_jobs_csv(
        &env.path("jobs.csv"),
        &[format!(
            "{},{},4,,,",
            env.path("plan-4.jpg").display(),
            env.path("plan-4.jpg.points").display()
        )],
    );
    cmd()
        .arg(env.path("jobs.csv"))
        .arg(TEST_PROJ4)
        .assert()
        .success()
        .stdout(contains("processed"));
    assert!(env.path("plan-4.tif").exists());
}

#[test]
fn tps_token_selects_the_spline() {
    let env = TestEnv::new();
    write_plain_raster(&env.path("plan-5.jpg"));
    write_gcp_table(&env.path("plan-5.jpg.points"), &grid_gcps());
    write_jobs_csv(
        &env.path("jobs.csv"),
        &[format!(
            "{},{},5,,,",
            env.path("plan-5.jpg").display(),
            env.path("plan-5.jpg.points").display()
        )],
    );
    cmd()
        .arg(env.path("jobs.csv"))
        .arg(TEST_PROJ4)
        .arg("tps")
        .assert()
        .success();
    assert!(env.path("plan-5.tif").exists());
}

#[test]
fn unknown_transform_token_warns_and_continues() {
    let env = TestEnv::new();
    write_jobs_csv(&env.path("jobs.csv"), &[]);
    cmd()
        .arg(env.path("jobs.csv"))
        .arg(TEST_PROJ4)
        .arg("poly9")
        .assert()
        .success()
        .stderr(contains("Unrecognized transform token"));
}
