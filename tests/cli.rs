//! Black-box tests for the `toon-condense` binary, exercising the CLI as a
//! thin shell around the library (spec.md §6 CLI surface).

use assert_cmd::Command;
use predicates::str::contains;

fn cmd() -> Command {
    Command::cargo_bin("toon-condense").expect("binary built")
}

#[test]
fn condense_subcommand_reads_stdin_and_prints_condensed_toon() {
    cmd()
        .arg("condense")
        .arg("--tool")
        .arg("list_pods")
        .write_stdin(r#"{"pods":[{"name":"a","ns":"default"},{"name":"b","ns":"default"}]}"#)
        .assert()
        .success()
        .stdout(contains("ns=default"));
}

#[test]
fn encode_subcommand_skips_preprocessing() {
    cmd()
        .arg("encode")
        .write_stdin(r#"{"pods":[{"name":"a","ns":"default"},{"name":"b","ns":"default"}]}"#)
        .assert()
        .success()
        .stdout(contains("ns"));
}

#[test]
fn profile_subcommand_prints_heuristics_record() {
    cmd()
        .arg("profile")
        .arg("compact")
        .assert()
        .success()
        .stdout(contains("wide_table_format"));
}

#[test]
fn profile_subcommand_rejects_unknown_profile_name() {
    cmd().arg("profile").arg("turbo").assert().failure();
}

#[test]
fn condense_subcommand_accepts_format_hint() {
    cmd()
        .arg("condense")
        .arg("--tool")
        .arg("t")
        .arg("--format-hint")
        .arg("yaml")
        .write_stdin("a: 1\nb: 2\n")
        .assert()
        .success()
        .stdout(contains("a: 1"));
}
