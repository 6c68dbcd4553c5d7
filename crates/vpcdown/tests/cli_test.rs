use assert_cmd::Command;
use predicates::prelude::*;

/// The help text names the destructive flags
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("vpcdown").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<VPC_ID>"))
        .stdout(predicate::str::contains("--region"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--yes"));
}

/// A VPC id is required
#[test]
fn test_missing_vpc_id_fails() {
    let mut cmd = Command::cargo_bin("vpcdown").unwrap();
    cmd.env_remove("AWS_REGION").assert().failure();
}

/// The region must come from --region or AWS_REGION
#[test]
fn test_missing_region_fails() {
    let mut cmd = Command::cargo_bin("vpcdown").unwrap();
    cmd.env_remove("AWS_REGION")
        .arg("vpc-0abc123")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--region"));
}

/// Unknown flags are rejected
#[test]
fn test_unknown_flag_fails() {
    let mut cmd = Command::cargo_bin("vpcdown").unwrap();
    cmd.arg("vpc-0abc123")
        .arg("--force")
        .assert()
        .failure();
}
