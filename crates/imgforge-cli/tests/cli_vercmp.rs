use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn imgforge_cmd() -> Command {
    Command::cargo_bin("imgforge").unwrap()
}

#[test]
fn test_vercmp_debian() {
    imgforge_cmd()
        .args(["vercmp", "1.0~rc1", "1.0"])
        .assert()
        .success()
        .stdout("<\n");

    imgforge_cmd()
        .args(["vercmp", "1:1.0", "2.0"])
        .assert()
        .success()
        .stdout(">\n");
}

#[test]
fn test_vercmp_rpm() {
    imgforge_cmd()
        .args(["vercmp", "--ecosystem", "rpm", "2.38-4.fc40", "2.38-4.fc40"])
        .assert()
        .success()
        .stdout("=\n");
}

#[test]
fn test_vercmp_unknown_ecosystem() {
    imgforge_cmd()
        .args(["vercmp", "--ecosystem", "pacman", "1", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown ecosystem"));
}
