use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn depot(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("depot").unwrap();
    cmd.current_dir(workdir).env("DEPOT__LOGGING__LEVEL", "error").arg("--root").arg("uploads");
    cmd
}

fn upload_json(workdir: &Path, file: &str) -> Value {
    let out = depot(workdir).args(["upload", "--json", file]).output().unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let records: Value = serde_json::from_slice(&out.stdout).unwrap();
    records[0].clone()
}

#[test]
fn upload_list_and_stats() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("report.pdf"), vec![1u8; 1024]).unwrap();

    let record = upload_json(temp.path(), "report.pdf");
    assert_eq!(record["originalName"], "report.pdf");
    assert_eq!(record["category"], "DOCUMENT");
    assert_eq!(record["extension"], "pdf");
    assert_eq!(record["sizeBytes"], 1024);
    let stored = record["storedName"].as_str().unwrap().to_owned();
    assert_eq!(record["downloadUrl"], format!("/download/{stored}"));

    depot(temp.path())
        .args(["list", "--category", "document"])
        .assert()
        .success()
        .stdout(predicate::str::contains(stored.as_str()).and(predicate::str::contains("1 of 1 file(s)")));

    depot(temp.path())
        .args(["list", "--category", "nonsense"])
        .assert()
        .success()
        .stdout(predicate::str::contains(stored.as_str()));

    depot(temp.path())
        .args(["stats", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"DOCUMENT\": 1"));
}

#[test]
fn rejected_uploads_fail_the_command() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("ok.txt"), b"fine").unwrap();
    std::fs::write(temp.path().join("tool.exe"), b"MZ").unwrap();

    depot(temp.path())
        .args(["upload", "ok.txt", "tool.exe"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Stored ok.txt as"))
        .stderr(predicate::str::contains("Unsupported file type: exe"))
        .stderr(predicate::str::contains("1 of 2 uploads failed"));

    depot(temp.path())
        .args(["storage", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"totalFiles\": 1").and(predicate::str::contains("\"availableBytes\"")));

    depot(temp.path())
        .arg("storage")
        .assert()
        .success()
        .stdout(predicate::str::contains("Volume size:").and(predicate::str::contains("Available:")));
}

#[test]
fn download_info_and_delete() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("notes.txt"), b"remember the milk").unwrap();
    let record = upload_json(temp.path(), "notes.txt");
    let stored = record["storedName"].as_str().unwrap().to_owned();

    depot(temp.path())
        .args(["info", &stored])
        .assert()
        .success()
        .stdout(predicate::str::contains("Original name: notes.txt"));

    depot(temp.path()).args(["download", &stored, "--out", "copy.txt"]).assert().success();
    assert_eq!(std::fs::read(temp.path().join("copy.txt")).unwrap(), b"remember the milk");

    depot(temp.path())
        .args(["download", &stored, "--out", "copy.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    depot(temp.path())
        .args(["delete", &stored])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));
    depot(temp.path())
        .args(["delete", &stored])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing stored"));

    depot(temp.path()).args(["info", &stored]).assert().failure();
}

#[test]
fn traversal_delete_is_refused() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("secret.txt"), b"s").unwrap();

    depot(temp.path())
        .args(["delete", "../secret.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path traversal security violation"));
    assert!(temp.path().join("secret.txt").exists());
}

#[test]
fn config_file_and_environment_apply() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("depot.toml"),
        "[storage]\nallowed_extensions = \"bin\"\ndefault_user = \"ops\"\n",
    )
    .unwrap();
    std::fs::write(temp.path().join("blob.bin"), vec![0u8; 10]).unwrap();

    let record = upload_json(temp.path(), "blob.bin");
    assert_eq!(record["uploadUser"], "ops");
    assert_eq!(record["category"], "OTHER");

    depot(temp.path())
        .env("DEPOT__STORAGE__MAX_FILE_SIZE", "4")
        .args(["upload", "blob.bin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File size cannot exceed 4 B"));
}
