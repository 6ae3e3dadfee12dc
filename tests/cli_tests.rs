// tests/cli_tests.rs
use assert_cmd::cargo::CommandCargoExt;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::Stdio;
use tempfile::{NamedTempFile, TempDir};

const RECORDS: &str = r#"{"type": "log.Info", "startTime": "2024-03-05T10:00:00Z", "fields": {"message": "hi", "origin": "com.acme.Service"}}
{"type": "jdk.ThreadStart", "startTime": "2024-03-05T10:00:01Z", "fields": {"thread": {"$type": "java.lang.Thread", "$kind": "thread", "javaName": "worker", "group": {"$type": "java.lang.ThreadGroup", "$kind": "threadGroup", "name": "main"}}}}
{"type": "log.Warn", "startTime": "2024-03-05T10:00:02Z", "fields": {"message": "careful", "origin": "com.acme.Other"}}
"#;

fn evprint() -> Command {
    Command::cargo_bin("evprint").unwrap()
}

fn input_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_single_template_for_a_prefix() {
    let input = input_file(RECORDS);
    evprint()
        .args(["--utc", "*", "log.*", "{eventName,0d,C} {origin,0d}: {message}"])
        .arg(input.path())
        .assert()
        .success()
        .stdout("INFO Service: hi\nWARN Other: careful\n");
}

#[test]
fn test_several_routes_from_stdin() {
    evprint()
        .args([
            "--utc",
            "*",
            "log.Info",
            "{startTime,dt:HH:mm:ss} {message}",
            "jdk.*",
            "name: {thread.javaName}, group: {thread.group.name}",
            "-",
        ])
        .write_stdin(RECORDS)
        .assert()
        .success()
        .stdout("10:00:00 hi\nname: worker, group: main\n");
}

#[test]
fn test_event_without_template_prints_default_form() {
    evprint()
        .args(["*", "log.Info", "-"])
        .write_stdin(RECORDS)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("log.Info {\n"))
        .stdout(predicate::str::contains("  message = \"hi\"\n"))
        .stdout(predicate::str::contains("log.Warn").not());
}

#[test]
fn test_range_drops_old_records() {
    // every record in the input is long past
    evprint()
        .args(["1h", "*", "{eventName}", "-"])
        .write_stdin(RECORDS)
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_config_file_routes() {
    let mut config = NamedTempFile::new().unwrap();
    writeln!(
        config,
        r#"utc: true
routes:
  - event: "log.Warn"
    template: "{{eventName}} [{{...}}]"
  - event: "jdk.*"
    template: "{{thread.javaName}}"
"#
    )
    .unwrap();

    evprint()
        .arg("--config")
        .arg(config.path())
        .arg("-")
        .write_stdin(RECORDS)
        .assert()
        .success()
        .stdout("worker\nlog.Warn [message:careful, origin:com.acme.Other]\n");
}

#[test]
fn test_directory_input_reads_files_in_name_order() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<&str> = RECORDS.lines().collect();
    fs::write(dir.path().join("b.jsonl"), format!("{}\n", lines[2])).unwrap();
    fs::write(dir.path().join("a.jsonl"), format!("{}\n", lines[0])).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a record\n").unwrap();

    evprint()
        .args(["*", "*", "{message}"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout("hi\ncareful\n");
}

#[test]
fn test_bad_template_fails_before_reading() {
    evprint()
        .args(["*", "*", "{message,q}", "-"])
        .write_stdin(RECORDS)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("unknown parameter"));
}

#[test]
fn test_odd_event_template_pairs_rejected() {
    evprint()
        .args(["*", "log.*", "{message}", "jdk.*", "-"])
        .write_stdin(RECORDS)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("needs a template"));
}

#[test]
fn test_bad_record_fails_fast_by_default() {
    evprint()
        .args(["*", "*", "{eventName}", "-"])
        .write_stdin("{\"type\": \"a\", \"startTime\": \"2024-03-05T10:00:00Z\"}\nnot json\n")
        .assert()
        .code(1)
        .stdout("a\n")
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_skip_errors_continues_and_exits_nonzero() {
    evprint()
        .args(["--skip-errors", "*", "*", "{eventName}", "-"])
        .write_stdin("not json\n{\"type\": \"b\", \"startTime\": \"2024-03-05T10:00:00Z\"}\n")
        .assert()
        .code(1)
        .stdout("b\n")
        .stderr(predicate::str::contains("skipping"));
}

#[test]
fn test_output_file() {
    let output = NamedTempFile::new().unwrap();
    evprint()
        .args(["*", "log.Info", "{message}", "-", "-o"])
        .arg(output.path())
        .write_stdin(RECORDS)
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read_to_string(output.path()).unwrap(), "hi\n");
}

#[test]
fn test_closed_reader_ends_quietly() {
    // far more output than a pipe buffers, split over two repository files
    let dir = TempDir::new().unwrap();
    for name in ["a.jsonl", "b.jsonl"] {
        let records: String = (0..100_000)
            .map(|i| format!("{{\"type\": \"x\", \"startTime\": \"2024-03-05T10:00:00Z\", \"fields\": {{\"message\": \"m{}\"}}}}\n", i))
            .collect();
        fs::write(dir.path().join(name), records).unwrap();
    }

    let mut child = std::process::Command::cargo_bin("evprint")
        .unwrap()
        .args(["*", "*", "{message}"])
        .arg(dir.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let mut first = String::new();
    {
        let mut stdout = BufReader::new(child.stdout.take().unwrap());
        stdout.read_line(&mut first).unwrap();
    }
    assert_eq!(first, "m0\n");

    let status = child.wait().unwrap();
    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
    assert!(status.success(), "exit status {:?}, stderr: {}", status, stderr);
    assert_eq!(stderr, "");
}
