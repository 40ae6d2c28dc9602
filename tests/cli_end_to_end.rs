use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn weaver() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("weaver"));
    cmd.env_remove("WEAVER_CONFIG_FILE")
        .env("RUST_LOG", "warn")
        .args(["--latency-min-ms", "0", "--latency-max-ms", "0"]);
    cmd
}

#[test]
fn topics_lists_builtin_catalog() {
    weaver()
        .arg("topics")
        .assert()
        .success()
        .stdout(contains("healthy recipes\n"))
        .stdout(contains("history of the internet\n"))
        .stdout(contains("javascript frameworks\n"))
        .stdout(contains("the future of ai\n"));
}

#[test]
fn weave_prints_the_rendered_page() {
    let assert = weaver()
        .args(["weave", "Healthy Recipes"])
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.starts_with(r#"<div class="generated-content">"#));
    assert!(output.contains("<h2>Nourish Your Body</h2>"));
    assert!(output.contains("WEAVED ON: "));
}

#[test]
fn weave_requires_a_topic() {
    weaver().arg("weave").assert().failure();
}

#[test]
fn invalid_latency_window_is_rejected() {
    Command::new(assert_cmd::cargo::cargo_bin!("weaver"))
        .env_remove("WEAVER_CONFIG_FILE")
        .args(["--latency-min-ms", "500", "--latency-max-ms", "10", "topics"])
        .assert()
        .failure()
        .stderr(contains("source.latency_min_ms"));
}

#[test]
fn shell_writes_pages_into_output_dir() {
    let dir = TempDir::new().expect("temp dir");

    weaver()
        .arg("shell")
        .arg("--output-dir")
        .arg(dir.path())
        .write_stdin("History of the Internet\n\nhistory of the internet\nQuantum Biology\n")
        .assert()
        .success()
        .stderr(contains("Weaving: \"History of the Internet\" ..."))
        .stderr(contains("Library (2): History Of The Internet, Quantum Biology"));

    let history = fs::read_to_string(dir.path().join("history-of-the-internet.html"))
        .expect("history page written");
    assert!(history.contains(r#"class="timeline-item left""#));

    let quantum = fs::read_to_string(dir.path().join("quantum-biology.html"))
        .expect("default page written");
    assert!(quantum.contains("<h1>Quantum Biology</h1>"));
}

#[test]
fn shell_keeps_colliding_topics_in_separate_files() {
    let dir = TempDir::new().expect("temp dir");

    weaver()
        .arg("shell")
        .arg("--output-dir")
        .arg(dir.path())
        .write_stdin("a b\na-b\nA B\n")
        .assert()
        .success();

    let first = fs::read_to_string(dir.path().join("a-b.html")).expect("first page written");
    assert!(first.contains("<h1>A B</h1>"));

    let second = fs::read_to_string(dir.path().join("a-b-2.html")).expect("second page written");
    assert!(second.contains("<h1>A-b</h1>"));

    assert!(!dir.path().join("a-b-3.html").exists());
}
