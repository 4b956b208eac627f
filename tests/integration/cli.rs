//! Integration tests for the `pagesnap` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use super::common::fixtures::{write_page, ARTICLE_HTML};

fn pagesnap(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pagesnap").expect("binary is built");
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

/// Capturing a file writes the page into the output directory
#[test]
fn test_capture_writes_artifact() {
    let data_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = write_page(work.path(), "article.html", ARTICLE_HTML);
    let output = work.path().join("out");

    pagesnap(&data_dir)
        .arg("capture")
        .arg(&input)
        .arg("--output-dir")
        .arg(&output)
        .arg("--remove-hidden-elements")
        .assert()
        .success()
        .stdout(predicate::str::ends_with("Example.html\n"))
        .stderr(predicate::str::contains("processing done"));

    let saved = std::fs::read_to_string(output.join("Example.html")).unwrap();
    assert!(saved.starts_with("<!DOCTYPE html>\n"));
    assert!(saved.contains("<img id=\"chart\""));
    assert!(!saved.contains("Advert"));
    assert!(!saved.contains("data-single-file"));
    // The log file lives in the data directory
    assert!(data_dir.path().join("logs").join("pagesnap.log").exists());
}

/// `--selected-id` keeps only that element
#[test]
fn test_capture_selected_element() {
    let data_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = write_page(work.path(), "article.html", ARTICLE_HTML);

    pagesnap(&data_dir)
        .arg("capture")
        .arg(&input)
        .arg("--output-dir")
        .arg(work.path())
        .args(["--selected-id", "story", "--url", "https://example.com/story"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(work.path().join("Example.html")).unwrap();
    assert!(saved.contains("Headline"));
    assert!(!saved.contains("Site menu"));
}

/// The save date lands in the filename
#[test]
fn test_capture_with_save_date() {
    let data_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = write_page(work.path(), "article.html", ARTICLE_HTML);

    pagesnap(&data_dir)
        .arg("capture")
        .arg(&input)
        .arg("--output-dir")
        .arg(work.path())
        .arg("--append-save-date")
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(r"Example \(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\)\.html\n$")
                .unwrap(),
        );
}

/// Config defaults apply when flags are absent
#[test]
fn test_config_defaults() {
    let data_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = write_page(work.path(), "article.html", ARTICLE_HTML);
    let output = work.path().join("from-config");
    let config = write_page(
        work.path(),
        "config.toml",
        &format!(
            "output_dir = {:?}\n\n[capture]\nremove_hidden_elements = true\n",
            output.display().to_string()
        ),
    );

    pagesnap(&data_dir)
        .arg("capture")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let saved = std::fs::read_to_string(output.join("Example.html")).unwrap();
    assert!(!saved.contains("Advert"));
}

/// A selection that cannot be resolved fails before capturing
#[test]
fn test_unknown_selected_id_fails() {
    let data_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = write_page(work.path(), "article.html", ARTICLE_HTML);

    pagesnap(&data_dir)
        .arg("capture")
        .arg(&input)
        .arg("--output-dir")
        .arg(work.path())
        .args(["--selected-id", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

/// `--selected` without a selection reports the capture error
#[test]
fn test_selected_without_selection_fails() {
    let data_dir = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = write_page(work.path(), "article.html", ARTICLE_HTML);

    pagesnap(&data_dir)
        .arg("capture")
        .arg(&input)
        .arg("--output-dir")
        .arg(work.path())
        .arg("--selected")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: No content is selected"));

    assert!(!work.path().join("Example.html").exists());
}

#[test]
fn test_missing_input_fails() {
    let data_dir = TempDir::new().unwrap();
    pagesnap(&data_dir)
        .args(["capture", "/nonexistent/page.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
