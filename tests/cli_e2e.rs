//! End-to-end CLI tests for the imgharvest binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binary command isolated from any user config file.
fn imgharvest(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("imgharvest").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    bytes
}

async fn gallery_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<img src="/big.png"><img src="/tiny.png"><img src="/gone.png">"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/big.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(png(400, 300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tiny.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(png(16, 16)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

#[test]
fn test_binary_help_displays_usage() {
    let config_home = TempDir::new().unwrap();
    imgharvest(&config_home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--min-width"));
}

#[test]
fn test_binary_version_displays_version() {
    let config_home = TempDir::new().unwrap();
    imgharvest(&config_home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("imgharvest"));
}

#[test]
fn test_binary_missing_arguments_exit_one() {
    let config_home = TempDir::new().unwrap();
    imgharvest(&config_home)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_non_http_url_exit_one() {
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    imgharvest(&config_home)
        .arg("ftp://example.com/")
        .arg(out.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported scheme"));
}

#[test]
fn test_binary_zero_bound_exit_one() {
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    imgharvest(&config_home)
        .args(["https://example.com/", "--min-width", "0"])
        .arg(out.path())
        .assert()
        .code(1);
}

#[test]
fn test_binary_min_above_max_exit_one() {
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    imgharvest(&config_home)
        .args(["https://example.com/", "--min-height", "900", "--max-height", "100"])
        .arg(out.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--min-height 900"));
}

#[test]
fn test_binary_output_path_is_file_exit_one() {
    let config_home = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();

    imgharvest(&config_home)
        .arg("https://example.com/")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not a directory"));
}

#[test]
fn test_binary_invalid_config_file_exit_one() {
    let config_home = TempDir::new().unwrap();
    let dir = config_home.path().join("imgharvest");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "threads = 8\n").unwrap();
    let out = TempDir::new().unwrap();

    imgharvest(&config_home)
        .arg("https://example.com/")
        .arg(out.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[tokio::test]
async fn test_binary_page_server_error_exit_two() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(out.path())
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Done:").not())
        .stderr(predicate::str::contains("503"));
}

#[tokio::test]
async fn test_binary_partial_failures_still_exit_zero() {
    let server = gallery_server().await;
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(out.path())
        .args(["--min-width", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/3]"))
        .stdout(predicate::str::contains("[3/3]"))
        .stdout(predicate::str::contains(
            "Done: 1 succeeded, 1 failed, 1 filtered (3 total)",
        ));

    assert!(out.path().join("big.png").exists());
    assert!(!out.path().join("tiny.png").exists());
}

#[tokio::test]
async fn test_binary_creates_missing_output_directory() {
    let server = gallery_server().await;
    let config_home = TempDir::new().unwrap();
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("nested").join("images");

    imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Done: 2 succeeded, 1 failed, 0 filtered (3 total)"));

    assert!(out.join("big.png").exists());
    assert!(out.join("tiny.png").exists());
}

#[tokio::test]
async fn test_binary_config_file_supplies_bounds() {
    let server = gallery_server().await;
    let config_home = TempDir::new().unwrap();
    let dir = config_home.path().join("imgharvest");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "max_width = 100 # icons only\n").unwrap();
    let out = TempDir::new().unwrap();

    imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 succeeded, 1 failed, 1 filtered"));

    assert!(out.path().join("tiny.png").exists());
    assert!(!out.path().join("big.png").exists());
}

#[tokio::test]
async fn test_binary_json_output_reports_outcomes() {
    let server = gallery_server().await;
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let assert = imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(out.path())
        .arg("--json")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is pure JSON");
    assert_eq!(value["total"], 3);
    assert_eq!(value["succeeded"], 2);
    assert_eq!(value["failed"], 1);
    assert_eq!(value["outcomes"][2]["kind"], "failed");
}

#[tokio::test]
async fn test_binary_verbose_prints_item_detail() {
    let server = gallery_server().await;
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(out.path())
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains("(400x300)"))
        .stderr(predicate::str::contains("image failed"));
}

#[tokio::test]
async fn test_binary_verbose_keeps_dependency_debug_logs_out() {
    let server = MockServer::start().await;
    let page: String = (0..20)
        .map(|i| format!(r#"<div class="tile"><img src="/img/{i}.png" alt="tile {i}"></div>"#))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><head><title>tiles</title></head><body>{page}</body></html>"
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(png(8, 8)),
        )
        .mount(&server)
        .await;
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let assert = imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(out.path())
        .arg("-v")
        .assert()
        .success();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("image references found"), "stderr: {stderr}");
    assert!(!stderr.contains("html5ever"), "parser debug output leaked: {stderr}");
    assert!(!stderr.contains("hyper"), "client debug output leaked: {stderr}");
}

#[tokio::test]
async fn test_binary_no_verbose_overrides_config_file() {
    let server = gallery_server().await;
    let config_home = TempDir::new().unwrap();
    let dir = config_home.path().join("imgharvest");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "verbose = true\n").unwrap();
    let out = TempDir::new().unwrap();

    imgharvest(&config_home)
        .arg(format!("{}/", server.uri()))
        .arg(out.path())
        .arg("--no-verbose")
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/3]"))
        .stdout(predicate::str::contains("(400x300)").not());
}

#[cfg(not(feature = "render"))]
#[test]
fn test_binary_capture_without_browser_support_exit_one() {
    let config_home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    imgharvest(&config_home)
        .args(["https://example.com/", "--capture"])
        .arg(out.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--capture"));
}
