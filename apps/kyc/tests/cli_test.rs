//! File loading and the `kyc-verify` binary.

mod common;

use std::path::Path;

use common::MockService;
use kyc_wizard::test_support::{jpeg_bytes, padded, png_bytes};
use kyc_wizard::{ImageFile, precheck};
use serde_json::{Value, json};
use tempfile::TempDir;

fn write_fixtures(dir: &Path) {
    std::fs::write(dir.join("id.png"), padded(png_bytes(400, 400), 200_000)).unwrap();
    std::fs::write(dir.join("selfie.JPG"), padded(jpeg_bytes(400, 400), 200_000)).unwrap();
    std::fs::write(dir.join("tiny.png"), png_bytes(50, 50)).unwrap();
    std::fs::write(dir.join("notes.txt"), b"hello").unwrap();
}

async fn kyc_verify(base_url: &str, args: &[&str]) -> std::process::Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_kyc-verify"))
        .arg("--base-url")
        .arg(base_url)
        .args(args)
        .env_remove("KYC_EMAIL")
        .env_remove("APP_ENV")
        .env_remove("NODE_ENV")
        .env_remove("RUST_ENV")
        .output()
        .await
        .unwrap()
}

// ============================================================================
// ImageFile::from_path
// ============================================================================

/// Content type comes from the extension, case-insensitively.
#[test]
fn from_path_derives_content_type() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    let id = ImageFile::from_path(&dir.path().join("id.png")).unwrap();
    assert_eq!(id.file_name(), "id.png");
    assert_eq!(id.content_type(), "image/png");
    assert_eq!(id.size(), 200_000);

    let selfie = ImageFile::from_path(&dir.path().join("selfie.JPG")).unwrap();
    assert_eq!(selfie.content_type(), "image/jpeg");

    let notes = ImageFile::from_path(&dir.path().join("notes.txt")).unwrap();
    assert_eq!(notes.content_type(), "application/octet-stream");
    assert!(precheck::validate(&notes).has(kyc_wizard::PrecheckIssue::UnsupportedFormat));

    assert!(ImageFile::from_path(&dir.path().join("missing.png")).is_err());
}

// ============================================================================
// Binary
// ============================================================================

/// A verified identity prints the outcome and exits zero.
#[tokio::test]
async fn cli_success_json() {
    let mock = MockService::start().await;
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    let output = kyc_verify(
        &mock.base_url,
        &[
            "--email",
            "user@example.com",
            "--id-image",
            dir.path().join("id.png").to_str().unwrap(),
            "--selfie",
            dir.path().join("selfie.JPG").to_str().unwrap(),
            "--json",
        ],
    )
    .await;

    assert!(output.status.success());
    let outcome: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome, json!({ "status": "success", "similarity_percent": 87.5 }));
    assert_eq!(mock.kyc_calls(), 1);
}

/// A rejected verification prints the reason and exits non-zero.
#[tokio::test]
async fn cli_rejection_exits_nonzero() {
    let mock = MockService::start().await;
    mock.reply_kyc(
        axum::http::StatusCode::OK,
        json!({ "success": true, "verified": false, "message": "Faces do not match" }),
    );
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    let output = kyc_verify(
        &mock.base_url,
        &[
            "--email",
            "user@example.com",
            "--id-image",
            dir.path().join("id.png").to_str().unwrap(),
            "--selfie",
            dir.path().join("selfie.JPG").to_str().unwrap(),
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "Faces do not match");
}

/// Local validation failures never reach the service.
#[tokio::test]
async fn cli_invalid_input_makes_no_request() {
    let mock = MockService::start().await;
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    let selfie = dir.path().join("selfie.JPG");

    let output = kyc_verify(
        &mock.base_url,
        &[
            "--email",
            "not-an-email",
            "--id-image",
            dir.path().join("id.png").to_str().unwrap(),
            "--selfie",
            selfie.to_str().unwrap(),
        ],
    )
    .await;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Please enter a valid email address"));

    let output = kyc_verify(
        &mock.base_url,
        &[
            "--email",
            "user@example.com",
            "--id-image",
            dir.path().join("tiny.png").to_str().unwrap(),
            "--selfie",
            selfie.to_str().unwrap(),
        ],
    )
    .await;
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Image must be at least 300x300 pixels"));

    assert_eq!(mock.api_key_calls(), 0);
    assert_eq!(mock.kyc_calls(), 0);
}

/// An unusable base URL is a configuration error.
#[tokio::test]
async fn cli_rejects_bad_base_url() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    let output = kyc_verify(
        "ftp://example.com",
        &[
            "--email",
            "user@example.com",
            "--id-image",
            dir.path().join("id.png").to_str().unwrap(),
            "--selfie",
            dir.path().join("selfie.JPG").to_str().unwrap(),
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(2));
}
