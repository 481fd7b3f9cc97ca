//! The `check` subcommand run as a real process.

use std::path::Path;
use std::process::{Command, Output};

use wiremock::MockServer;

use crate::common::{INVALID_PAGE, bad_tag_message, endpoint, mount_messages};

async fn run_check(home: &Path, args: Vec<String>) -> Output {
    let home = home.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let config = home.join("config.toml");
        std::fs::write(&config, "").expect("write config");
        Command::new(env!("CARGO_BIN_EXE_webvalidator"))
            .current_dir(&home)
            .env("HOME", &home)
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&config)
            .arg("check")
            .args(args)
            .output()
            .expect("run webvalidator")
    })
    .await
    .expect("check task panicked")
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_page_exits_with_issues() {
    let service = MockServer::start().await;
    mount_messages(&service, serde_json::json!([bad_tag_message()])).await;

    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("index.html");
    std::fs::write(&page, INVALID_PAGE).unwrap();

    let output = run_check(
        dir.path(),
        vec![
            "--endpoint".to_string(),
            endpoint(&service),
            page.display().to_string(),
        ],
    )
    .await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(1), "stdout: {stdout}");
    assert!(stdout.contains(":3:5: error: bad tag"), "{stdout}");
    assert!(
        stdout.contains("This HTML document is not valid. (1 errors , 0 warnings)"),
        "{stdout}"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn quiet_valid_stylesheet_exits_cleanly() {
    let service = MockServer::start().await;
    mount_messages(&service, serde_json::json!([])).await;

    let dir = tempfile::tempdir().unwrap();
    let sheet = dir.path().join("style.css");
    std::fs::write(&sheet, "p { color: red; }\n").unwrap();

    let output = run_check(
        dir.path(),
        vec![
            "-q".to_string(),
            "--endpoint".to_string(),
            endpoint(&service),
            sheet.display().to_string(),
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unsupported_file_is_a_failure() {
    let service = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let notes = dir.path().join("notes.txt");
    std::fs::write(&notes, "plain text").unwrap();

    let output = run_check(
        dir.path(),
        vec![
            "--endpoint".to_string(),
            endpoint(&service),
            notes.display().to_string(),
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("notes.txt: warning:"), "{stdout}");
    assert!(
        service.received_requests().await.unwrap_or_default().is_empty(),
        "unsupported files must not reach the service"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_file_is_a_failure() {
    let service = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let output = run_check(
        dir.path(),
        vec![
            "--endpoint".to_string(),
            endpoint(&service),
            dir.path().join("gone.html").display().to_string(),
        ],
    )
    .await;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("gone.html: error:"));
}
