//! `webvalidator lsp` as a real process talking over stdio.

use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

fn spawn_server(home: &Path) -> Child {
    let config = home.join("config.toml");
    std::fs::write(&config, "").expect("write config");
    Command::new(env!("CARGO_BIN_EXE_webvalidator"))
        .current_dir(home)
        .env("HOME", home)
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .arg("lsp")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn webvalidator lsp")
}

fn send(stdin: &mut ChildStdin, frame: &serde_json::Value) {
    let body = frame.to_string();
    write!(stdin, "Content-Length: {}\r\n\r\n{body}", body.len()).expect("write frame");
    stdin.flush().expect("flush frame");
}

/// Wait for the process to exit while its stdin stays open.
fn wait_for_exit(child: &mut Child) -> Option<i32> {
    let started = Instant::now();
    while started.elapsed() < EXIT_TIMEOUT {
        if let Some(status) = child.try_wait().expect("poll child") {
            return status.code();
        }
        thread::sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    panic!("server still running {EXIT_TIMEOUT:?} after exit");
}

fn initialize(stdin: &mut ChildStdin) {
    send(
        stdin,
        &serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {} }),
    );
    send(
        stdin,
        &serde_json::json!({ "jsonrpc": "2.0", "method": "initialized", "params": {} }),
    );
}

#[test]
fn exits_after_shutdown_with_stdin_open() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = spawn_server(dir.path());
    let mut stdin = child.stdin.take().unwrap();

    initialize(&mut stdin);
    send(
        &mut stdin,
        &serde_json::json!({ "jsonrpc": "2.0", "id": 2, "method": "shutdown" }),
    );
    send(&mut stdin, &serde_json::json!({ "jsonrpc": "2.0", "method": "exit" }));

    assert_eq!(wait_for_exit(&mut child), Some(0));
    drop(stdin);
}

#[test]
fn exit_without_shutdown_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = spawn_server(dir.path());
    let mut stdin = child.stdin.take().unwrap();

    initialize(&mut stdin);
    send(&mut stdin, &serde_json::json!({ "jsonrpc": "2.0", "method": "exit" }));

    assert_eq!(wait_for_exit(&mut child), Some(1));
    drop(stdin);
}
