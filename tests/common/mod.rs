//! Shared test utilities and fixtures
//!
//! A mock validation service and an in-process language server session.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::Value;
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;
use webvalidator_lsp::{ExitReason, FrameReader, FrameWriter, ServerOptions};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Five lines; line 3 holds an unknown element.
pub const INVALID_PAGE: &str =
    "<!DOCTYPE html>\n<title>t</title>\n<p><bad></p>\n<p>ok</p>\n</html>\n";

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

pub fn endpoint(server: &MockServer) -> String {
    format!("{}/nu/?out=json", server.uri())
}

pub fn options_for(server: &MockServer) -> ServerOptions {
    ServerOptions {
        client: webvalidator_config::ClientSettings::with_endpoint(&endpoint(server))
            .expect("mock endpoint is valid"),
        ..ServerOptions::default()
    }
}

/// Answer every validation request with `messages`.
pub async fn mount_messages(server: &MockServer, messages: Value) {
    Mock::given(method("POST"))
        .and(path("/nu/"))
        .and(query_param("out", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": messages
        })))
        .mount(server)
        .await;
}

/// The single error the service reports for [`INVALID_PAGE`].
pub fn bad_tag_message() -> Value {
    serde_json::json!({
        "type": "error",
        "lastLine": 3,
        "hiliteStart": 5,
        "hiliteLength": 4,
        "message": "bad tag"
    })
}

/// An editor talking to `serve` over an in-memory pipe.
pub struct LspSession {
    writer: FrameWriter<DuplexStream>,
    reader: FrameReader<DuplexStream>,
    server: JoinHandle<anyhow::Result<ExitReason>>,
    next_id: u64,
    backlog: Vec<Value>,
}

impl LspSession {
    pub fn start(options: ServerOptions) -> Self {
        // One pipe per direction so dropping the editor's end reads as EOF.
        let (to_server, server_input) = tokio::io::duplex(1 << 16);
        let (server_output, from_server) = tokio::io::duplex(1 << 16);
        let server = tokio::spawn(webvalidator_lsp::serve(server_input, server_output, options));
        Self {
            writer: FrameWriter::new(to_server),
            reader: FrameReader::new(from_server),
            server,
            next_id: 1,
            backlog: Vec::new(),
        }
    }

    /// `initialize` + `initialized`, returning the initialize result.
    pub async fn initialize(&mut self, options: Value) -> Value {
        self.initialize_with(serde_json::json!({ "initializationOptions": options }))
            .await
    }

    /// Like [`Self::initialize`] with the full `initialize` params.
    pub async fn initialize_with(&mut self, params: Value) -> Value {
        let response = self.request("initialize", params).await;
        self.notify("initialized", serde_json::json!({})).await;
        response["result"].clone()
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.writer
            .write_frame(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params
            }))
            .await
            .expect("write notification");
    }

    /// Send a request and wait for its response. Frames seen on the way are
    /// kept for [`Self::expect`].
    pub async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        self.writer
            .write_frame(&serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params
            }))
            .await
            .expect("write request");

        loop {
            let frame = self.read().await;
            if frame.get("method").is_none() && frame["id"] == id {
                return frame;
            }
            self.backlog.push(frame);
        }
    }

    pub async fn respond(&mut self, id: Value, result: Value) {
        self.writer
            .write_frame(&serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result }))
            .await
            .expect("write response");
    }

    pub async fn open(&mut self, uri: &str, language_id: &str, text: &str) {
        self.notify(
            "textDocument/didOpen",
            serde_json::json!({ "textDocument": {
                "uri": uri, "languageId": language_id, "version": 1, "text": text
            }}),
        )
        .await;
    }

    pub async fn change(&mut self, uri: &str, version: i32, text: &str) {
        self.notify(
            "textDocument/didChange",
            serde_json::json!({
                "textDocument": { "uri": uri, "version": version },
                "contentChanges": [{ "text": text }]
            }),
        )
        .await;
    }

    pub async fn execute(&mut self, command: &str, arguments: Value) -> Value {
        self.request(
            "workspace/executeCommand",
            serde_json::json!({ "command": command, "arguments": arguments }),
        )
        .await
    }

    /// Next frame (backlog first) with the given method and matching
    /// `accept`. Frames skipped over are dropped.
    pub async fn expect(&mut self, method: &str, accept: impl Fn(&Value) -> bool) -> Value {
        if let Some(index) = self
            .backlog
            .iter()
            .position(|f| f["method"] == method && accept(f))
        {
            return self.backlog.remove(index);
        }
        loop {
            let frame = self.read().await;
            if frame["method"] == method && accept(&frame) {
                return frame;
            }
        }
    }

    pub async fn expect_status(&mut self, state: &str) -> Value {
        self.expect("webvalidator/status", |f| f["params"]["state"] == state)
            .await
    }

    async fn read(&mut self) -> Value {
        tokio::time::timeout(FRAME_TIMEOUT, self.reader.read_frame())
            .await
            .expect("timed out waiting for a frame")
            .expect("read frame")
            .expect("server closed the stream")
    }

    /// Send `shutdown` and `exit`, then wait for the server to stop.
    pub async fn shutdown(mut self) -> ExitReason {
        let response = self.request("shutdown", Value::Null).await;
        assert!(response["result"].is_null(), "shutdown failed: {response}");
        self.notify("exit", Value::Null).await;
        self.join().await
    }

    pub async fn join(self) -> ExitReason {
        drop(self.writer);
        tokio::time::timeout(FRAME_TIMEOUT, self.server)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server failed")
    }
}
