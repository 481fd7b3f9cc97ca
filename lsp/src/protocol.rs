//! JSON-RPC message shapes exchanged with the editor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use webvalidator_config::EditorSettingsPatch;
use webvalidator_engine::{
    CLEAR_VALIDATION_COMMAND, START_VALIDATION_COMMAND, StatusItem, StatusPresenter,
    SummaryPrompt, TrackedDiagnostic,
};

/// `code` attached to every published diagnostic.
pub const DIAGNOSTIC_CODE: &str = "W3C_validation";

/// Custom notification carrying the status items.
pub const STATUS_NOTIFICATION: &str = "webvalidator/status";

/// Custom notification the editor sends when focus moves to another document.
pub const ACTIVE_DOCUMENT_NOTIFICATION: &str = "webvalidator/didChangeActiveDocument";

pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const SERVER_NOT_INITIALIZED: i64 = -32002;
}

#[derive(Debug, Serialize)]
pub(crate) struct Request {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: Value,
}

impl Request {
    pub fn new(id: u64, method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl Notification {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

pub(crate) fn response(id: Value, result: Value) -> Value {
    serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub(crate) fn error_response(id: Value, code: i64, message: impl Into<String>) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message.into() }
    })
}

/// A decoded frame from the editor.
#[derive(Debug, PartialEq)]
pub(crate) enum Incoming {
    Request {
        id: Value,
        method: String,
        params: Value,
    },
    Notification {
        method: String,
        params: Value,
    },
    /// Reply to one of our requests (`window/showMessageRequest`).
    Response { id: Option<u64>, result: Value },
}

pub(crate) fn parse_incoming(frame: &Value) -> Option<Incoming> {
    let id = frame.get("id").filter(|id| !id.is_null());
    let method = frame.get("method").and_then(Value::as_str).map(String::from);
    let params = frame.get("params").cloned().unwrap_or(Value::Null);

    match (id, method) {
        (Some(id), Some(method)) => Some(Incoming::Request {
            id: id.clone(),
            method,
            params,
        }),
        (None, Some(method)) => Some(Incoming::Notification { method, params }),
        (Some(id), None) if frame.get("result").is_some() || frame.get("error").is_some() => {
            Some(Incoming::Response {
                id: id.as_u64(),
                result: frame.get("result").cloned().unwrap_or(Value::Null),
            })
        }
        _ => None,
    }
}

// ── Incoming params ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeParams {
    #[serde(default)]
    pub initialization_options: Option<Value>,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
}

impl InitializeParams {
    /// The editor accepts server-initiated `window/workDoneProgress/create`.
    pub fn supports_work_done_progress(&self) -> bool {
        self.capabilities
            .window
            .as_ref()
            .is_some_and(|window| window.work_done_progress)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ClientCapabilities {
    #[serde(default)]
    pub window: Option<WindowCapabilities>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WindowCapabilities {
    #[serde(default)]
    pub work_done_progress: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDocumentItem {
    pub uri: String,
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextDocumentIdentifier {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionedTextDocumentIdentifier {
    pub uri: String,
    pub version: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidOpenParams {
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentChange {
    #[serde(default)]
    pub range: Option<Value>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidChangeParams {
    pub text_document: VersionedTextDocumentIdentifier,
    pub content_changes: Vec<ContentChange>,
}

impl DidChangeParams {
    /// Full text after the change. Incremental changes are not supported;
    /// the last full-document change wins.
    pub fn full_text(self) -> Option<String> {
        self.content_changes
            .into_iter()
            .rev()
            .find(|change| change.range.is_none())
            .map(|change| change.text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidSaveParams {
    pub text_document: TextDocumentIdentifier,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidCloseParams {
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExecuteCommandParams {
    pub command: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl ExecuteCommandParams {
    /// Optional first argument: the URI of the document to act on.
    pub fn target_uri(&self) -> Option<&str> {
        self.arguments.first().and_then(Value::as_str)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveDocumentParams {
    #[serde(default)]
    pub uri: Option<String>,
}

/// Editor settings from `workspace/didChangeConfiguration` or
/// `initializationOptions`. Accepts both `{ "webvalidator": {...} }` and the
/// bare settings object.
pub(crate) fn settings_patch(value: &Value) -> Option<EditorSettingsPatch> {
    let scoped = value.get("settings").unwrap_or(value);
    let scoped = scoped.get("webvalidator").unwrap_or(scoped);
    if !scoped.is_object() {
        return None;
    }
    serde_json::from_value(scoped.clone()).ok()
}

// ── Outgoing params ──────────────────────────────────────────────────────

pub(crate) fn initialize_result() -> Value {
    serde_json::json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": 1,
                "save": { "includeText": true }
            },
            "executeCommandProvider": {
                "commands": [START_VALIDATION_COMMAND, CLEAR_VALIDATION_COMMAND]
            }
        },
        "serverInfo": {
            "name": "webvalidator",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

pub(crate) fn publish_diagnostics_params(uri: &str, diagnostics: &[TrackedDiagnostic]) -> Value {
    let diagnostics: Vec<Value> = diagnostics
        .iter()
        .map(|d| {
            serde_json::json!({
                "range": d.range(),
                "severity": d.severity().to_lsp(),
                "code": DIAGNOSTIC_CODE,
                "source": d.source(),
                "message": d.message()
            })
        })
        .collect();
    serde_json::json!({ "uri": uri, "diagnostics": diagnostics })
}

fn status_item(item: &StatusItem) -> Value {
    serde_json::json!({
        "id": item.id(),
        "text": item.text(),
        "tooltip": item.tooltip(),
        "command": item.command(),
        "visible": item.is_visible()
    })
}

pub(crate) fn status_params(status: &StatusPresenter) -> Value {
    serde_json::json!({
        "state": status.state().as_str(),
        "items": [status_item(status.validate_item()), status_item(status.clear_item())]
    })
}

pub(crate) fn show_message_params(message_type: u8, text: &str) -> Value {
    serde_json::json!({ "type": message_type, "message": text })
}

pub(crate) fn show_prompt_params(prompt: &SummaryPrompt) -> Value {
    let actions: Vec<Value> = prompt
        .actions
        .iter()
        .map(|action| serde_json::json!({ "title": action.title() }))
        .collect();
    serde_json::json!({ "type": 1, "message": prompt.text, "actions": actions })
}

pub(crate) fn progress_begin_params(token: &str, title: &str) -> Value {
    serde_json::json!({
        "token": token,
        "value": { "kind": "begin", "title": title, "cancellable": false }
    })
}

pub(crate) fn progress_end_params(token: &str) -> Value {
    serde_json::json!({ "token": token, "value": { "kind": "end" } })
}

/// Title of the chosen `MessageActionItem`, if any.
pub(crate) fn chosen_action_title(result: &Value) -> Option<&str> {
    result.get("title").and_then(Value::as_str)
}
