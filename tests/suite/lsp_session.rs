//! End-to-end language server sessions against a mock validation service.

use serde_json::Value;
use webvalidator_lsp::ExitReason;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    INVALID_PAGE, LspSession, bad_tag_message, mount_messages, options_for,
};

const PAGE_URI: &str = "file:///site/index.html";

fn non_empty(frame: &Value) -> bool {
    frame["params"]["diagnostics"]
        .as_array()
        .is_some_and(|d| !d.is_empty())
}

fn empty(frame: &Value) -> bool {
    frame["params"]["diagnostics"]
        .as_array()
        .is_some_and(Vec::is_empty)
}

#[tokio::test]
async fn validate_edit_and_shutdown() {
    let service = MockServer::start().await;
    mount_messages(&service, serde_json::json!([bad_tag_message()])).await;

    let mut session = LspSession::start(options_for(&service));
    let result = session.initialize(Value::Null).await;
    assert_eq!(result["capabilities"]["textDocumentSync"]["change"], 1);
    session.expect_status("idle").await;

    session.open(PAGE_URI, "html", INVALID_PAGE).await;
    let response = session
        .execute("webvalidator.startvalidation", serde_json::json!([]))
        .await;
    assert!(response["result"].is_null());
    session.expect_status("loading").await;

    let published = session
        .expect("textDocument/publishDiagnostics", non_empty)
        .await;
    assert_eq!(published["params"]["uri"], PAGE_URI);
    let diagnostic = &published["params"]["diagnostics"][0];
    assert_eq!(diagnostic["message"], "bad tag");
    assert_eq!(diagnostic["code"], "W3C_validation");
    assert_eq!(diagnostic["severity"], 1);
    assert_eq!(
        diagnostic["range"],
        serde_json::json!({
            "start": { "line": 2, "character": 4 },
            "end": { "line": 2, "character": 8 }
        })
    );

    let status = session.expect_status("has-issues").await;
    assert_eq!(status["params"]["items"][1]["visible"], true);

    let prompt = session.expect("window/showMessageRequest", |_| true).await;
    assert_eq!(
        prompt["params"]["message"],
        "This HTML document is not valid. (1 errors , 0 warnings)"
    );
    assert_eq!(
        prompt["params"]["actions"],
        serde_json::json!([{ "title": "Clear all" }])
    );
    session.respond(prompt["id"].clone(), Value::Null).await;

    // Editing another line keeps the diagnostic; editing line 3 drops it.
    session
        .change(PAGE_URI, 2, &INVALID_PAGE.replace("<p>ok</p>", "<p>fine</p>"))
        .await;
    session
        .change(PAGE_URI, 3, &INVALID_PAGE.replace("<bad>", "<b>"))
        .await;
    session.expect("textDocument/publishDiagnostics", empty).await;
    let status = session.expect_status("idle").await;
    assert_eq!(status["params"]["items"][1]["visible"], false);

    assert_eq!(
        session.shutdown().await,
        ExitReason::Exit {
            after_shutdown: true
        }
    );
}

#[tokio::test]
async fn clear_command_and_prompt_answer() {
    let service = MockServer::start().await;
    mount_messages(
        &service,
        serde_json::json!([
            bad_tag_message(),
            { "type": "info", "subType": "warning", "lastLine": 1, "hiliteStart": 1,
              "hiliteLength": 15, "message": "Consider adding a lang attribute" }
        ]),
    )
    .await;

    let mut session = LspSession::start(options_for(&service));
    session.initialize(Value::Null).await;
    session.open(PAGE_URI, "html", INVALID_PAGE).await;
    session
        .execute("webvalidator.startvalidation", serde_json::json!([PAGE_URI]))
        .await;

    let prompt = session.expect("window/showMessageRequest", |_| true).await;
    assert_eq!(prompt["params"]["actions"][1]["title"], "Clear warnings");
    session
        .respond(prompt["id"].clone(), serde_json::json!({ "title": "Clear warnings" }))
        .await;

    let published = session
        .expect("textDocument/publishDiagnostics", |f| {
            f["params"]["diagnostics"].as_array().map(Vec::len) == Some(1)
        })
        .await;
    assert_eq!(published["params"]["diagnostics"][0]["severity"], 1);

    session
        .execute("webvalidator.clearvalidation", serde_json::json!([]))
        .await;
    session.expect("textDocument/publishDiagnostics", empty).await;

    session.shutdown().await;
}

#[tokio::test]
async fn progress_is_shown_while_request_is_pending() {
    let service = MockServer::start().await;
    mount_messages(&service, serde_json::json!([bad_tag_message()])).await;

    let mut session = LspSession::start(options_for(&service));
    session
        .initialize_with(serde_json::json!({
            "capabilities": { "window": { "workDoneProgress": true } }
        }))
        .await;
    session.open(PAGE_URI, "html", INVALID_PAGE).await;
    session
        .execute("webvalidator.startvalidation", serde_json::json!([]))
        .await;

    let create = session
        .expect("window/workDoneProgress/create", |_| true)
        .await;
    let token = create["params"]["token"].clone();
    session.respond(create["id"].clone(), Value::Null).await;

    let begin = session
        .expect("$/progress", |f| f["params"]["value"]["kind"] == "begin")
        .await;
    assert_eq!(begin["params"]["token"], token);
    assert_eq!(begin["params"]["value"]["title"], "W3C validation ...");
    assert_eq!(begin["params"]["value"]["cancellable"], false);

    let end = session
        .expect("$/progress", |f| f["params"]["value"]["kind"] == "end")
        .await;
    assert_eq!(end["params"]["token"], token);
    session
        .expect("textDocument/publishDiagnostics", non_empty)
        .await;

    session.shutdown().await;
}

#[tokio::test]
async fn silent_success_reverts_status() {
    let service = MockServer::start().await;
    mount_messages(&service, serde_json::json!([])).await;

    let mut session = LspSession::start(options_for(&service));
    session
        .initialize(serde_json::json!({ "webvalidator": { "showPopup": false } }))
        .await;
    session.open("file:///site/style.css", "css", "p { color: red; }").await;
    session
        .execute("webvalidator.startvalidation", serde_json::json!([]))
        .await;

    let valid = session.expect_status("valid").await;
    assert_eq!(valid["params"]["items"][0]["text"], "$(pass) File is valid");
    let idle = session.expect_status("idle").await;
    assert_eq!(idle["params"]["items"][0]["text"], "$(pass) W3C validation");

    session.shutdown().await;
}

#[tokio::test]
async fn valid_document_shows_message() {
    let service = MockServer::start().await;
    mount_messages(&service, serde_json::json!([])).await;

    let mut session = LspSession::start(options_for(&service));
    session.initialize(Value::Null).await;
    session.open("file:///site/style.css", "CSS", "p { color: red; }").await;
    session
        .execute("webvalidator.startvalidation", serde_json::json!([]))
        .await;

    let shown = session.expect("window/showMessage", |_| true).await;
    assert_eq!(shown["params"]["type"], 3);
    assert_eq!(shown["params"]["message"], "This CSS file is valid !");

    session.shutdown().await;
}

#[tokio::test]
async fn unavailable_service_is_reported() {
    let service = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&service)
        .await;

    let mut session = LspSession::start(options_for(&service));
    session.initialize(Value::Null).await;
    session.open(PAGE_URI, "html", INVALID_PAGE).await;
    session
        .execute("webvalidator.startvalidation", serde_json::json!([]))
        .await;

    let shown = session.expect("window/showMessage", |_| true).await;
    assert_eq!(shown["params"]["type"], 1);
    assert_eq!(
        shown["params"]["message"],
        "W3C service currently unavailable. Please retry later..."
    );
    session.expect_status("idle").await;

    session.shutdown().await;
}

#[tokio::test]
async fn save_triggers_validation_when_enabled() {
    let service = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messages": [bad_tag_message()]
            })),
        )
        .expect(1)
        .mount(&service)
        .await;

    let mut session = LspSession::start(options_for(&service));
    session.initialize(Value::Null).await;
    session.open(PAGE_URI, "html", INVALID_PAGE).await;

    // Off by default: this save sends nothing.
    session
        .notify(
            "textDocument/didSave",
            serde_json::json!({ "textDocument": { "uri": PAGE_URI } }),
        )
        .await;

    session
        .notify(
            "workspace/didChangeConfiguration",
            serde_json::json!({ "settings": { "webvalidator": { "validateOnSave": true } } }),
        )
        .await;
    session
        .notify(
            "textDocument/didSave",
            serde_json::json!({ "textDocument": { "uri": PAGE_URI }, "text": INVALID_PAGE }),
        )
        .await;

    session
        .expect("textDocument/publishDiagnostics", non_empty)
        .await;
    session.shutdown().await;
}

#[tokio::test]
async fn requests_before_initialize_and_unknown_methods() {
    let service = MockServer::start().await;
    let mut session = LspSession::start(options_for(&service));

    let early = session.request("shutdown", Value::Null).await;
    assert_eq!(early["error"]["code"], -32002);

    session.initialize(Value::Null).await;
    let unknown = session
        .request("textDocument/completion", serde_json::json!({}))
        .await;
    assert_eq!(unknown["error"]["code"], -32601);

    session.shutdown().await;
}

#[tokio::test]
async fn closed_input_stops_server() {
    let service = MockServer::start().await;
    let mut session = LspSession::start(options_for(&service));
    session.initialize(Value::Null).await;

    assert_eq!(session.join().await, ExitReason::InputClosed);
}
