//! The language server: one event loop owning all session state.
//!
//! A reader task decodes frames from the editor, a writer task encodes
//! frames to it, and each validation runs in its own task. All of them
//! report to the loop through a single event channel, so the engine is
//! never shared or locked.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use webvalidator_client::ValidatorClient;
use webvalidator_config::{ClientSettings, EditorSettings};
use webvalidator_engine::{
    CLEAR_VALIDATION_COMMAND, Orchestrator, START_VALIDATION_COMMAND, SummaryAction, Trigger,
    ValidationTicket,
};
use webvalidator_types::{IssueMessage, TextDocument, ValidationFailure};

use crate::codec::{FrameReader, FrameWriter};
use crate::host::LspHost;
use crate::protocol::{
    self, ACTIVE_DOCUMENT_NOTIFICATION, ActiveDocumentParams, DidChangeParams, DidCloseParams,
    DidOpenParams, DidSaveParams, ExecuteCommandParams, Incoming, InitializeParams, error_codes,
};

pub(crate) enum WriterCommand {
    Send(Value),
    Shutdown,
}

pub(crate) enum Event {
    Frame(Value),
    /// A frame whose body was not JSON; the stream is still usable.
    ParseError(String),
    ReaderClosed,
    ValidationFinished {
        ticket: ValidationTicket,
        outcome: Result<Vec<IssueMessage>, ValidationFailure>,
    },
    StatusReset {
        generation: u64,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    pub client: ClientSettings,
    /// Starting editor settings; the editor may override them.
    pub editor: EditorSettings,
}

/// Why [`serve`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The editor sent `exit`.
    Exit { after_shutdown: bool },
    /// The input stream ended or became unreadable.
    InputClosed,
}

impl ExitReason {
    /// Process exit code: 1 only for `exit` without a prior `shutdown`.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Exit {
                after_shutdown: false,
            } => 1,
            Self::Exit {
                after_shutdown: true,
            }
            | Self::InputClosed => 0,
        }
    }
}

/// Serve over stdin/stdout.
pub async fn serve_stdio(options: ServerOptions) -> Result<ExitReason> {
    serve(tokio::io::stdin(), tokio::io::stdout(), options).await
}

/// Run a session until the editor exits or the input ends.
pub async fn serve<R, W>(input: R, output: W, options: ServerOptions) -> Result<ExitReason>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let client = ValidatorClient::new(&options.client).context("building validator client")?;
    tracing::info!(endpoint = %client.endpoint(), "Language server starting");

    let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<WriterCommand>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let writer_handle = tokio::spawn(async move {
        let mut writer = FrameWriter::new(output);
        while let Some(command) = writer_rx.recv().await {
            match command {
                WriterCommand::Send(frame) => {
                    if let Err(e) = writer.write_frame(&frame).await {
                        tracing::warn!("LSP write error: {e}");
                        break;
                    }
                }
                WriterCommand::Shutdown => break,
            }
        }
    });

    let reader_events = event_tx.clone();
    let reader_handle = tokio::spawn(async move {
        let mut reader = FrameReader::new(input);
        loop {
            match reader.read_frame().await {
                Ok(Some(frame)) => {
                    if reader_events.send(Event::Frame(frame)).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!("Editor closed the input stream");
                    let _ = reader_events.send(Event::ReaderClosed);
                    break;
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Skipping unreadable frame: {e}");
                    let _ = reader_events.send(Event::ParseError(e.to_string()));
                }
                Err(e) => {
                    tracing::warn!("LSP reader error: {e}");
                    let _ = reader_events.send(Event::ReaderClosed);
                    break;
                }
            }
        }
    });

    let host = LspHost::new(writer_tx.clone(), event_tx.clone());
    let mut server = Server::new(host, client, options.editor, event_tx);

    let reason = loop {
        let Some(event) = event_rx.recv().await else {
            break ExitReason::InputClosed;
        };
        if let Some(reason) = server.handle_event(event) {
            break reason;
        }
    };

    server.cancel_in_flight();
    let _ = writer_tx.send(WriterCommand::Shutdown);
    if let Err(e) = writer_handle.await {
        tracing::warn!("LSP writer task failed: {e}");
    }
    reader_handle.abort();

    tracing::info!(?reason, "Language server stopped");
    Ok(reason)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Running,
    ShutdownRequested,
}

struct Server {
    orchestrator: Orchestrator<LspHost>,
    client: ValidatorClient,
    documents: HashMap<String, TextDocument>,
    active: Option<String>,
    lifecycle: Lifecycle,
    in_flight: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<Event>,
}

fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> Option<T> {
    match serde_json::from_value(params) {
        Ok(params) => Some(params),
        Err(e) => {
            tracing::warn!("Invalid {method} params: {e}");
            None
        }
    }
}

impl Server {
    fn new(
        host: LspHost,
        client: ValidatorClient,
        settings: EditorSettings,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(host, settings),
            client,
            documents: HashMap::new(),
            active: None,
            lifecycle: Lifecycle::Uninitialized,
            in_flight: None,
            events,
        }
    }

    fn send(&self, frame: Value) {
        self.orchestrator.host().send(frame);
    }

    fn handle_event(&mut self, event: Event) -> Option<ExitReason> {
        match event {
            Event::Frame(frame) => return self.handle_frame(&frame),
            Event::ParseError(detail) => {
                self.send(protocol::error_response(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {detail}"),
                ));
            }
            Event::ReaderClosed => return Some(ExitReason::InputClosed),
            Event::ValidationFinished { ticket, outcome } => {
                if ticket.generation() == self.orchestrator.generation() {
                    self.in_flight = None;
                    self.orchestrator.host_mut().end_progress();
                }
                let live = self.documents.get(ticket.uri());
                self.orchestrator.finish_validation(&ticket, outcome, live);
            }
            Event::StatusReset { generation } => self.orchestrator.reset_status(generation),
        }
        None
    }

    fn handle_frame(&mut self, frame: &Value) -> Option<ExitReason> {
        let Some(incoming) = protocol::parse_incoming(frame) else {
            tracing::debug!("Rejecting malformed JSON-RPC frame");
            self.send(protocol::error_response(
                Value::Null,
                error_codes::INVALID_REQUEST,
                "Invalid request",
            ));
            return None;
        };

        match incoming {
            Incoming::Request { id, method, params } => {
                self.handle_request(id, &method, params);
                None
            }
            Incoming::Notification { method, params } => self.handle_notification(&method, params),
            Incoming::Response { id, result } => {
                self.handle_response(id, &result);
                None
            }
        }
    }

    // ── Requests ────────────────────────────────────────────────────────

    fn handle_request(&mut self, id: Value, method: &str, params: Value) {
        tracing::debug!(method, "Request");
        match (self.lifecycle, method) {
            (Lifecycle::Uninitialized, "initialize") => self.initialize(id, params),
            (Lifecycle::Uninitialized, _) => self.send(protocol::error_response(
                id,
                error_codes::SERVER_NOT_INITIALIZED,
                "Server not initialized",
            )),
            (Lifecycle::ShutdownRequested, _) => self.send(protocol::error_response(
                id,
                error_codes::INVALID_REQUEST,
                "Server is shutting down",
            )),
            (Lifecycle::Running, "initialize") => self.send(protocol::error_response(
                id,
                error_codes::INVALID_REQUEST,
                "Server already initialized",
            )),
            (Lifecycle::Running, "shutdown") => {
                self.cancel_in_flight();
                self.lifecycle = Lifecycle::ShutdownRequested;
                self.send(protocol::response(id, Value::Null));
            }
            (Lifecycle::Running, "workspace/executeCommand") => self.execute_command(id, params),
            (Lifecycle::Running, _) => self.send(protocol::error_response(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            )),
        }
    }

    fn initialize(&mut self, id: Value, params: Value) {
        let params: InitializeParams = serde_json::from_value(params).unwrap_or_default();
        if let Some(patch) = params
            .initialization_options
            .as_ref()
            .and_then(protocol::settings_patch)
        {
            let mut settings = self.orchestrator.settings();
            settings.apply(&patch);
            self.orchestrator.set_settings(settings);
        }
        self.orchestrator
            .host_mut()
            .set_progress_supported(params.supports_work_done_progress());

        self.lifecycle = Lifecycle::Running;
        self.send(protocol::response(id, protocol::initialize_result()));
        self.orchestrator.announce_status();
        tracing::info!("Client initialized");
    }

    fn execute_command(&mut self, id: Value, params: Value) {
        let params: ExecuteCommandParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                self.send(protocol::error_response(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid params: {e}"),
                ));
                return;
            }
        };

        match params.command.as_str() {
            START_VALIDATION_COMMAND => {
                let uri = params
                    .target_uri()
                    .map(str::to_string)
                    .or_else(|| self.active.clone());
                let document = uri.as_deref().and_then(|uri| self.documents.get(uri));
                if let Some(ticket) = self.orchestrator.start_validation(document, Trigger::Command)
                {
                    self.spawn_validation(ticket);
                }
            }
            CLEAR_VALIDATION_COMMAND => {
                self.cancel_in_flight();
                self.orchestrator.clear();
            }
            other => {
                self.send(protocol::error_response(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Unknown command: {other}"),
                ));
                return;
            }
        }
        self.send(protocol::response(id, Value::Null));
    }

    // ── Notifications ───────────────────────────────────────────────────

    fn handle_notification(&mut self, method: &str, params: Value) -> Option<ExitReason> {
        if method == "exit" {
            return Some(ExitReason::Exit {
                after_shutdown: self.lifecycle == Lifecycle::ShutdownRequested,
            });
        }
        if self.lifecycle == Lifecycle::Uninitialized {
            tracing::trace!(method, "Dropping notification before initialize");
            return None;
        }

        match method {
            "initialized" => tracing::debug!("Client reported initialized"),
            "textDocument/didOpen" => {
                if let Some(params) = parse_params(method, params) {
                    self.did_open(params);
                }
            }
            "textDocument/didChange" => {
                if let Some(params) = parse_params(method, params) {
                    self.did_change(params);
                }
            }
            "textDocument/didSave" => {
                if let Some(params) = parse_params(method, params) {
                    self.did_save(params);
                }
            }
            "textDocument/didClose" => {
                if let Some(params) = parse_params(method, params) {
                    self.did_close(params);
                }
            }
            "workspace/didChangeConfiguration" => self.did_change_configuration(&params),
            ACTIVE_DOCUMENT_NOTIFICATION => {
                if let Some(params) = parse_params::<ActiveDocumentParams>(method, params) {
                    self.set_active(params.uri);
                }
            }
            _ => tracing::trace!(method, "Ignoring notification"),
        }
        None
    }

    fn did_open(&mut self, params: DidOpenParams) {
        let item = params.text_document;
        let uri = item.uri.clone();
        tracing::debug!(uri = %uri, language_id = %item.language_id, "Document opened");
        self.documents.insert(
            uri.clone(),
            TextDocument::new(item.uri, item.language_id, item.version, item.text),
        );
        self.set_active(Some(uri));
    }

    fn did_change(&mut self, params: DidChangeParams) {
        let uri = params.text_document.uri.clone();
        let version = params.text_document.version;
        let Some(text) = params.full_text() else {
            tracing::warn!(uri = %uri, "Ignoring incremental change; full sync expected");
            return;
        };
        let Some(document) = self.documents.get_mut(&uri) else {
            tracing::debug!(uri = %uri, "Change for unknown document");
            return;
        };
        document.replace_text(text, version);
        self.orchestrator.on_document_changed(document);
        self.set_active(Some(uri));
    }

    fn did_save(&mut self, params: DidSaveParams) {
        let Some(document) = self.documents.get_mut(&params.text_document.uri) else {
            return;
        };
        if let Some(text) = params.text {
            let version = document.version();
            document.replace_text(text, version);
        }
        if let Some(ticket) = self.orchestrator.on_document_saved(document) {
            self.spawn_validation(ticket);
        }
    }

    fn did_close(&mut self, params: DidCloseParams) {
        let uri = params.text_document.uri;
        self.documents.remove(&uri);
        if self.orchestrator.on_document_closed(&uri) {
            self.cancel_in_flight();
        }
        if self.active.as_deref() == Some(uri.as_str()) {
            self.set_active(None);
        }
    }

    fn did_change_configuration(&mut self, params: &Value) {
        let Some(patch) = protocol::settings_patch(params) else {
            tracing::debug!("Configuration change without webvalidator settings");
            return;
        };
        let mut settings = self.orchestrator.settings();
        settings.apply(&patch);
        self.orchestrator.set_settings(settings);
    }

    fn set_active(&mut self, uri: Option<String>) {
        if self.active == uri {
            return;
        }
        self.active = uri;
        let document = self.active.as_deref().and_then(|uri| self.documents.get(uri));
        self.orchestrator.on_active_document_changed(document);
    }

    // ── Responses ───────────────────────────────────────────────────────

    fn handle_response(&mut self, id: Option<u64>, result: &Value) {
        let Some(prompt) = id.and_then(|id| self.orchestrator.host_mut().take_prompt(id)) else {
            tracing::debug!(?id, "Response to unknown request");
            return;
        };
        let Some(action) = protocol::chosen_action_title(result).and_then(SummaryAction::from_title)
        else {
            tracing::debug!("Summary prompt dismissed");
            return;
        };
        let document = self.documents.get(&prompt.uri);
        self.orchestrator
            .apply_summary_action(prompt.generation, action, document);
    }

    // ── Validation tasks ────────────────────────────────────────────────

    fn spawn_validation(&mut self, ticket: ValidationTicket) {
        self.cancel_in_flight();
        if self.orchestrator.settings().show_popup {
            self.orchestrator
                .host_mut()
                .begin_progress(ticket.generation());
        }
        let client = self.client.clone();
        let events = self.events.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = client.validate(ticket.text(), ticket.kind()).await;
            let _ = events.send(Event::ValidationFinished { ticket, outcome });
        }));
    }

    fn cancel_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.orchestrator.host_mut().end_progress();
    }
}
