//! [`Host`] implementation that turns engine callbacks into LSP frames.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use webvalidator_engine::{
    Host, MessageLevel, StatusPresenter, SummaryPrompt, TrackedDiagnostic, messages,
};

use crate::protocol::{self, Notification, Request, STATUS_NOTIFICATION};
use crate::server::{Event, WriterCommand};

/// A `window/showMessageRequest` we are waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingPrompt {
    pub generation: u64,
    pub uri: String,
}

pub(crate) struct LspHost {
    writer: mpsc::UnboundedSender<WriterCommand>,
    events: mpsc::UnboundedSender<Event>,
    next_request_id: u64,
    prompts: HashMap<u64, PendingPrompt>,
    progress_supported: bool,
    /// Token of the progress notification currently shown.
    progress: Option<String>,
}

impl LspHost {
    pub fn new(
        writer: mpsc::UnboundedSender<WriterCommand>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            writer,
            events,
            next_request_id: 1,
            prompts: HashMap::new(),
            progress_supported: false,
            progress: None,
        }
    }

    pub fn send(&self, frame: Value) {
        if self.writer.send(WriterCommand::Send(frame)).is_err() {
            tracing::debug!("Writer closed; dropping outgoing frame");
        }
    }

    fn notify(&self, method: &'static str, params: Value) {
        match serde_json::to_value(Notification::new(method, params)) {
            Ok(frame) => self.send(frame),
            Err(e) => tracing::warn!("Failed to serialize {method} notification: {e}"),
        }
    }

    /// Send a request to the editor, returning its id.
    fn request(&mut self, method: &'static str, params: Value) -> Option<u64> {
        let id = self.next_request_id;
        self.next_request_id += 1;
        match serde_json::to_value(Request::new(id, method, params)) {
            Ok(frame) => {
                self.send(frame);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Failed to serialize {method} request: {e}");
                None
            }
        }
    }

    /// Forget and return the prompt answered by response `id`.
    pub fn take_prompt(&mut self, id: u64) -> Option<PendingPrompt> {
        self.prompts.remove(&id)
    }

    pub fn set_progress_supported(&mut self, supported: bool) {
        self.progress_supported = supported;
    }

    /// Show a non-cancellable progress notification for validation
    /// `generation`, replacing any previous one.
    pub fn begin_progress(&mut self, generation: u64) {
        self.end_progress();
        if !self.progress_supported {
            return;
        }
        let token = format!("webvalidator/validation/{generation}");
        if self
            .request(
                "window/workDoneProgress/create",
                serde_json::json!({ "token": token }),
            )
            .is_none()
        {
            return;
        }
        self.notify(
            "$/progress",
            protocol::progress_begin_params(&token, messages::PROGRESS_TITLE),
        );
        self.progress = Some(token);
    }

    pub fn end_progress(&mut self) {
        if let Some(token) = self.progress.take() {
            self.notify("$/progress", protocol::progress_end_params(&token));
        }
    }
}

impl Host for LspHost {
    fn publish_diagnostics(&mut self, uri: &str, diagnostics: &[TrackedDiagnostic]) {
        tracing::debug!(uri, count = diagnostics.len(), "Publishing diagnostics");
        self.notify(
            "textDocument/publishDiagnostics",
            protocol::publish_diagnostics_params(uri, diagnostics),
        );
    }

    fn update_status(&mut self, status: &StatusPresenter) {
        self.notify(STATUS_NOTIFICATION, protocol::status_params(status));
    }

    fn show_message(&mut self, level: MessageLevel, text: &str) {
        self.notify(
            "window/showMessage",
            protocol::show_message_params(level.to_lsp(), text),
        );
    }

    fn show_prompt(&mut self, prompt: SummaryPrompt) {
        // Older prompts can no longer be acted on.
        self.prompts
            .retain(|_, pending| pending.generation >= prompt.generation);

        if let Some(id) = self.request(
            "window/showMessageRequest",
            protocol::show_prompt_params(&prompt),
        ) {
            self.prompts.insert(
                id,
                PendingPrompt {
                    generation: prompt.generation,
                    uri: prompt.uri,
                },
            );
        }
    }

    fn schedule_status_reset(&mut self, generation: u64, delay: Duration) {
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::StatusReset { generation });
        });
    }
}
