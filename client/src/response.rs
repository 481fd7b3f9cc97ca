//! Wire format of the validator's JSON output.

use serde::Deserialize;

use webvalidator_types::{IssueMessage, MessageKind, ValidationFailure};

#[derive(Debug, Deserialize)]
struct ValidatorResponse {
    messages: Vec<WireMessage>,
}

/// One entry of `messages`. The service omits location fields for messages
/// that are not tied to the document, so they default to 0.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    last_line: u32,
    #[serde(default)]
    hilite_start: u32,
    #[serde(default)]
    hilite_length: u32,
    #[serde(default)]
    message: String,
}

impl WireMessage {
    fn into_issue(self) -> IssueMessage {
        IssueMessage::new(
            MessageKind::parse(&self.kind),
            self.last_line,
            self.hilite_start,
            self.hilite_length,
            self.message,
        )
    }
}

pub(crate) fn parse_messages(body: &[u8]) -> Result<Vec<IssueMessage>, ValidationFailure> {
    let parsed: ValidatorResponse =
        serde_json::from_slice(body).map_err(|e| ValidationFailure::MalformedResponse {
            detail: e.to_string(),
        })?;
    Ok(parsed
        .messages
        .into_iter()
        .map(WireMessage::into_issue)
        .collect())
}
