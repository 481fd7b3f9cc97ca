//! Status items shown by the host (status bar entries in most editors).

use std::fmt;

use crate::messages::VALID_STATUS_TEXT;

/// Icon codes use the `$(name)` syntax most editors understand.
pub const VALIDATE_ICON: &str = "$(pass)";
pub const LOADING_ICON: &str = "$(sync~spin)";
pub const CLEAR_ICON: &str = "$(notifications-clear)";

pub const START_VALIDATION_COMMAND: &str = "webvalidator.startvalidation";
pub const CLEAR_VALIDATION_COMMAND: &str = "webvalidator.clearvalidation";

/// What the validate item currently conveys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusState {
    #[default]
    Idle,
    Loading,
    Valid,
    HasIssues,
}

impl StatusState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Valid => "valid",
            Self::HasIssues => "has-issues",
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusItem {
    id: &'static str,
    default_text: &'static str,
    default_icon: &'static str,
    tooltip: &'static str,
    command: &'static str,
    text: String,
    visible: bool,
}

impl StatusItem {
    fn new(
        id: &'static str,
        default_text: &'static str,
        default_icon: &'static str,
        tooltip: &'static str,
        command: &'static str,
        visible: bool,
    ) -> Self {
        let mut item = Self {
            id,
            default_text,
            default_icon,
            tooltip,
            command,
            text: String::new(),
            visible,
        };
        item.set_content(None, None);
        item
    }

    /// Render `"{icon} {text}"`, each part falling back to its default.
    pub fn set_content(&mut self, text: Option<&str>, icon: Option<&str>) {
        let text = text.unwrap_or(self.default_text);
        let icon = icon.unwrap_or(self.default_icon);
        self.text = format!("{icon} {text}").trim().to_string();
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[must_use]
    pub fn id(&self) -> &'static str {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn tooltip(&self) -> &'static str {
        self.tooltip
    }

    #[must_use]
    pub fn command(&self) -> &'static str {
        self.command
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// The validate and clear items plus the derived [`StatusState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPresenter {
    validate: StatusItem,
    clear: StatusItem,
    state: StatusState,
}

impl Default for StatusPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validate: StatusItem::new(
                "validate",
                "W3C validation",
                VALIDATE_ICON,
                "Validate the current file with the W3C service",
                START_VALIDATION_COMMAND,
                true,
            ),
            clear: StatusItem::new(
                "clear",
                "Clear W3C validation",
                CLEAR_ICON,
                "Remove all W3C diagnostics",
                CLEAR_VALIDATION_COMMAND,
                false,
            ),
            state: StatusState::Idle,
        }
    }

    #[must_use]
    pub fn validate_item(&self) -> &StatusItem {
        &self.validate
    }

    #[must_use]
    pub fn clear_item(&self) -> &StatusItem {
        &self.clear
    }

    #[must_use]
    pub fn state(&self) -> StatusState {
        self.state
    }

    pub(crate) fn show_loading(&mut self) {
        self.validate.set_content(Some("Loading"), Some(LOADING_ICON));
        self.state = StatusState::Loading;
    }

    pub(crate) fn show_idle(&mut self) {
        self.validate.set_content(None, None);
        self.state = StatusState::Idle;
    }

    /// `transient` shows [`VALID_STATUS_TEXT`] until the host resets the status.
    pub(crate) fn show_valid(&mut self, transient: bool) {
        if transient {
            self.validate.set_content(Some(VALID_STATUS_TEXT), None);
        } else {
            self.validate.set_content(None, None);
        }
        self.state = StatusState::Valid;
    }

    pub(crate) fn show_has_issues(&mut self) {
        self.validate.set_content(None, None);
        self.state = StatusState::HasIssues;
    }

    pub(crate) fn set_clear_visible(&mut self, visible: bool) {
        self.clear.set_visible(visible);
    }

    /// Blank the validate text while the active document cannot be
    /// validated. Leaves a running validation's loading text alone.
    pub(crate) fn reflect_document(&mut self, supported: bool) {
        if self.state == StatusState::Loading {
            return;
        }
        if supported {
            self.validate.set_content(None, None);
        } else {
            self.validate.set_content(Some(""), None);
        }
    }
}
