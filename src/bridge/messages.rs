use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::config::Settings;
use crate::toc::TocStatus;

/// Messages exchanged between pages, the popup and the background process.
///
/// Serialized as `{"type": "GET_SETTINGS", ...payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Ask the background for the merged settings
    GetSettings,
    /// Persist new settings and notify every other page
    UpdateSettings { settings: Settings },
    /// Broadcast from the background after an update
    SettingsUpdated { settings: Settings },
    /// Ask a page for its table of contents status
    GetTocStatus,
    /// Ask a page to rebuild its table of contents now
    RefreshToc,
    /// Diagnostic from a page; no reply expected
    ReportError { error: String },
}

impl Message {
    /// Wire name of the message type
    pub fn kind(&self) -> &'static str {
        match self {
            Message::GetSettings => "GET_SETTINGS",
            Message::UpdateSettings { .. } => "UPDATE_SETTINGS",
            Message::SettingsUpdated { .. } => "SETTINGS_UPDATED",
            Message::GetTocStatus => "GET_TOC_STATUS",
            Message::RefreshToc => "REFRESH_TOC",
            Message::ReportError { .. } => "REPORT_ERROR",
        }
    }
}

/// Success flag with an optional error description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Outcome { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Outcome {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Response to a [`Message`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Status(TocStatus),
    Outcome(Outcome),
    Settings(Settings),
}

/// A message plus the channel its reply goes back on, if the sender waits for one
#[derive(Debug)]
pub struct Envelope {
    pub message: Message,
    pub reply: Option<oneshot::Sender<Reply>>,
}

impl Envelope {
    /// Message whose sender does not wait for a reply
    pub fn notify(message: Message) -> Self {
        Envelope { message, reply: None }
    }

    /// Message with a reply channel
    pub fn request(message: Message) -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (Envelope { message, reply: Some(tx) }, rx)
    }

    /// Answer the sender; a sender that stopped waiting is ignored
    pub fn respond(self, reply: Reply) {
        if let Some(tx) = self.reply {
            let _ = tx.send(reply);
        }
    }
}
