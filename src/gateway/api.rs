// ABOUTME: The remote assistant API seam — threads, messages, and runs.
// ABOUTME: Wire types mirror the Assistants v2 JSON shapes the gateway consumes.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::GatewayError;
use crate::session::Role;

/// Lifecycle states a remote run moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run will make no further progress on its own.
    ///
    /// `requires_action` counts as terminal: this client never submits tool
    /// outputs, so such a run would otherwise sit until it expires.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
                | RunStatus::RequiresAction
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<RunError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextValue {
    pub value: String,
}

/// One content block of a thread message. Only text blocks are surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThreadMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl ThreadMessage {
    /// Text of the first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|part| match part {
            ContentPart::Text { text } => Some(text.value.as_str()),
            ContentPart::Other => None,
        })
    }
}

/// Operations the gateway needs from the hosted assistant service.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create an empty thread and return its id.
    async fn create_thread(&self) -> Result<String, GatewayError>;

    /// Append a user-authored message to a thread.
    async fn create_message(&self, thread_id: &str, content: &str) -> Result<(), GatewayError>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, GatewayError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, GatewayError>;

    /// Messages of a thread, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, GatewayError>;
}
