// ABOUTME: Assistant gateway — creates threads, posts user messages, runs the assistant,
// ABOUTME: and waits for the run to finish before pulling the newest assistant reply.

pub mod api;
pub mod openai;
pub mod poll;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::GatewayError;
use crate::session::Role;

pub use api::{AssistantApi, ContentPart, Run, RunError, RunStatus, TextValue, ThreadMessage};
pub use openai::OpenAiAssistants;
pub use poll::{PollPolicy, Polled, poll_until};

/// Text shown when a run completes without producing an assistant message.
pub const NO_RESPONSE: &str = "No response from assistant";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Everything the gateway needs to talk to one assistant.
#[derive(Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
    pub assistant_id: String,
    pub poll: PollPolicy,
    /// Per-request HTTP timeout; does not bound the poll loop as a whole.
    pub request_timeout: Duration,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("assistant_id", &self.assistant_id)
            .field("poll", &self.poll)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    NoResponse,
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(text) => text,
            Reply::NoResponse => NO_RESPONSE,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Text(text) => text,
            Reply::NoResponse => NO_RESPONSE.to_string(),
        }
    }
}

pub struct Gateway {
    api: Arc<dyn AssistantApi>,
    assistant_id: String,
    poll: PollPolicy,
}

impl Gateway {
    /// Build a gateway backed by the hosted HTTP API.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        if config.api_key.trim().is_empty() {
            return Err(GatewayError::MissingApiKey);
        }
        if config.assistant_id.trim().is_empty() {
            return Err(GatewayError::MissingAssistantId);
        }
        let api = OpenAiAssistants::new(&config)?;
        Ok(Self::with_api(Arc::new(api), config.assistant_id, config.poll))
    }

    /// Build a gateway over any API implementation.
    pub fn with_api(
        api: Arc<dyn AssistantApi>,
        assistant_id: impl Into<String>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            api,
            assistant_id: assistant_id.into(),
            poll,
        }
    }

    pub fn assistant_id(&self) -> &str {
        &self.assistant_id
    }

    /// Open a new remote conversation.
    pub async fn create_conversation(&self) -> Result<String, GatewayError> {
        let id = self.api.create_thread().await?;
        tracing::debug!(thread_id = %id, "created thread");
        Ok(id)
    }

    /// Post a user message to the conversation.
    pub async fn append_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.api.create_message(conversation_id, text).await?;
        tracing::debug!(thread_id = %conversation_id, chars = text.len(), "appended user message");
        Ok(())
    }

    /// Start a run and wait for it to settle, then return the newest assistant reply.
    ///
    /// A run that ends in any state other than `completed` yields
    /// [`GatewayError::RunFailed`].
    pub async fn run_and_await_reply(&self, conversation_id: &str) -> Result<Reply, GatewayError> {
        let run = self
            .api
            .create_run(conversation_id, &self.assistant_id)
            .await?;
        let run_id = run.id.clone();
        tracing::debug!(
            thread_id = %conversation_id,
            run_id = %run_id,
            status = run.status.as_str(),
            "started run"
        );

        let polled = poll_until(
            &self.poll,
            run,
            || self.api.retrieve_run(conversation_id, &run_id),
            |run: &Run| run.status.is_terminal(),
        )
        .await?;

        let run = match polled {
            Polled::Terminal(run) => run,
            Polled::Exhausted { attempts, last } => {
                tracing::warn!(
                    run_id = %run_id,
                    attempts,
                    status = last.status.as_str(),
                    "gave up waiting for run"
                );
                return Err(GatewayError::PollTimeout { attempts });
            }
        };

        if run.status != RunStatus::Completed {
            tracing::warn!(run_id = %run_id, status = run.status.as_str(), "run did not complete");
            return Err(GatewayError::RunFailed {
                status: run.status.as_str().to_string(),
                message: run.last_error.map(|e| e.message),
            });
        }

        let messages = self.api.list_messages(conversation_id).await?;
        Ok(latest_assistant_reply(&messages))
    }
}

/// Pick the newest assistant message from a newest-first listing.
fn latest_assistant_reply(messages: &[ThreadMessage]) -> Reply {
    messages
        .iter()
        .find(|m| m.role == Role::Assistant)
        .and_then(ThreadMessage::first_text)
        .map(|text| Reply::Text(text.to_string()))
        .unwrap_or(Reply::NoResponse)
}
