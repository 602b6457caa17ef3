// ABOUTME: Typed errors for the assistant gateway and the saved-thread store.
// ABOUTME: Chat actions catch these at the action boundary and report them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    /// The remote run reached a terminal state other than `completed`.
    #[error("assistant run {status}{}", detail(.message))]
    RunFailed {
        status: String,
        message: Option<String>,
    },
    #[error("run still pending after {attempts} status checks")]
    PollTimeout { attempts: u32 },
    #[error("no API key configured (set OPENAI_API_KEY)")]
    MissingApiKey,
    #[error("no assistant id configured")]
    MissingAssistantId,
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("saved thread not found: {0}")]
    NotFound(String),
    #[error("saved thread {file} is malformed: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid saved thread name: {0:?}")]
    InvalidName(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Serialize(#[source] serde_json::Error),
}
