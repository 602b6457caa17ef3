// ABOUTME: Per-session conversation context — remote thread id and the local transcript.
// ABOUTME: Passed explicitly to every chat action; cleared on reset, dropped at exit.

use crate::session::message::Message;

/// The live state of one interactive conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Remote thread backing this conversation, created on first user input.
    pub thread_id: Option<String>,
    pub messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Forget both the remote thread and the transcript.
    pub fn reset(&mut self) {
        self.thread_id = None;
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
