// ABOUTME: Chat actions — one function per user action over an explicit session context.
// ABOUTME: Failures are reported and the action yields an empty result; nothing propagates.

use std::fmt::Display;

use crate::gateway::Gateway;
use crate::session::{Message, Session, ThreadStore};

/// Where action outcomes are shown to the user.
pub trait Reporter {
    fn info(&mut self, message: &str);
    fn warn(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

fn report_error(reporter: &mut dyn Reporter, action: &str, err: &dyn Display) {
    tracing::error!(action, error = %err, "chat action failed");
    reporter.error(&format!("Error {action}: {err}"));
}

/// Send one user utterance and wait for the assistant's answer.
///
/// The user message joins the transcript before any remote call, so it stays
/// visible even when the gateway fails. Returns the assistant message that was
/// appended, if any.
pub async fn send(
    gateway: &Gateway,
    session: &mut Session,
    text: &str,
    reporter: &mut dyn Reporter,
) -> Option<Message> {
    if text.trim().is_empty() {
        return None;
    }
    session.push(Message::user(text));

    let thread_id = match &session.thread_id {
        Some(id) => id.clone(),
        None => match gateway.create_conversation().await {
            Ok(id) => {
                session.thread_id = Some(id.clone());
                id
            }
            Err(e) => {
                report_error(reporter, "creating thread", &e);
                return None;
            }
        },
    };

    if let Err(e) = gateway.append_message(&thread_id, text).await {
        report_error(reporter, "adding message", &e);
        return None;
    }

    match gateway.run_and_await_reply(&thread_id).await {
        Ok(reply) => {
            let message = Message::assistant(reply.into_text());
            session.push(message.clone());
            Some(message)
        }
        Err(e) => {
            report_error(reporter, "running assistant", &e);
            None
        }
    }
}

/// Start over: the next message opens a fresh remote thread.
pub fn reset(session: &mut Session, reporter: &mut dyn Reporter) {
    session.reset();
    tracing::info!("conversation reset");
    reporter.info("Conversation reset!");
}

/// Snapshot the transcript to disk. Returns the saved filename.
pub fn save(store: &ThreadStore, session: &Session, reporter: &mut dyn Reporter) -> Option<String> {
    if session.is_empty() {
        reporter.warn("No messages to save!");
        return None;
    }
    match store.save(session.thread_id.as_deref(), &session.messages) {
        Ok(filename) => {
            reporter.info(&format!(
                "Thread saved: {}",
                store.dir().join(&filename).display()
            ));
            Some(filename)
        }
        Err(e) => {
            report_error(reporter, "saving thread", &e);
            None
        }
    }
}

/// Saved filenames, newest first; empty on error.
pub fn list(store: &ThreadStore, reporter: &mut dyn Reporter) -> Vec<String> {
    match store.list() {
        Ok(names) => names,
        Err(e) => {
            report_error(reporter, "listing saved threads", &e);
            Vec::new()
        }
    }
}

/// Replace the transcript with a saved one. The session is untouched on failure.
///
/// A non-empty saved thread id is adopted so the conversation can continue on
/// the same remote thread.
pub fn load(
    store: &ThreadStore,
    session: &mut Session,
    filename: &str,
    reporter: &mut dyn Reporter,
) -> bool {
    match store.load(filename) {
        Ok(saved) => {
            session.messages = saved.messages;
            if !saved.thread_id.is_empty() {
                session.thread_id = Some(saved.thread_id);
            }
            reporter.info(&format!("Loaded thread from {filename}"));
            true
        }
        Err(e) => {
            report_error(reporter, "loading thread", &e);
            false
        }
    }
}

/// Capture reporter that keeps every outcome in memory, for embedding callers and tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub infos: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Reporter for RecordingReporter {
    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
