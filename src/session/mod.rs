// ABOUTME: Session module — conversation context, transcript messages, and saved threads.
// ABOUTME: Saved threads are JSON snapshots written on explicit save.

pub mod context;
pub mod message;
pub mod store;

pub use context::Session;
pub use message::{Message, Role};
pub use store::{SavedThread, ThreadStore};
