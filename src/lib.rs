// ABOUTME: Library root for threadchat — re-exports all modules for integration testing.
// ABOUTME: The binary entry point is in main.rs, which uses this crate as a library.

pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod session;
