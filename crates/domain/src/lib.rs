//! Shared types for the Nomi chatroom workspace: configuration, the
//! error type, provider-agnostic chat messages, and streaming events.

pub mod config;
pub mod error;
pub mod message;
pub mod stream;
