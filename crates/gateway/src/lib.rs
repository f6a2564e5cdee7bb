//! Nomi gateway: WebSocket chatroom transport, the AI turn runtime, and the
//! peripheral HTTP surface.

pub mod api;
pub mod bootstrap;
pub mod chat;
pub mod cli;
pub mod runtime;
pub mod state;
