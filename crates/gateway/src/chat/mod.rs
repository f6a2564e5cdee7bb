//! Real-time chat transport.

pub mod hub;
pub mod protocol;
pub mod ws;
