//! Per-room conversational state for the Nomi chatroom.
//!
//! A room owns its bounded history, the rolling summary, the presence list,
//! the turn scheduler that decides when the AI speaks, and the turn phase
//! that keeps AI turns from overlapping.  Rooms are created on first
//! reference and live for the lifetime of the process.

pub mod history;
pub mod phase;
pub mod scheduler;
pub mod store;

pub use history::History;
pub use phase::TurnPhase;
pub use scheduler::{MentionRules, TurnScheduler};
pub use store::{ContextStore, Room, RoomSnapshot};
