//! AI turn runtime: when the AI speaks, what it sees, and how its reply is
//! streamed into the room.

pub mod debounce;
pub mod rate_limit;
pub mod summarize;
pub mod turn;

pub use rate_limit::RateLimiter;
pub use summarize::Summarizer;
pub use turn::TurnOrchestrator;
