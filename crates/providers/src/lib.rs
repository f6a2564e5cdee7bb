pub mod openai_compat;
pub mod scripted;
pub mod traits;
pub(crate) mod sse;
pub(crate) mod util;

// Re-exports for convenience.
pub use openai_compat::OpenAiCompatProvider;
pub use scripted::{ScriptStep, ScriptedProvider, ScriptedReply};
pub use traits::{collect_text, ChatRequest, LlmProvider};
