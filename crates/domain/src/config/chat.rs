use serde::{Deserialize, Serialize};

/// Chat transport settings for connected participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Per-connection message rate limit.
    #[serde(default)]
    pub rate_limit: MessageRateLimit,
    /// Display name used when a participant joins without one.
    #[serde(default = "d_anonymous")]
    pub default_display_name: String,
    /// Speaker name used for messages from a connection that never joined.
    #[serde(default = "d_user")]
    pub fallback_speaker: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            rate_limit: MessageRateLimit::default(),
            default_display_name: d_anonymous(),
            fallback_speaker: d_user(),
        }
    }
}

/// Sliding-window limit: at most `max_messages` within any `window_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRateLimit {
    #[serde(default = "d_6")]
    pub max_messages: usize,
    #[serde(default = "d_5000")]
    pub window_ms: u64,
}

impl Default for MessageRateLimit {
    fn default() -> Self {
        Self {
            max_messages: 6,
            window_ms: 5_000,
        }
    }
}

fn d_anonymous() -> String {
    "Anonymous".into()
}
fn d_user() -> String {
    "User".into()
}
fn d_6() -> usize {
    6
}
fn d_5000() -> u64 {
    5_000
}
