//! Wire protocol spoken over `/ws`.
//!
//! Every frame is a JSON object tagged by `type`.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client → gateway
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        room_id: String,
        #[serde(default)]
        display_name: Option<String>,
    },
    Message {
        room_id: String,
        text: String,
    },
    Reaction {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        message_id: String,
        #[serde(default)]
        emoji: String,
    },
    Typing {
        room_id: String,
        #[serde(default)]
        is_typing: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Gateway → client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    PresenceUpdate {
        room_id: String,
        users: Vec<String>,
    },
    ChatMessage {
        id: String,
        room_id: String,
        name: String,
        content: String,
        /// Unix millis.
        ts: i64,
    },
    Reaction {
        room_id: String,
        message_id: String,
        emoji: String,
        user: String,
        ts: i64,
    },
    Typing {
        room_id: String,
        user: String,
        is_typing: bool,
    },
    TurnStarted {
        room_id: String,
        request_id: String,
    },
    TurnToken {
        request_id: String,
        text: String,
    },
    TurnDone {
        request_id: String,
        full_text: String,
    },
    TurnError {
        request_id: String,
        message: String,
    },
    System {
        kind: SystemKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        ts: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemKind {
    Join,
    Leave,
    RateLimited,
}

impl ServerEvent {
    /// Request id of a turn event, `None` for everything else.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ServerEvent::TurnStarted { request_id, .. }
            | ServerEvent::TurnToken { request_id, .. }
            | ServerEvent::TurnDone { request_id, .. }
            | ServerEvent::TurnError { request_id, .. } => Some(request_id),
            _ => None,
        }
    }
}
