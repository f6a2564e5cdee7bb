mod chat;
mod llm;
mod observability;
mod room;
mod server;
mod voice;

pub use chat::*;
pub use llm::*;
pub use observability::*;
pub use room::*;
pub use server::*;
pub use voice::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub room: RoomConfig,
    #[serde(default)]
    pub turn: TurnConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: &str) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }

        if self.llm.endpoint.is_empty() {
            errors.push(ConfigError::error("llm.endpoint", "endpoint must not be empty"));
        }
        if self.llm.auth.key.is_none() && self.llm.auth.env.is_none() {
            errors.push(ConfigError::warning(
                "llm.auth",
                "no credential source configured; requests will be unauthenticated",
            ));
        }

        if self.room.ai_name.trim().is_empty() {
            errors.push(ConfigError::error("room.ai_name", "ai_name must not be empty"));
        }
        if self.room.context_window == 0 {
            errors.push(ConfigError::error(
                "room.context_window",
                "context_window must be greater than 0",
            ));
        }

        if self.turn.message_threshold == 0 {
            errors.push(ConfigError::warning(
                "turn.message_threshold",
                "0 makes the AI answer every human message",
            ));
        }

        if self.chat.rate_limit.max_messages == 0 {
            errors.push(ConfigError::error(
                "chat.rate_limit.max_messages",
                "max_messages must be greater than 0",
            ));
        }
        if self.chat.rate_limit.window_ms == 0 {
            errors.push(ConfigError::error(
                "chat.rate_limit.window_ms",
                "window_ms must be greater than 0",
            ));
        }

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }
}
