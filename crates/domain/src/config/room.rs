use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Room memory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Display name of the AI participant. Also drives mention detection.
    #[serde(default = "d_ai_name")]
    pub ai_name: String,
    /// Number of most recent history entries sent verbatim to the model.
    #[serde(default = "d_context_window")]
    pub context_window: usize,
    /// Lower bound for the history cap. The effective cap is
    /// `max(history_floor, 2 * context_window)`.
    #[serde(default = "d_history_floor")]
    pub history_floor: usize,
    /// System persona instruction placed first in every prompt.
    #[serde(default = "d_persona_prompt")]
    pub persona_prompt: String,
    /// Label prefixed to the rolling summary when it is injected as context.
    #[serde(default = "d_summary_label")]
    pub summary_label: String,
}

impl RoomConfig {
    /// Hard cap on retained history entries per room.
    pub fn history_cap(&self) -> usize {
        self.history_floor.max(self.context_window * 2)
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            ai_name: d_ai_name(),
            context_window: d_context_window(),
            history_floor: d_history_floor(),
            persona_prompt: d_persona_prompt(),
            summary_label: d_summary_label(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn taking
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Heuristics that decide when the AI takes a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Human messages since the last AI turn that make the AI due.
    #[serde(default = "d_message_threshold")]
    pub message_threshold: u32,
    /// Silence (ms since the last completed AI turn) that makes the AI due.
    #[serde(default = "d_silence_threshold_ms")]
    pub silence_threshold_ms: u64,
    /// Delay between a qualifying trigger and the start of generation.
    /// Triggers inside this window coalesce into one turn.
    #[serde(default = "d_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            message_threshold: d_message_threshold(),
            silence_threshold_ms: d_silence_threshold_ms(),
            debounce_ms: d_debounce_ms(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rolling summary
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// History entries fed to the summarizer.
    #[serde(default = "d_recent_entries")]
    pub recent_entries: usize,
    #[serde(default = "d_summary_temperature")]
    pub temperature: f32,
    #[serde(default = "d_summary_max_tokens")]
    pub max_tokens: u32,
    /// System instruction for the summarizer.
    #[serde(default = "d_summary_instruction")]
    pub instruction: String,
    /// Closing user request appended after the recent entries.
    #[serde(default = "d_summary_request")]
    pub request: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recent_entries: d_recent_entries(),
            temperature: d_summary_temperature(),
            max_tokens: d_summary_max_tokens(),
            instruction: d_summary_instruction(),
            request: d_summary_request(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_ai_name() -> String {
    "Nomi".into()
}
fn d_context_window() -> usize {
    40
}
fn d_history_floor() -> usize {
    200
}
fn d_persona_prompt() -> String {
    "You are Nomi, a witty AI character in a shared chatroom. Keep track of user \
     personalities and maintain coherent group conversations. Be concise, friendly, \
     and fun. Use @mentions when addressing someone directly."
        .into()
}
fn d_summary_label() -> String {
    "Group Summary".into()
}
fn d_message_threshold() -> u32 {
    3
}
fn d_silence_threshold_ms() -> u64 {
    15_000
}
fn d_debounce_ms() -> u64 {
    500
}
fn d_true() -> bool {
    true
}
fn d_recent_entries() -> usize {
    20
}
fn d_summary_temperature() -> f32 {
    0.3
}
fn d_summary_max_tokens() -> u32 {
    200
}
fn d_summary_instruction() -> String {
    "You are an assistant that writes a concise rolling summary (3-6 sentences) of a \
     group chat. Capture topics, decisions, and any user-specific preferences. Be \
     neutral and brief."
        .into()
}
fn d_summary_request() -> String {
    "Summarize the conversation so far for quick context.".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_cap_uses_floor_for_small_windows() {
        let cfg = RoomConfig::default();
        assert_eq!(cfg.history_cap(), 200);
    }

    #[test]
    fn history_cap_doubles_large_windows() {
        let cfg = RoomConfig {
            context_window: 150,
            ..RoomConfig::default()
        };
        assert_eq!(cfg.history_cap(), 300);
    }

    #[test]
    fn turn_defaults() {
        let cfg: TurnConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.message_threshold, 3);
        assert_eq!(cfg.silence_threshold_ms, 15_000);
        assert_eq!(cfg.debounce_ms, 500);
    }

    #[test]
    fn summarizer_can_be_disabled() {
        let cfg: SummarizerConfig = toml::from_str("enabled = false").unwrap();
        assert!(!cfg.enabled);
        assert_eq!(cfg.recent_entries, 20);
    }
}
