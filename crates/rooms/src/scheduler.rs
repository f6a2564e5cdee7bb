//! Decides when the AI participant takes a turn.
//!
//! Any one of these makes the AI due:
//! - the message mentions `@<ai_name>` (case-insensitive)
//! - `message_threshold` human messages arrived since the last AI turn
//! - more than `silence_threshold_ms` passed since the last AI turn
//! - the message ends with `?` or names the AI as a standalone word

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tokio::time::Instant;

use nomi_domain::config::TurnConfig;
use nomi_domain::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Mention rules
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compiled name patterns, shared by every room.
#[derive(Debug)]
pub struct MentionRules {
    direct: Regex,
    name_word: Regex,
}

impl MentionRules {
    pub fn new(ai_name: &str) -> Result<Self> {
        let name = regex::escape(ai_name.trim());
        let direct = Regex::new(&format!("(?i)@{name}"))
            .map_err(|e| Error::Config(format!("mention pattern: {e}")))?;
        let name_word = Regex::new(&format!(r"(?i)\b{name}\b"))
            .map_err(|e| Error::Config(format!("name pattern: {e}")))?;
        Ok(Self { direct, name_word })
    }

    /// `@name` anywhere in the text.
    pub fn is_direct(&self, text: &str) -> bool {
        self.direct.is_match(text)
    }

    /// A question, or the name used as a word.
    pub fn is_question_or_named(&self, text: &str) -> bool {
        text.ends_with('?') || self.name_word.is_match(text)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
pub struct TurnScheduler {
    last_turn: Instant,
    since_last_turn: u32,
    message_threshold: u32,
    silence: Duration,
    rules: Arc<MentionRules>,
}

impl TurnScheduler {
    /// The silence clock starts at creation, as if the AI had just spoken.
    pub fn new(cfg: &TurnConfig, rules: Arc<MentionRules>) -> Self {
        Self {
            last_turn: Instant::now(),
            since_last_turn: 0,
            message_threshold: cfg.message_threshold,
            silence: Duration::from_millis(cfg.silence_threshold_ms),
            rules,
        }
    }

    pub fn record_human_message(&mut self) {
        self.since_last_turn = self.since_last_turn.saturating_add(1);
    }

    pub fn should_respond(&self, text: &str) -> bool {
        self.should_respond_at(text, Instant::now())
    }

    pub fn should_respond_at(&self, text: &str, now: Instant) -> bool {
        self.rules.is_direct(text)
            || self.since_last_turn >= self.message_threshold
            || now.saturating_duration_since(self.last_turn) > self.silence
            || self.rules.is_question_or_named(text)
    }

    /// Only called after a turn completes successfully.
    pub fn mark_responded(&mut self) {
        self.mark_responded_at(Instant::now());
    }

    pub fn mark_responded_at(&mut self, now: Instant) {
        self.since_last_turn = 0;
        self.last_turn = now;
    }

    pub fn messages_since_turn(&self) -> u32 {
        self.since_last_turn
    }

    pub fn last_turn(&self) -> Instant {
        self.last_turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> TurnScheduler {
        let rules = Arc::new(MentionRules::new("Nomi").unwrap());
        TurnScheduler::new(&TurnConfig::default(), rules)
    }

    #[test]
    fn mention_always_triggers() {
        let s = scheduler();
        let now = s.last_turn();
        assert!(s.should_respond_at("hey @nomi look", now));
        assert!(s.should_respond_at("@NOMI", now));
    }

    #[test]
    fn quiet_chatter_does_not_trigger() {
        let mut s = scheduler();
        let now = s.last_turn();
        s.record_human_message();
        assert!(!s.should_respond_at("hi", now));
        s.record_human_message();
        assert!(!s.should_respond_at("ok", now));
    }

    #[test]
    fn third_message_triggers() {
        let mut s = scheduler();
        let now = s.last_turn();
        for _ in 0..3 {
            s.record_human_message();
        }
        assert!(s.should_respond_at("sure", now));
    }

    #[test]
    fn silence_triggers_strictly_after_threshold() {
        let s = scheduler();
        let start = s.last_turn();
        assert!(!s.should_respond_at("hi", start + Duration::from_millis(15_000)));
        assert!(s.should_respond_at("hi", start + Duration::from_millis(15_001)));
    }

    #[test]
    fn question_or_name_triggers() {
        let s = scheduler();
        let now = s.last_turn();
        assert!(s.should_respond_at("anyone here?", now));
        assert!(s.should_respond_at("what does nomi think", now));
        assert!(!s.should_respond_at("is it? no", now));
        assert!(!s.should_respond_at("nomination", now));
    }

    #[test]
    fn mark_responded_resets_counter_and_clock() {
        let mut s = scheduler();
        for _ in 0..5 {
            s.record_human_message();
        }
        let later = s.last_turn() + Duration::from_secs(60);
        s.mark_responded_at(later);
        assert_eq!(s.messages_since_turn(), 0);
        assert!(!s.should_respond_at("hi", later + Duration::from_millis(100)));
    }

    #[test]
    fn names_with_metacharacters_are_escaped() {
        let rules = MentionRules::new("N.mi").unwrap();
        assert!(rules.is_direct("@n.mi hello"));
        assert!(!rules.is_direct("@nxmi hello"));
    }
}
