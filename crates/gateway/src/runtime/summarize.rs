//! Rolling room summary: condenses recent history into a few sentences so
//! the prompt keeps long-range context without growing.
//!
//! Runs in the background after each successful AI turn.  Failures are
//! logged and skipped; the previous summary stays in place.

use std::sync::Arc;

use nomi_domain::config::SummarizerConfig;
use nomi_domain::error::Result;
use nomi_domain::message::{HistoryEntry, Message};
use nomi_providers::{collect_text, ChatRequest, LlmProvider};
use nomi_rooms::ContextStore;

pub struct Summarizer {
    config: SummarizerConfig,
    rooms: Arc<ContextStore>,
    llm: Arc<dyn LlmProvider>,
}

impl Summarizer {
    pub fn new(config: SummarizerConfig, rooms: Arc<ContextStore>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { config, rooms, llm }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Instruction, the recent entries verbatim, then the closing request.
    pub fn build_request(&self, recent: &[HistoryEntry]) -> ChatRequest {
        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::system(self.config.instruction.clone()));
        messages.extend(recent.iter().map(HistoryEntry::to_message));
        messages.push(Message::user(self.config.request.clone()));

        ChatRequest {
            messages,
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            model: None,
        }
    }

    /// Generate a summary for the room without storing it.
    /// `Ok(None)` when the model returned only whitespace.
    pub async fn summarize(&self, room_id: &str) -> Result<Option<String>> {
        let recent = self.rooms.recent_history(room_id, self.config.recent_entries);
        self.generate(&recent).await
    }

    async fn generate(&self, recent: &[HistoryEntry]) -> Result<Option<String>> {
        let req = self.build_request(recent);
        let text = collect_text(self.llm.as_ref(), &req).await?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_owned()))
    }

    /// Generate and store a fresh summary, swallowing failures.
    ///
    /// Refreshes may overlap; a result built from older history than the
    /// stored summary is dropped.
    pub async fn refresh(&self, room_id: &str) {
        if !self.config.enabled {
            return;
        }
        let (revision, recent) = self
            .rooms
            .recent_history_at(room_id, self.config.recent_entries);
        match self.generate(&recent).await {
            Ok(Some(summary)) => {
                if self.rooms.offer_summary(room_id, &summary, revision) {
                    tracing::debug!(room_id, revision, summary_len = summary.len(), "room summary updated");
                } else {
                    tracing::debug!(room_id, revision, "newer summary already stored; discarding");
                }
            }
            Ok(None) => tracing::debug!(room_id, "summarizer returned nothing; keeping previous"),
            Err(e) => tracing::warn!(room_id, error = %e, "summarization failed; keeping previous"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use nomi_domain::config::{RoomConfig, TurnConfig};
    use nomi_domain::message::Role;
    use nomi_providers::{ScriptedProvider, ScriptedReply};

    fn setup(replies: Vec<ScriptedReply>) -> (Arc<ContextStore>, Arc<ScriptedProvider>, Summarizer) {
        let rooms = Arc::new(ContextStore::new(RoomConfig::default(), TurnConfig::default()).unwrap());
        let llm = Arc::new(ScriptedProvider::new(replies));
        let s = Summarizer::new(SummarizerConfig::default(), rooms.clone(), llm.clone());
        (rooms, llm, s)
    }

    #[tokio::test]
    async fn prompt_uses_last_twenty_entries() {
        let (rooms, llm, s) = setup(vec![ScriptedReply::tokens(&["  counting.  "])]);
        for i in 0..30 {
            rooms.append_user_message("lobby", "ada", &format!("m{i}"));
        }
        s.refresh("lobby").await;
        assert_eq!(rooms.summary("lobby"), "counting.");

        let req = &llm.requests()[0];
        assert_eq!(req.messages.len(), 22);
        assert_eq!(req.messages[0].role, Role::System);
        assert_eq!(req.messages[1].content, "m10");
        assert_eq!(req.messages[21].content, "Summarize the conversation so far for quick context.");
        assert_eq!(req.max_tokens, Some(200));
        assert_eq!(req.temperature, Some(0.3));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_refresh_over_older_history_does_not_clobber_newer_summary() {
        let (rooms, _llm, s) = setup(vec![
            ScriptedReply::tokens(&["stale"]).paced(Duration::from_secs(5)),
            ScriptedReply::tokens(&["fresh"]),
        ]);
        let s = Arc::new(s);
        rooms.append_user_message("lobby", "ada", "hi");

        let slow = {
            let s = s.clone();
            tokio::spawn(async move { s.refresh("lobby").await })
        };
        // Let the slow refresh read history and start waiting.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        rooms.append_assistant_message("lobby", "hello ada");
        s.refresh("lobby").await;
        assert_eq!(rooms.summary("lobby"), "fresh");

        slow.await.unwrap();
        assert_eq!(rooms.summary("lobby"), "fresh");
    }

    #[tokio::test]
    async fn failures_and_blank_output_keep_previous_summary() {
        let (rooms, _llm, s) = setup(vec![
            ScriptedReply::Refuse("upstream down".into()),
            ScriptedReply::tokens(&["   "]),
        ]);
        rooms.set_summary("lobby", "old");
        s.refresh("lobby").await;
        assert_eq!(rooms.summary("lobby"), "old");
        s.refresh("lobby").await;
        assert_eq!(rooms.summary("lobby"), "old");
    }
}
