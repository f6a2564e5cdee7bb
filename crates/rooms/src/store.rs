//! In-memory room registry.
//!
//! Every room lives behind its own mutex so state changes are serialized per
//! room while different rooms proceed independently.  Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use nomi_domain::config::{RoomConfig, TurnConfig};
use nomi_domain::error::Result;
use nomi_domain::message::{HistoryEntry, Message};

use crate::history::History;
use crate::phase::TurnPhase;
use crate::scheduler::{MentionRules, TurnScheduler};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Room
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
pub struct Room {
    pub id: String,
    history: History,
    /// Rolling summary. Replaced wholesale, empty until the first one lands.
    pub summary: String,
    /// Display names in join order, no duplicates.
    pub presence: Vec<String>,
    pub scheduler: TurnScheduler,
    pub phase: TurnPhase,
    /// Entries ever appended; history identity for summaries.
    revision: u64,
    /// `revision` the stored summary was generated from.
    summary_revision: u64,
}

impl Room {
    fn new(id: &str, room: &RoomConfig, turn: &TurnConfig, rules: Arc<MentionRules>) -> Self {
        Self {
            id: id.to_owned(),
            history: History::with_cap(room.history_cap()),
            summary: String::new(),
            presence: Vec::new(),
            scheduler: TurnScheduler::new(turn, rules),
            phase: TurnPhase::Idle,
            revision: 0,
            summary_revision: 0,
        }
    }

    pub fn append_user(&mut self, speaker: &str, text: &str) {
        self.append(HistoryEntry::user(speaker, text));
    }

    /// Callers only pass non-blank text.
    pub fn append_assistant(&mut self, text: &str) {
        self.append(HistoryEntry::assistant(text));
    }

    fn append(&mut self, entry: HistoryEntry) {
        self.revision += 1;
        let evicted = self.history.push(entry);
        if evicted > 0 {
            tracing::trace!(room_id = %self.id, evicted, "history cap reached");
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Store a summary generated from history at `revision`, unless one
    /// built from later history already landed.
    pub fn offer_summary(&mut self, text: &str, revision: u64) -> bool {
        if revision < self.summary_revision {
            return false;
        }
        self.summary = text.to_owned();
        self.summary_revision = revision;
        true
    }

    pub fn add_presence(&mut self, user: &str) -> bool {
        if self.presence.iter().any(|u| u == user) {
            return false;
        }
        self.presence.push(user.to_owned());
        true
    }

    pub fn remove_presence(&mut self, user: &str) -> bool {
        let before = self.presence.len();
        self.presence.retain(|u| u != user);
        self.presence.len() != before
    }
}

/// Read-only view of a room for introspection.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub users: Vec<String>,
    pub history_len: usize,
    pub history_cap: usize,
    pub summary: String,
    pub phase: TurnPhase,
    pub messages_since_turn: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Context store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ContextStore {
    room_cfg: RoomConfig,
    turn_cfg: TurnConfig,
    rules: Arc<MentionRules>,
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
}

impl ContextStore {
    pub fn new(room_cfg: RoomConfig, turn_cfg: TurnConfig) -> Result<Self> {
        let rules = Arc::new(MentionRules::new(&room_cfg.ai_name)?);
        Ok(Self {
            room_cfg,
            turn_cfg,
            rules,
            rooms: RwLock::new(HashMap::new()),
        })
    }

    pub fn room_config(&self) -> &RoomConfig {
        &self.room_cfg
    }

    /// Get or create the room.
    pub fn room(&self, room_id: &str) -> Arc<Mutex<Room>> {
        if let Some(room) = self.rooms.read().get(room_id) {
            return room.clone();
        }

        let mut rooms = self.rooms.write();
        rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| {
                tracing::debug!(room_id, "room created");
                Arc::new(Mutex::new(Room::new(
                    room_id,
                    &self.room_cfg,
                    &self.turn_cfg,
                    self.rules.clone(),
                )))
            })
            .clone()
    }

    /// Run `f` with exclusive access to the room, creating it if needed.
    pub fn with_room<R>(&self, room_id: &str, f: impl FnOnce(&mut Room) -> R) -> R {
        let room = self.room(room_id);
        let mut guard = room.lock();
        f(&mut guard)
    }

    /// Existing room only; never creates.
    pub fn snapshot(&self, room_id: &str) -> Option<RoomSnapshot> {
        let room = self.rooms.read().get(room_id)?.clone();
        let room = room.lock();
        Some(RoomSnapshot {
            room_id: room.id.clone(),
            users: room.presence.clone(),
            history_len: room.history.len(),
            history_cap: room.history.cap(),
            summary: room.summary.clone(),
            phase: room.phase.clone(),
            messages_since_turn: room.scheduler.messages_since_turn(),
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    // ── history ─────────────────────────────────────────────────────

    pub fn append_user_message(&self, room_id: &str, speaker: &str, text: &str) {
        self.with_room(room_id, |room| room.append_user(speaker, text));
    }

    /// Callers only pass non-blank text.
    pub fn append_assistant_message(&self, room_id: &str, text: &str) {
        self.with_room(room_id, |room| room.append_assistant(text));
    }

    /// Replace the summary outright; it counts as covering current history.
    pub fn set_summary(&self, room_id: &str, text: &str) {
        self.with_room(room_id, |room| {
            let revision = room.revision;
            room.offer_summary(text, revision);
        });
    }

    /// See [`Room::offer_summary`].
    pub fn offer_summary(&self, room_id: &str, text: &str, revision: u64) -> bool {
        self.with_room(room_id, |room| room.offer_summary(text, revision))
    }

    pub fn summary(&self, room_id: &str) -> String {
        self.with_room(room_id, |room| room.summary.clone())
    }

    /// The last `n` history entries, oldest first.
    pub fn recent_history(&self, room_id: &str, n: usize) -> Vec<HistoryEntry> {
        self.with_room(room_id, |room| room.history.tail(n).cloned().collect())
    }

    /// Like [`recent_history`](Self::recent_history), tagged with the room
    /// revision the entries were read at.
    pub fn recent_history_at(&self, room_id: &str, n: usize) -> (u64, Vec<HistoryEntry>) {
        self.with_room(room_id, |room| {
            (room.revision, room.history.tail(n).cloned().collect())
        })
    }

    // ── presence ────────────────────────────────────────────────────

    pub fn add_presence(&self, room_id: &str, user: &str) -> bool {
        self.with_room(room_id, |room| room.add_presence(user))
    }

    pub fn remove_presence(&self, room_id: &str, user: &str) -> bool {
        self.with_room(room_id, |room| room.remove_presence(user))
    }

    pub fn list_presence(&self, room_id: &str) -> Vec<String> {
        self.with_room(room_id, |room| room.presence.clone())
    }

    // ── prompt ──────────────────────────────────────────────────────

    /// Persona instruction, then the rolling summary (when present) as a
    /// prior assistant message, then the last `context_window` entries.
    pub fn build_prompt_context(&self, room_id: &str) -> Vec<Message> {
        self.with_room(room_id, |room| self.prompt_for(room))
    }

    pub fn prompt_for(&self, room: &Room) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.room_cfg.context_window + 2);
        messages.push(Message::system(self.room_cfg.persona_prompt.clone()));

        if !room.summary.trim().is_empty() {
            messages.push(Message::assistant(format!(
                "{}: {}",
                self.room_cfg.summary_label, room.summary
            )));
        }

        messages.extend(
            room.history
                .tail(self.room_cfg.context_window)
                .map(HistoryEntry::to_message),
        );
        messages
    }
}
