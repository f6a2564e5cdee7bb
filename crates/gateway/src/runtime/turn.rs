//! Response orchestration: one exclusive AI turn per room at a time.
//!
//! Flow for a room:
//! 1. a human message is echoed, appended, and counted by the scheduler
//! 2. if the scheduler says the AI is due and the room is idle, a debounce
//!    timer is armed (`Idle -> DebounceScheduled`)
//! 3. when the timer fires the room moves to `Generating`, `turn_started`
//!    goes out, and the prompt is built from the room snapshot
//! 4. fragments are relayed as `turn_token` in arrival order
//! 5. on completion the reply is appended, the scheduler reset, `turn_done`
//!    emitted and the summarizer kicked off; on failure `turn_error` is
//!    emitted and the scheduler stays due
//!
//! Every phase change and its matching broadcast happen under the room lock,
//! so observers never see a terminal event for a turn that has not started.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tracing::Instrument;

use nomi_domain::config::{LlmConfig, TurnConfig};
use nomi_domain::error::{Error, Result};
use nomi_domain::message::Message;
use nomi_domain::stream::StreamEvent;
use nomi_providers::{ChatRequest, LlmProvider};
use nomi_rooms::ContextStore;

use crate::chat::hub::RoomHub;
use crate::chat::protocol::ServerEvent;
use crate::runtime::debounce::DebounceTimers;
use crate::runtime::summarize::Summarizer;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sampling knobs for conversational turns.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub debounce: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl TurnSettings {
    pub fn from_config(turn: &TurnConfig, llm: &LlmConfig) -> Self {
        Self {
            debounce: Duration::from_millis(turn.debounce_ms),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }
}

pub struct TurnOrchestrator {
    settings: TurnSettings,
    rooms: Arc<ContextStore>,
    hub: Arc<RoomHub>,
    llm: Arc<dyn LlmProvider>,
    summarizer: Arc<Summarizer>,
    timers: DebounceTimers,
}

/// What happened to an accepted human message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub message_id: String,
    /// The message armed a new debounce timer.
    pub scheduled: bool,
}

impl TurnOrchestrator {
    pub fn new(
        settings: TurnSettings,
        rooms: Arc<ContextStore>,
        hub: Arc<RoomHub>,
        llm: Arc<dyn LlmProvider>,
        summarizer: Arc<Summarizer>,
    ) -> Self {
        Self {
            settings,
            rooms,
            hub,
            llm,
            summarizer,
            timers: DebounceTimers::new(),
        }
    }

    /// Echo a human message to the room, store it, and let the scheduler
    /// decide whether the AI should answer.
    pub fn on_human_message(self: &Arc<Self>, room_id: &str, speaker: &str, text: &str) -> Accepted {
        let message_id = uuid::Uuid::new_v4().to_string();

        // Echo and append under the room lock so the broadcast order matches
        // the history order.
        let scheduled = self.rooms.with_room(room_id, |room| {
            self.hub.publish(
                room_id,
                ServerEvent::ChatMessage {
                    id: message_id.clone(),
                    room_id: room_id.to_owned(),
                    name: speaker.to_owned(),
                    content: text.to_owned(),
                    ts: Utc::now().timestamp_millis(),
                },
            );
            room.append_user(speaker, text);
            room.scheduler.record_human_message();
            room.scheduler.should_respond(text) && room.phase.schedule()
        });

        if scheduled {
            tracing::debug!(room_id, "AI turn scheduled");
            let this = Arc::clone(self);
            let room = room_id.to_owned();
            self.timers.arm(room_id, self.settings.debounce, move || {
                this.start_turn(&room);
            });
        }

        Accepted {
            message_id,
            scheduled,
        }
    }

    /// Debounce fired: claim the room and spawn the generation task.
    /// Returns the request id when a turn actually started.
    pub fn start_turn(self: &Arc<Self>, room_id: &str) -> Option<String> {
        let begun = self.rooms.with_room(room_id, |room| {
            let request_id = format!("{}-{}", room_id, Utc::now().timestamp_millis());
            if !room.phase.begin(request_id.clone()) {
                return None;
            }
            self.hub.publish(
                room_id,
                ServerEvent::TurnStarted {
                    room_id: room_id.to_owned(),
                    request_id: request_id.clone(),
                },
            );
            Some((request_id, self.rooms.prompt_for(room)))
        });

        let (request_id, messages) = begun?;

        let span = tracing::info_span!(
            "turn",
            room_id = %room_id,
            request_id = %request_id,
            "otel.kind" = "INTERNAL",
        );
        let this = Arc::clone(self);
        let room = room_id.to_owned();
        let rid = request_id.clone();
        tokio::spawn(
            async move {
                tracing::debug!(prompt_messages = messages.len(), "turn started");
                this.run_turn(&room, &rid, messages).await;
            }
            .instrument(span),
        );

        Some(request_id)
    }

    async fn run_turn(self: Arc<Self>, room_id: &str, request_id: &str, messages: Vec<Message>) {
        let req = ChatRequest {
            messages,
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            model: None,
        };

        match self.stream_reply(room_id, request_id, &req).await {
            Ok(full_text) => {
                self.rooms.with_room(room_id, |room| {
                    room.phase.finish();
                    if !full_text.trim().is_empty() {
                        room.append_assistant(&full_text);
                    }
                    room.scheduler.mark_responded();
                    self.hub.publish(
                        room_id,
                        ServerEvent::TurnDone {
                            request_id: request_id.to_owned(),
                            full_text: full_text.clone(),
                        },
                    );
                });
                tracing::info!(reply_len = full_text.len(), "turn complete");

                if self.summarizer.enabled() {
                    let summarizer = self.summarizer.clone();
                    let room = room_id.to_owned();
                    tokio::spawn(
                        async move { summarizer.refresh(&room).await }.in_current_span(),
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "turn failed");
                self.rooms.with_room(room_id, |room| {
                    room.phase.finish();
                    self.hub.publish(
                        room_id,
                        ServerEvent::TurnError {
                            request_id: request_id.to_owned(),
                            message: e.to_string(),
                        },
                    );
                });
            }
        }
    }

    /// Relay fragments as they arrive and return the final text.
    ///
    /// The provider's authoritative text wins over the local accumulation
    /// when it is present and non-empty.
    async fn stream_reply(&self, room_id: &str, request_id: &str, req: &ChatRequest) -> Result<String> {
        let mut stream = self.llm.chat_stream(req).await?;
        let mut text = String::new();

        while let Some(event) = stream.next().await {
            match event? {
                StreamEvent::Token { text: fragment } => {
                    text.push_str(&fragment);
                    self.hub.publish(
                        room_id,
                        ServerEvent::TurnToken {
                            request_id: request_id.to_owned(),
                            text: fragment,
                        },
                    );
                }
                StreamEvent::Done {
                    full_text,
                    finish_reason,
                    ..
                } => {
                    tracing::trace!(?finish_reason, "stream finished");
                    if let Some(full) = full_text.filter(|t| !t.is_empty()) {
                        text = full;
                    }
                    return Ok(text);
                }
                StreamEvent::Error { message } => {
                    return Err(Error::Provider {
                        provider: self.llm.provider_id().to_owned(),
                        message,
                    });
                }
            }
        }

        Ok(text)
    }
}
