//! WebSocket endpoint for chat participants.
//!
//! Flow:
//! 1. Client connects to `/ws`
//! 2. Client sends `join` for each room it wants to follow
//! 3. Bidirectional loop: client sends `message` / `reaction` / `typing`,
//!    gateway pushes room frames and direct notices
//! 4. On close the connection leaves every joined room
//!
//! All outbound frames for a connection funnel through one `mpsc` channel
//! drained by a writer task; each joined room has a forwarder task copying
//! hub frames into that channel.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::chat::hub::ConnId;
use crate::chat::protocol::{ClientEvent, ServerEvent, SystemKind};
use crate::state::AppState;

/// Outbound frames buffered per connection before the writer applies
/// backpressure to the forwarders.
const OUTBOUND_BUFFER: usize = 256;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// GET /ws: upgrade to WebSocket.
pub async fn chat_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);

    let mut conn = Connection::new(state, outbound_tx);
    let conn_id = conn.id();
    tracing::info!(conn_id = %conn_id, "participant connected");

    // Writer task: forwards outbound frames to the WS sink.
    let writer = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to encode outbound frame");
                    continue;
                }
            };
            if ws_sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Reader loop: process inbound frames.
    while let Some(Ok(msg)) = ws_stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => conn.handle(event).await,
                Err(e) => {
                    tracing::debug!(conn_id = %conn_id, error = %e, "ignoring unparseable frame")
                }
            },
            Message::Close(_) => break,
            // axum answers WS-level pings itself.
            _ => {}
        }
    }

    // Cleanup: leave rooms, abort writer.
    conn.close();
    writer.abort();
    tracing::info!(conn_id = %conn_id, "participant disconnected");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-connection chat state, independent of the socket so it can be
/// driven directly.
pub struct Connection {
    id: ConnId,
    state: AppState,
    outbound: mpsc::Sender<ServerEvent>,
    display_name: Option<String>,
    /// Joined rooms in join order, each with its forwarder task.
    joined: Vec<(String, JoinHandle<()>)>,
}

impl Connection {
    pub fn new(state: AppState, outbound: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state,
            outbound,
            display_name: None,
            joined: Vec::new(),
        }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn joined_rooms(&self) -> impl Iterator<Item = &str> {
        self.joined.iter().map(|(room, _)| room.as_str())
    }

    fn speaker(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| self.state.config.chat.fallback_speaker.clone())
    }

    pub async fn handle(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Join {
                room_id,
                display_name,
            } => self.join(&room_id, display_name),
            ClientEvent::Message { room_id, text } => self.message(&room_id, &text).await,
            ClientEvent::Reaction {
                room_id,
                message_id,
                emoji,
            } => self.react(&room_id, message_id, emoji),
            ClientEvent::Typing { room_id, is_typing } => self.typing(&room_id, is_typing),
        }
    }

    fn join(&mut self, room_id: &str, display_name: Option<String>) {
        if room_id.trim().is_empty() {
            tracing::debug!(conn_id = %self.id, "join without room id ignored");
            return;
        }

        let name = display_name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.state.config.chat.default_display_name.clone());
        self.display_name = Some(name.clone());

        // Subscribe before announcing so the joiner sees its own presence.
        if !self.joined.iter().any(|(r, _)| r == room_id) {
            let forwarder = self.spawn_forwarder(room_id);
            self.joined.push((room_id.to_owned(), forwarder));
        }

        self.state.rooms.add_presence(room_id, &name);
        self.broadcast_presence(room_id);
        self.state.hub.publish(
            room_id,
            ServerEvent::System {
                kind: SystemKind::Join,
                room_id: Some(room_id.to_owned()),
                user: Some(name.clone()),
                ts: Utc::now().timestamp_millis(),
            },
        );
        tracing::info!(conn_id = %self.id, room_id, user = %name, "joined room");
    }

    async fn message(&mut self, room_id: &str, text: &str) {
        if !self.state.limiter.check(self.id) {
            tracing::debug!(conn_id = %self.id, room_id, "message rate limited");
            let notice = ServerEvent::System {
                kind: SystemKind::RateLimited,
                room_id: None,
                user: None,
                ts: Utc::now().timestamp_millis(),
            };
            let _ = self.outbound.send(notice).await;
            return;
        }

        if room_id.trim().is_empty() || text.trim().is_empty() {
            tracing::debug!(conn_id = %self.id, "blank message dropped");
            return;
        }

        let speaker = self.speaker();
        let accepted = self
            .state
            .orchestrator
            .on_human_message(room_id, &speaker, text);
        tracing::debug!(
            conn_id = %self.id,
            room_id,
            message_id = %accepted.message_id,
            scheduled = accepted.scheduled,
            "message accepted"
        );
    }

    fn react(&self, room_id: &str, message_id: String, emoji: String) {
        if room_id.is_empty() || message_id.is_empty() || emoji.is_empty() {
            return;
        }
        self.state.hub.publish(
            room_id,
            ServerEvent::Reaction {
                room_id: room_id.to_owned(),
                message_id,
                emoji,
                user: self.speaker(),
                ts: Utc::now().timestamp_millis(),
            },
        );
    }

    fn typing(&self, room_id: &str, is_typing: bool) {
        if room_id.is_empty() {
            return;
        }
        self.state.hub.publish_except(
            room_id,
            self.id,
            ServerEvent::Typing {
                room_id: room_id.to_owned(),
                user: self.speaker(),
                is_typing,
            },
        );
    }

    /// Leave every joined room and drop per-connection state.  In-flight AI
    /// turns are not affected.
    pub fn close(&mut self) {
        for (room_id, forwarder) in self.joined.drain(..) {
            forwarder.abort();
            if let Some(name) = &self.display_name {
                self.state.rooms.remove_presence(&room_id, name);
                let users = self.state.rooms.list_presence(&room_id);
                self.state.hub.publish(
                    &room_id,
                    ServerEvent::PresenceUpdate {
                        room_id: room_id.clone(),
                        users,
                    },
                );
            }
            self.state.hub.publish(
                &room_id,
                ServerEvent::System {
                    kind: SystemKind::Leave,
                    room_id: Some(room_id.clone()),
                    user: self.display_name.clone(),
                    ts: Utc::now().timestamp_millis(),
                },
            );
        }
        self.state.limiter.forget(self.id);
    }

    fn broadcast_presence(&self, room_id: &str) {
        let users = self.state.rooms.list_presence(room_id);
        self.state.hub.publish(
            room_id,
            ServerEvent::PresenceUpdate {
                room_id: room_id.to_owned(),
                users,
            },
        );
    }

    fn spawn_forwarder(&self, room_id: &str) -> JoinHandle<()> {
        let mut frames = self.state.hub.subscribe(room_id);
        let outbound = self.outbound.clone();
        let me = self.id;
        let room = room_id.to_owned();

        tokio::spawn(async move {
            loop {
                match frames.recv().await {
                    Ok(frame) => {
                        if frame.skip == Some(me) {
                            continue;
                        }
                        if outbound.send(frame.event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(conn_id = %me, room_id = %room, skipped, "slow consumer dropped frames");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        for (_, forwarder) in &self.joined {
            forwarder.abort();
        }
    }
}
