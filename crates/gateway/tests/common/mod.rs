#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use nomi_domain::config::Config;
use nomi_gateway::bootstrap;
use nomi_gateway::chat::hub::RoomFrame;
use nomi_gateway::chat::protocol::ServerEvent;
use nomi_gateway::state::AppState;
use nomi_providers::{ScriptedProvider, ScriptedReply};

pub fn state_with(config: Config, llm: Arc<ScriptedProvider>) -> AppState {
    bootstrap::assemble(Arc::new(config), llm).unwrap()
}

pub fn scripted(replies: impl IntoIterator<Item = ScriptedReply>) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(replies))
}

/// Config where chatter alone never makes the AI due.
pub fn quiet_config() -> Config {
    let mut cfg = Config::default();
    cfg.turn.message_threshold = 1_000;
    cfg.turn.silence_threshold_ms = 3_600_000;
    cfg.summarizer.enabled = false;
    cfg
}

pub async fn next_frame(rx: &mut broadcast::Receiver<RoomFrame>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for a room frame")
        .expect("room channel closed")
        .event
}

pub async fn next_direct(rx: &mut mpsc::Receiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(30), rx.recv())
        .await
        .expect("timed out waiting for a connection frame")
        .expect("connection channel closed")
}

/// Frames up to and including the first terminal turn event.
pub async fn until_terminal(rx: &mut broadcast::Receiver<RoomFrame>) -> Vec<ServerEvent> {
    let mut out = Vec::new();
    loop {
        let ev = next_frame(rx).await;
        let terminal = matches!(
            ev,
            ServerEvent::TurnDone { .. } | ServerEvent::TurnError { .. }
        );
        out.push(ev);
        if terminal {
            return out;
        }
    }
}
