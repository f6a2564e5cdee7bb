use std::sync::Arc;

use nomi_domain::config::Config;
use nomi_providers::LlmProvider;
use nomi_rooms::ContextStore;

use crate::chat::hub::RoomHub;
use crate::runtime::{RateLimiter, TurnOrchestrator};

/// Shared application state passed to all handlers and connections.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Room registry: history, summary, presence, scheduler, phase.
    pub rooms: Arc<ContextStore>,
    /// Per-room outbound fan-out.
    pub hub: Arc<RoomHub>,
    pub llm: Arc<dyn LlmProvider>,
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Per-connection message limiter.
    pub limiter: Arc<RateLimiter>,
}
