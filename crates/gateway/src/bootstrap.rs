//! AppState construction extracted from `main.rs`.

use std::sync::Arc;

use anyhow::Context;

use nomi_domain::config::{Config, ConfigSeverity};
use nomi_providers::{LlmProvider, OpenAiCompatProvider};
use nomi_rooms::ContextStore;

use crate::chat::hub::RoomHub;
use crate::runtime::turn::TurnSettings;
use crate::runtime::{RateLimiter, Summarizer, TurnOrchestrator};
use crate::state::AppState;

/// Broadcast buffer per room.  A subscriber that lags further than this
/// drops frames (and is told so in the logs).
const ROOM_CHANNEL_CAPACITY: usize = 1024;

/// Validate config, build the generation client and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── Generation endpoint ──────────────────────────────────────────
    let llm: Arc<dyn LlmProvider> = Arc::new(
        OpenAiCompatProvider::from_config(&config.llm)
            .context("initializing generation client")?,
    );
    tracing::info!(
        provider = %config.llm.id,
        endpoint = %config.llm.endpoint,
        "generation client ready"
    );

    assemble(config, llm)
}

/// Wire the runtime around an already-built provider.
pub fn assemble(config: Arc<Config>, llm: Arc<dyn LlmProvider>) -> anyhow::Result<AppState> {
    let rooms = Arc::new(
        ContextStore::new(config.room.clone(), config.turn.clone())
            .context("initializing room registry")?,
    );
    let hub = Arc::new(RoomHub::new(ROOM_CHANNEL_CAPACITY));

    let summarizer = Arc::new(Summarizer::new(
        config.summarizer.clone(),
        rooms.clone(),
        llm.clone(),
    ));
    if !summarizer.enabled() {
        tracing::info!("rolling summaries disabled");
    }

    let orchestrator = Arc::new(TurnOrchestrator::new(
        TurnSettings::from_config(&config.turn, &config.llm),
        rooms.clone(),
        hub.clone(),
        llm.clone(),
        summarizer,
    ));

    let limiter = Arc::new(RateLimiter::new(&config.chat.rate_limit));
    tracing::info!(
        ai_name = %config.room.ai_name,
        history_cap = config.room.history_cap(),
        max_messages = config.chat.rate_limit.max_messages,
        window_ms = config.chat.rate_limit.window_ms,
        "room runtime ready"
    );

    Ok(AppState {
        config,
        rooms,
        hub,
        llm,
        orchestrator,
        limiter,
    })
}
