pub mod health;
pub mod rooms;
pub mod voice;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;

use crate::chat::ws::chat_ws;
use crate::state::AppState;

/// Build the full router.  Everything is public: participants are not
/// authenticated.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health probes
        .route("/health", get(health::health))
        .route("/v1/health", get(health::health_v1))
        // Voice join credentials
        .route("/voice/token", get(voice::voice_token))
        // Room introspection (read-only)
        .route("/v1/rooms/:room_id", get(rooms::get_room))
        // Chat transport
        .route("/ws", get(chat_ws))
}

/// Standardized JSON error body: `{ "error": "<message>" }`.
pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
