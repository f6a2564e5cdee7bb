use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::state::AppState;

use super::api_error;

/// GET /v1/rooms/:room_id: presence, history size, summary, and turn phase.
///
/// Read-only; unknown rooms are not created.
pub async fn get_room(State(state): State<AppState>, Path(room_id): Path<String>) -> Response {
    match state.rooms.snapshot(&room_id) {
        Some(snapshot) => Json(snapshot).into_response(),
        None => api_error(StatusCode::NOT_FOUND, format!("room not found: {room_id}")),
    }
}
