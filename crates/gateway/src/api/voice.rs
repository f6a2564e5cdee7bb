//! Join credentials for the separate real-time voice transport.
//!
//! Tokens are HS256 JWTs in the LiveKit access-token shape: the API key as
//! issuer, the participant identity as subject, and a `video` grant that
//! allows joining exactly one room.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use nomi_domain::config::VoiceConfig;

use crate::state::AppState;

use super::api_error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Claims
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceClaims {
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    pub exp: i64,
    pub video: VideoGrant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room_join: bool,
    pub room: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Credentials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Server url plus signing material, read from the environment.
pub struct VoiceCredentials {
    pub url: String,
    api_key: String,
    api_secret: String,
    ttl_secs: i64,
}

impl VoiceCredentials {
    /// `None` unless all three variables are set and non-empty.
    pub fn from_env(cfg: &VoiceConfig) -> Option<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            url: read(&cfg.url_env)?,
            api_key: read(&cfg.api_key_env)?,
            api_secret: read(&cfg.api_secret_env)?,
            ttl_secs: i64::try_from(cfg.token_ttl_secs).unwrap_or(i64::MAX),
        })
    }

    pub fn new(url: &str, api_key: &str, api_secret: &str, ttl_secs: i64) -> Self {
        Self {
            url: url.to_owned(),
            api_key: api_key.to_owned(),
            api_secret: api_secret.to_owned(),
            ttl_secs,
        }
    }

    pub fn claims(&self, identity: &str, room: &str, now: i64) -> VoiceClaims {
        VoiceClaims {
            iss: self.api_key.clone(),
            sub: identity.to_owned(),
            nbf: now,
            exp: now.saturating_add(self.ttl_secs),
            video: VideoGrant {
                room_join: true,
                room: room.to_owned(),
            },
        }
    }

    pub fn issue(&self, identity: &str, room: &str, now: i64) -> jsonwebtoken::errors::Result<String> {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &self.claims(identity, room, now),
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /voice/token
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct VoiceTokenQuery {
    #[serde(default, alias = "roomId")]
    pub room_id: Option<String>,
    #[serde(default)]
    pub identity: Option<String>,
}

pub async fn voice_token(
    State(state): State<AppState>,
    Query(query): Query<VoiceTokenQuery>,
) -> Response {
    let cfg = &state.config.voice;
    let Some(creds) = VoiceCredentials::from_env(cfg) else {
        return api_error(StatusCode::NOT_IMPLEMENTED, "voice transport not configured");
    };

    let identity = match query.identity.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_owned(),
        _ => return api_error(StatusCode::BAD_REQUEST, "identity required"),
    };
    let room = query
        .room_id
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| cfg.default_room.clone());

    match creds.issue(&identity, &room, chrono::Utc::now().timestamp()) {
        Ok(token) => {
            tracing::info!(identity = %identity, room = %room, "voice token issued");
            Json(serde_json::json!({ "url": creds.url, "token": token })).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "voice token signing failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to sign voice token")
        }
    }
}
