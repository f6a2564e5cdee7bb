use serde::{Deserialize, Serialize};

/// Credentials for the separate real-time audio transport.
///
/// Values are read from the environment at request time; when any of the
/// three variables is missing the voice endpoint reports "not configured".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default = "d_url_env")]
    pub url_env: String,
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_api_secret_env")]
    pub api_secret_env: String,
    /// Lifetime of an issued join credential.
    #[serde(default = "d_ttl")]
    pub token_ttl_secs: u64,
    /// Room used when the request does not name one.
    #[serde(default = "d_default_room")]
    pub default_room: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            url_env: d_url_env(),
            api_key_env: d_api_key_env(),
            api_secret_env: d_api_secret_env(),
            token_ttl_secs: d_ttl(),
            default_room: d_default_room(),
        }
    }
}

fn d_url_env() -> String {
    "LIVEKIT_URL".into()
}
fn d_api_key_env() -> String {
    "LIVEKIT_API_KEY".into()
}
fn d_api_secret_env() -> String {
    "LIVEKIT_API_SECRET".into()
}
fn d_ttl() -> u64 {
    6 * 60 * 60
}
fn d_default_room() -> String {
    "global".into()
}
