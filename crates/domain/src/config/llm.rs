use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation endpoint
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The streaming completion endpoint the AI participant talks to.
///
/// The endpoint speaks the OpenAI chat-completions SSE dialect; `endpoint`
/// is the full URL that receives the POST (no path is appended).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Identifier used in logs and error messages.
    #[serde(default = "d_provider_id")]
    pub id: String,
    #[serde(default = "d_endpoint")]
    pub endpoint: String,
    /// Model name sent in the body. Omitted when `None`.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Sampling temperature for conversational turns.
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    /// Maximum output tokens for conversational turns.
    #[serde(default = "d_max_tokens")]
    pub max_tokens: u32,
    /// Whole-request HTTP timeout. This is the only timeout a turn has.
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            id: d_provider_id(),
            endpoint: d_endpoint(),
            model: None,
            auth: AuthConfig::default(),
            temperature: d_temperature(),
            max_tokens: d_max_tokens(),
            timeout_ms: d_timeout_ms(),
        }
    }
}

/// Static credential for the generation endpoint.
///
/// Precedence: `key` (plaintext, warned about) then the `env` variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Header that carries the credential.
    #[serde(default = "d_auth_header")]
    pub header: String,
    /// Prefix prepended to the credential (e.g. `"Bearer "`).
    #[serde(default)]
    pub prefix: String,
    /// Environment variable holding the credential.
    #[serde(default = "d_auth_env")]
    pub env: Option<String>,
    /// Plaintext credential. Prefer `env`.
    #[serde(default)]
    pub key: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            header: d_auth_header(),
            prefix: String::new(),
            env: d_auth_env(),
            key: None,
        }
    }
}

fn d_provider_id() -> String {
    "jllm".into()
}
fn d_endpoint() -> String {
    "https://janitorai.com/hackathon/completions".into()
}
fn d_temperature() -> f32 {
    0.8
}
fn d_max_tokens() -> u32 {
    500
}
fn d_timeout_ms() -> u64 {
    120_000
}
fn d_auth_header() -> String {
    "Authorization".into()
}
fn d_auth_env() -> Option<String> {
    Some("JLLM_AUTH".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_conversational_sampling() {
        let cfg = LlmConfig::default();
        assert!((cfg.temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(cfg.max_tokens, 500);
        assert_eq!(cfg.auth.header, "Authorization");
        assert_eq!(cfg.auth.env.as_deref(), Some("JLLM_AUTH"));
        assert!(cfg.auth.prefix.is_empty());
    }

    #[test]
    fn parses_bearer_style_auth() {
        let toml_str = r#"
            endpoint = "http://localhost:8000/v1/chat/completions"
            model = "llama3"

            [auth]
            prefix = "Bearer "
            env = "OPENAI_API_KEY"
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.model.as_deref(), Some("llama3"));
        assert_eq!(cfg.auth.prefix, "Bearer ");
        assert_eq!(cfg.auth.env.as_deref(), Some("OPENAI_API_KEY"));
    }
}
