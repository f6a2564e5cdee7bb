//! Shared helpers for provider adapters.

use nomi_domain::config::AuthConfig;
use nomi_domain::error::Error;

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub(crate) fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve the static credential from an [`AuthConfig`].
///
/// Precedence: plaintext `key` (warned about), then the `env` variable.
/// Returns `None` when neither yields a value; the caller then sends
/// requests without the auth header.
pub(crate) fn resolve_api_key(auth: &AuthConfig) -> Option<String> {
    if let Some(ref key) = auth.key {
        tracing::warn!(
            "API key loaded from plaintext config field 'key'; prefer 'env'"
        );
        return Some(key.clone());
    }

    let env_var = auth.env.as_deref()?;
    match std::env::var(env_var) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => {
            tracing::warn!(env_var, "credential env var not set; requests are unauthenticated");
            None
        }
    }
}
