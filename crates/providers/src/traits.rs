use futures_util::StreamExt;

use nomi_domain::error::{Error, Result};
use nomi_domain::message::Message;
use nomi_domain::stream::{BoxStream, StreamEvent};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The conversation messages to send, in order.
    pub messages: Vec<Message>,
    /// Sampling temperature. `None` lets the provider choose.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response. `None` lets the provider choose.
    pub max_tokens: Option<u32>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A black-box streaming text generator.
///
/// The returned stream yields zero or more [`StreamEvent::Token`]s and ends
/// with exactly one terminal item: [`StreamEvent::Done`],
/// [`StreamEvent::Error`], or an `Err`.  Keep-alive and unparseable frames
/// never reach the caller.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and return a stream of events.
    async fn chat_stream(
        &self,
        req: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}

/// Drain a completion stream and return the final text, for callers that do
/// not forward fragments (the summarizer).
///
/// The provider's authoritative `full_text` wins over the local
/// accumulation when it is present and non-empty.
pub async fn collect_text(provider: &dyn LlmProvider, req: &ChatRequest) -> Result<String> {
    let mut stream = provider.chat_stream(req).await?;
    let mut text = String::new();

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Token { text: fragment } => text.push_str(&fragment),
            StreamEvent::Done { full_text, .. } => {
                if let Some(full) = full_text.filter(|t| !t.is_empty()) {
                    text = full;
                }
                break;
            }
            StreamEvent::Error { message } => {
                return Err(Error::Provider {
                    provider: provider.provider_id().to_string(),
                    message,
                })
            }
        }
    }

    Ok(text)
}
