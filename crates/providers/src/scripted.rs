//! Deterministic in-process provider.
//!
//! Replays pre-recorded replies in order, one per `chat_stream` call, and
//! records every request it receives.  Used by the room runtime tests and
//! handy for running the server without network access.

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::traits::{ChatRequest, LlmProvider};
use nomi_domain::error::{Error, Result};
use nomi_domain::stream::{BoxStream, StreamEvent};

/// One step of a scripted stream.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Yield this event.
    Emit(StreamEvent),
    /// Yield a transport-level `Err` and stop.
    Fail(String),
    /// Sleep before the next step (honours a paused tokio clock).
    Pause(Duration),
}

/// What a single `chat_stream` call produces.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// The call succeeds and the stream plays these steps.
    Stream(Vec<ScriptStep>),
    /// The call itself fails before any stream exists.
    Refuse(String),
}

impl ScriptedReply {
    /// Tokens followed by a `Done` without authoritative text.
    pub fn tokens(parts: &[&str]) -> Self {
        let mut steps = token_steps(parts);
        steps.push(ScriptStep::Emit(StreamEvent::Done {
            usage: None,
            finish_reason: Some("stop".into()),
            full_text: None,
        }));
        Self::Stream(steps)
    }

    /// Tokens followed by a `Done` carrying `full_text`.
    pub fn tokens_with_full_text(parts: &[&str], full_text: &str) -> Self {
        let mut steps = token_steps(parts);
        steps.push(ScriptStep::Emit(StreamEvent::Done {
            usage: None,
            finish_reason: Some("stop".into()),
            full_text: Some(full_text.to_string()),
        }));
        Self::Stream(steps)
    }

    /// Tokens followed by an in-band provider error.
    pub fn error_after(parts: &[&str], message: &str) -> Self {
        let mut steps = token_steps(parts);
        steps.push(ScriptStep::Emit(StreamEvent::Error {
            message: message.to_string(),
        }));
        Self::Stream(steps)
    }

    /// Insert a pause before every step.
    pub fn paced(self, every: Duration) -> Self {
        match self {
            Self::Stream(steps) => Self::Stream(
                steps
                    .into_iter()
                    .flat_map(|s| [ScriptStep::Pause(every), s])
                    .collect(),
            ),
            refuse => refuse,
        }
    }
}

fn token_steps(parts: &[&str]) -> Vec<ScriptStep> {
    parts
        .iter()
        .map(|p| ScriptStep::Emit(StreamEvent::Token { text: (*p).to_string() }))
        .collect()
}

pub struct ScriptedProvider {
    id: String,
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        Self {
            id: "scripted".into(),
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply behind the existing ones.
    pub fn push(&self, reply: ScriptedReply) {
        self.replies.lock().push_back(reply);
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat_stream(
        &self,
        req: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        self.requests.lock().push(req.clone());

        let reply = self.replies.lock().pop_front();
        let steps = match reply {
            Some(ScriptedReply::Stream(steps)) => steps,
            Some(ScriptedReply::Refuse(message)) => {
                return Err(Error::Provider {
                    provider: self.id.clone(),
                    message,
                })
            }
            None => {
                return Err(Error::Provider {
                    provider: self.id.clone(),
                    message: "no scripted reply".into(),
                })
            }
        };

        let provider = self.id.clone();
        let stream = async_stream::stream! {
            for step in steps {
                match step {
                    ScriptStep::Emit(event) => yield Ok(event),
                    ScriptStep::Fail(message) => {
                        yield Err(Error::Provider { provider: provider.clone(), message });
                        return;
                    }
                    ScriptStep::Pause(d) => tokio::time::sleep(d).await,
                }
            }
        };
        Ok(Box::pin(stream))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn replays_in_order_and_records_requests() {
        let provider = ScriptedProvider::new([
            ScriptedReply::tokens(&["one"]),
            ScriptedReply::Refuse("down".into()),
        ]);

        let mut first = provider.chat_stream(&ChatRequest::default()).await.unwrap();
        assert!(matches!(first.next().await, Some(Ok(StreamEvent::Token { text })) if text == "one"));
        assert!(matches!(first.next().await, Some(Ok(StreamEvent::Done { .. }))));
        assert!(first.next().await.is_none());

        assert!(provider.chat_stream(&ChatRequest::default()).await.is_err());
        assert!(provider.chat_stream(&ChatRequest::default()).await.is_err());
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn paced_replies_wait_on_the_clock() {
        let provider = ScriptedProvider::new([
            ScriptedReply::tokens(&["a"]).paced(Duration::from_millis(100))
        ]);
        let start = tokio::time::Instant::now();
        let events: Vec<_> = provider
            .chat_stream(&ChatRequest::default())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(events.len(), 2);
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
