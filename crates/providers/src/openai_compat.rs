//! OpenAI-compatible streaming adapter.
//!
//! Targets any endpoint that accepts an OpenAI chat-completions body with
//! `stream: true` and answers with SSE `data:` frames.  The configured
//! endpoint is used as-is, so hosted gateways with non-standard paths work.

use crate::traits::{ChatRequest, LlmProvider};
use crate::util::{from_reqwest, resolve_api_key};
use nomi_domain::config::LlmConfig;
use nomi_domain::error::{Error, Result};
use nomi_domain::message::Message;
use nomi_domain::stream::{BoxStream, StreamEvent, Usage};
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatProvider {
    id: String,
    endpoint: String,
    auth_header: String,
    /// Full header value (prefix + credential). `None` = unauthenticated.
    auth_value: Option<String>,
    default_model: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let auth_value =
            resolve_api_key(&cfg.auth).map(|key| format!("{}{}", cfg.auth.prefix, key));

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.id.clone(),
            endpoint: cfg.endpoint.clone(),
            auth_header: cfg.auth.header.clone(),
            auth_value,
            default_model: cfg.model.clone(),
            client,
        })
    }

    fn authed_post(&self) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream");
        match &self.auth_value {
            Some(value) => builder.header(&self.auth_header, value),
            None => builder,
        }
    }

    fn build_body(&self, req: &ChatRequest) -> Value {
        let messages: Vec<Value> = req.messages.iter().map(msg_to_openai).collect();

        let mut body = serde_json::json!({
            "messages": messages,
            "stream": true,
        });
        if let Some(model) = req.model.as_ref().or(self.default_model.as_ref()) {
            body["model"] = Value::String(model.clone());
        }
        if let Some(temp) = req.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        if let Some(max) = req.max_tokens {
            body["max_tokens"] = serde_json::json!(max);
        }
        body
    }
}

fn msg_to_openai(msg: &Message) -> Value {
    let mut obj = serde_json::json!({
        "role": msg.role.as_str(),
        "content": msg.content,
    });
    if let Some(name) = &msg.name {
        obj["name"] = Value::String(name.clone());
    }
    obj
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Frame parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stateful parser for `data:` payloads.
///
/// Keeps the running text so the terminal `Done` can carry the provider's
/// view of the full output.
#[derive(Default)]
pub(crate) struct FrameParser {
    text: String,
}

impl FrameParser {
    pub(crate) fn parse(&mut self, data: &str) -> Vec<Result<StreamEvent>> {
        if data.trim() == "[DONE]" {
            return vec![Ok(self.done(Some("stop".into()), None))];
        }

        let v: Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable stream frame");
                return Vec::new();
            }
        };

        if let Some(err) = v.get("error") {
            let message = err
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| err.to_string());
            return vec![Ok(StreamEvent::Error { message })];
        }

        let Some(choice) = v
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|a| a.first())
        else {
            return Vec::new();
        };

        let mut events = Vec::new();

        let content = choice
            .pointer("/delta/content")
            .and_then(|c| c.as_str())
            .or_else(|| choice.pointer("/message/content").and_then(|c| c.as_str()));
        if let Some(text) = content.filter(|t| !t.is_empty()) {
            self.text.push_str(text);
            events.push(Ok(StreamEvent::Token {
                text: text.to_string(),
            }));
        }

        if let Some(fr) = choice.get("finish_reason").and_then(|f| f.as_str()) {
            let usage = v.get("usage").and_then(parse_usage);
            events.push(Ok(self.done(Some(fr.to_string()), usage)));
        }

        events
    }

    fn done(&self, finish_reason: Option<String>, usage: Option<Usage>) -> StreamEvent {
        StreamEvent::Done {
            usage,
            finish_reason,
            full_text: Some(self.text.clone()),
        }
    }
}

fn parse_usage(v: &Value) -> Option<Usage> {
    Some(Usage {
        prompt_tokens: v.get("prompt_tokens")?.as_u64()? as u32,
        completion_tokens: v.get("completion_tokens")?.as_u64()? as u32,
        total_tokens: v.get("total_tokens")?.as_u64()? as u32,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat_stream(
        &self,
        req: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let body = self.build_body(req);

        tracing::debug!(
            provider = %self.id,
            messages = req.messages.len(),
            "openai_compat stream request"
        );

        let resp = self
            .authed_post()
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let err_text = resp.text().await.map_err(from_reqwest)?;
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), err_text),
            });
        }

        let mut parser = FrameParser::default();
        Ok(crate::sse::sse_response_stream(resp, move |data| {
            parser.parse(data)
        }))
    }

    fn provider_id(&self) -> &str {
        &self.id
    }
}
