//! Drives the OpenAI-compatible adapter against a local SSE server.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use futures_util::StreamExt;

use nomi_domain::config::{AuthConfig, LlmConfig};
use nomi_domain::message::Message;
use nomi_domain::stream::StreamEvent;
use nomi_providers::{collect_text, ChatRequest, LlmProvider, OpenAiCompatProvider};

const BODY: &str = concat!(
    ": keep-alive\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
    "data: not-json\n\n",
    "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\r\n\r\n",
    "data: [DONE]\n\n",
);

async fn completions(headers: HeaderMap) -> impl IntoResponse {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("secret") {
        return (StatusCode::UNAUTHORIZED, "bad credential").into_response();
    }
    ([("content-type", "text/event-stream")], BODY).into_response()
}

/// Sends one event in two body chunks, cut inside the `é` of "café".
async fn split_codepoint() -> impl IntoResponse {
    let event = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n\ndata: [DONE]\n\n";
    let bytes = event.as_bytes().to_vec();
    let cut = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
    let (head, tail) = (bytes[..cut].to_vec(), bytes[cut..].to_vec());

    let chunks = async_stream::stream! {
        yield Ok::<_, std::convert::Infallible>(Bytes::from(head));
        tokio::time::sleep(Duration::from_millis(50)).await;
        yield Ok(Bytes::from(tail));
    };
    ([("content-type", "text/event-stream")], Body::from_stream(chunks))
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/completions", post(completions))
        .route("/split", post(split_codepoint));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/completions")
}

fn config(endpoint: String, key: Option<&str>) -> LlmConfig {
    LlmConfig {
        endpoint,
        auth: AuthConfig {
            env: None,
            key: key.map(String::from),
            ..AuthConfig::default()
        },
        ..LlmConfig::default()
    }
}

fn request() -> ChatRequest {
    ChatRequest {
        messages: vec![Message::named_user("ada", "hi")],
        temperature: Some(0.8),
        max_tokens: Some(500),
        model: None,
    }
}

#[tokio::test]
async fn streams_tokens_then_done() {
    let endpoint = spawn_server().await;
    let provider = OpenAiCompatProvider::from_config(&config(endpoint, Some("secret"))).unwrap();

    let events: Vec<_> = provider.chat_stream(&request()).await.unwrap().collect().await;
    let tokens: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            Ok(StreamEvent::Token { text }) => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(tokens, vec!["Hel", "lo"]);
    assert!(matches!(
        events.last(),
        Some(Ok(StreamEvent::Done { full_text: Some(t), .. })) if t == "Hello"
    ));
}

#[tokio::test]
async fn collect_text_reads_the_whole_reply() {
    let endpoint = spawn_server().await;
    let provider = OpenAiCompatProvider::from_config(&config(endpoint, Some("secret"))).unwrap();
    assert_eq!(collect_text(&provider, &request()).await.unwrap(), "Hello");
}

#[tokio::test]
async fn non_success_status_is_a_provider_error() {
    let endpoint = spawn_server().await;
    let provider = OpenAiCompatProvider::from_config(&config(endpoint, None)).unwrap();
    let err = match provider.chat_stream(&request()).await {
        Ok(_) => panic!("expected an error"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn multibyte_text_split_across_chunks_survives() {
    let endpoint = spawn_server().await.replace("/completions", "/split");
    let provider = OpenAiCompatProvider::from_config(&config(endpoint, Some("secret"))).unwrap();

    let events: Vec<_> = provider.chat_stream(&request()).await.unwrap().collect().await;
    assert!(matches!(
        events.first(),
        Some(Ok(StreamEvent::Token { text })) if text == "café"
    ));
    assert_eq!(collect_text(&provider, &request()).await.unwrap(), "café");
}
