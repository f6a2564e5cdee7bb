//! Server-sent-events framing for streaming completions.
//!
//! - [`decode_chunk`] appends network bytes to the text buffer, holding back
//!   a codepoint split across chunks
//! - [`drain_data_lines`] pulls complete `data:` payloads out of a buffer
//! - [`sse_response_stream`] turns a `reqwest::Response` plus a payload
//!   parser into a [`BoxStream`] of [`StreamEvent`]s

use crate::util::from_reqwest;
use nomi_domain::error::Result;
use nomi_domain::stream::{BoxStream, StreamEvent};

/// Decode `bytes` onto `buffer`.
///
/// An incomplete UTF-8 sequence at the end stays in `pending` until the next
/// chunk completes it.  Invalid sequences become U+FFFD.
pub(crate) fn decode_chunk(pending: &mut Vec<u8>, bytes: &[u8], buffer: &mut String) {
    pending.extend_from_slice(bytes);
    let mut start = 0;
    loop {
        match std::str::from_utf8(&pending[start..]) {
            Ok(text) => {
                buffer.push_str(text);
                pending.clear();
                return;
            }
            Err(e) => {
                let valid = start + e.valid_up_to();
                buffer.push_str(std::str::from_utf8(&pending[start..valid]).unwrap_or_default());
                match e.error_len() {
                    Some(bad) => {
                        buffer.push(char::REPLACEMENT_CHARACTER);
                        start = valid + bad;
                    }
                    None => {
                        pending.drain(..valid);
                        return;
                    }
                }
            }
        }
    }
}

/// Extract complete `data:` payloads from an SSE buffer.
///
/// Events are delimited by a blank line.  `event:`, `id:`, `retry:` and
/// comment lines (`: keep-alive`) are dropped.  Consumed bytes are removed
/// from `buffer`; a trailing partial event stays for the next call.
pub(crate) fn drain_data_lines(buffer: &mut String) -> Vec<String> {
    if buffer.contains('\r') {
        *buffer = buffer.replace("\r\n", "\n");
    }

    let mut payloads = Vec::new();
    while let Some(pos) = buffer.find("\n\n") {
        let block: String = buffer.drain(..pos + 2).collect();
        for line in block.lines() {
            if let Some(data) = line.trim().strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    payloads.push(data.to_string());
                }
            }
        }
    }
    payloads
}

/// Build a [`BoxStream`] from an SSE response and a payload parser.
///
/// The parser is `FnMut` so it can keep state across payloads (the
/// OpenAI-compatible adapter accumulates the full text).  The stream:
/// 1. ends right after the first `Done` the parser produces
/// 2. flushes a trailing unterminated event when the body closes
/// 3. emits a bare `Done` if the body closed without one
/// 4. yields `Err` on transport failure and stops
pub(crate) fn sse_response_stream<F>(
    response: reqwest::Response,
    mut parse_data: F,
) -> BoxStream<'static, Result<StreamEvent>>
where
    F: FnMut(&str) -> Vec<Result<StreamEvent>> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut response = response;
        let mut buffer = String::new();
        let mut pending = Vec::new();

        'read: loop {
            let closed = match response.chunk().await {
                Ok(Some(bytes)) => {
                    decode_chunk(&mut pending, &bytes, &mut buffer);
                    false
                }
                Ok(None) => {
                    if !pending.is_empty() {
                        buffer.push_str(&String::from_utf8_lossy(&pending));
                        pending.clear();
                    }
                    if !buffer.trim().is_empty() {
                        buffer.push_str("\n\n");
                    }
                    true
                }
                Err(e) => {
                    yield Err(from_reqwest(e));
                    return;
                }
            };

            for data in drain_data_lines(&mut buffer) {
                for event in parse_data(&data) {
                    let terminal = matches!(
                        &event,
                        Ok(StreamEvent::Done { .. }) | Ok(StreamEvent::Error { .. }) | Err(_)
                    );
                    yield event;
                    if terminal {
                        return;
                    }
                }
            }

            if closed {
                break 'read;
            }
        }

        yield Ok(StreamEvent::Done {
            usage: None,
            finish_reason: Some("stop".into()),
            full_text: None,
        });
    };

    Box::pin(stream)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_consecutive_events() {
        let mut buf = String::from("data: first\n\ndata: second\n\n");
        assert_eq!(drain_data_lines(&mut buf), vec!["first", "second"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_event_waits_for_the_rest() {
        let mut buf = String::from("data: {\"a\":1}\n\ndata: {\"b\"");
        assert_eq!(drain_data_lines(&mut buf), vec!["{\"a\":1}"]);
        assert_eq!(buf, "data: {\"b\"");

        buf.push_str(":2}\n\n");
        assert_eq!(drain_data_lines(&mut buf), vec!["{\"b\":2}"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn keep_alive_comments_and_metadata_are_dropped() {
        let mut buf = String::from(": keep-alive\n\nevent: ping\nid: 7\nretry: 100\n\ndata: x\n\n");
        assert_eq!(drain_data_lines(&mut buf), vec!["x"]);
    }

    #[test]
    fn empty_data_lines_are_skipped() {
        let mut buf = String::from("data:\n\ndata:   \n\n");
        assert!(drain_data_lines(&mut buf).is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn codepoint_split_across_chunks_is_reassembled() {
        let bytes = "data: café ✓\n\n".as_bytes();
        let cut = bytes.iter().position(|&b| b == 0xC3).unwrap() + 1;
        let mut pending = Vec::new();
        let mut buf = String::new();

        decode_chunk(&mut pending, &bytes[..cut], &mut buf);
        assert_eq!(buf, "data: caf");
        assert_eq!(pending, vec![0xC3]);

        decode_chunk(&mut pending, &bytes[cut..], &mut buf);
        assert!(pending.is_empty());
        assert_eq!(drain_data_lines(&mut buf), vec!["café ✓"]);
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let mut pending = Vec::new();
        let mut buf = String::new();
        decode_chunk(&mut pending, b"a\xFFb", &mut buf);
        assert_eq!(buf, "a\u{FFFD}b");
        assert!(pending.is_empty());
    }

    #[test]
    fn crlf_delimiters_are_accepted() {
        let mut buf = String::from("data: one\r\n\r\ndata: [DONE]\r\n\r\n");
        assert_eq!(drain_data_lines(&mut buf), vec!["one", "[DONE]"]);
    }
}
