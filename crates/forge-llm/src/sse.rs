//! Server-Sent Events line parser for the Gemini byte stream.
//!
//! Handles line buffering across chunk boundaries, `data:` prefix
//! extraction, and comment/`[DONE]` filtering. Gemini may leave the final
//! chunk in the buffer without a trailing newline, so any remaining buffer
//! content is processed when the stream ends.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::warn;

/// Parse SSE lines from a byte stream and yield raw JSON data strings.
///
/// An async generator (implemented as a stream) that:
/// 1. Buffers incoming bytes
/// 2. Splits on newlines
/// 3. Extracts the `data: ` payload from SSE lines
/// 4. Skips comments, `[DONE]` markers, and empty data
pub fn parse_sse_lines<S>(byte_stream: S) -> impl Stream<Item = String> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    futures::stream::unfold(
        (byte_stream, BytesMut::with_capacity(8192), false),
        |(mut stream, mut buffer, done)| async move {
            if done {
                return None;
            }

            loop {
                // Drain complete lines already in the buffer
                if let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                    let mut line_bytes = buffer.split_to(newline_pos + 1);
                    line_bytes.truncate(line_bytes.len() - 1);
                    if line_bytes.last() == Some(&b'\r') {
                        line_bytes.truncate(line_bytes.len() - 1);
                    }

                    let line = match std::str::from_utf8(&line_bytes) {
                        Ok(s) => s,
                        Err(_) => continue, // skip invalid UTF-8 lines
                    };

                    if let Some(data) = extract_sse_data(line) {
                        return Some((data, (stream, buffer, false)));
                    }
                    continue;
                }

                match stream.next().await {
                    Some(Ok(chunk)) => {
                        buffer.extend_from_slice(&chunk);
                    }
                    Some(Err(e)) => {
                        warn!("SSE stream read error: {e}");
                        return None;
                    }
                    None => {
                        // Stream ended — the final event may lack a newline
                        if !buffer.is_empty() {
                            let line = match std::str::from_utf8(&buffer) {
                                Ok(s) => s.trim(),
                                Err(_) => return None,
                            };
                            if let Some(data) = extract_sse_data(line) {
                                buffer.clear();
                                return Some((data, (stream, buffer, true)));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

/// Extract the data payload from a single SSE line.
///
/// Returns `Some(data)` for valid data lines, `None` for comments,
/// empty lines, non-data fields, and `[DONE]` markers.
fn extract_sse_data(line: &str) -> Option<String> {
    let trimmed = line.trim();

    if trimmed.is_empty() || trimmed.starts_with(':') {
        return None;
    }

    let data = trimmed.strip_prefix("data: ").or_else(|| trimmed.strip_prefix("data:"))?;
    let data = data.trim();

    if data == "[DONE]" || data.is_empty() {
        return None;
    }

    Some(data.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── extract_sse_data ─────────────────────────────────────────────────

    #[test]
    fn extract_data_line() {
        assert_eq!(
            extract_sse_data("data: {\"candidates\":[]}"),
            Some("{\"candidates\":[]}".into())
        );
    }

    #[test]
    fn extract_data_line_no_space() {
        assert_eq!(
            extract_sse_data("data:{\"candidates\":[]}"),
            Some("{\"candidates\":[]}".into())
        );
    }

    #[test]
    fn extract_skips_done_marker() {
        assert_eq!(extract_sse_data("data: [DONE]"), None);
    }

    #[test]
    fn extract_skips_empty_data() {
        assert_eq!(extract_sse_data("data: "), None);
        assert_eq!(extract_sse_data("data:"), None);
    }

    #[test]
    fn extract_skips_empty_line_and_comment() {
        assert_eq!(extract_sse_data(""), None);
        assert_eq!(extract_sse_data("   "), None);
        assert_eq!(extract_sse_data(": keep-alive"), None);
    }

    #[test]
    fn extract_skips_non_data_field() {
        assert_eq!(extract_sse_data("event: message"), None);
        assert_eq!(extract_sse_data("id: 123"), None);
    }

    // ── parse_sse_lines ──────────────────────────────────────────────────

    #[tokio::test]
    async fn single_chunk_single_event() {
        let chunks = vec![Ok(Bytes::from("data: {\"a\":1}\n\n"))];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert_eq!(results, vec!["{\"a\":1}"]);
    }

    #[tokio::test]
    async fn multiple_events_in_one_chunk() {
        let chunks = vec![Ok(Bytes::from("data: {\"a\":1}\n\ndata: {\"b\":2}\n\n"))];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert_eq!(results, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[tokio::test]
    async fn event_split_across_chunks() {
        let chunks = vec![
            Ok(Bytes::from("data: {\"par")),
            Ok(Bytes::from("tial\":true}\n\n")),
        ];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert_eq!(results, vec!["{\"partial\":true}"]);
    }

    #[tokio::test]
    async fn done_marker_filtered() {
        let chunks = vec![Ok(Bytes::from("data: {\"ok\":true}\n\ndata: [DONE]\n\n"))];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert_eq!(results, vec!["{\"ok\":true}"]);
    }

    #[tokio::test]
    async fn comments_and_other_fields_skipped() {
        let chunks = vec![Ok(Bytes::from(
            ": comment\n\ndata: {\"v\":1}\n\nevent: ping\n\n",
        ))];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert_eq!(results, vec!["{\"v\":1}"]);
    }

    #[tokio::test]
    async fn trailing_buffer_without_newline_processed() {
        let chunks = vec![Ok(Bytes::from("data: {\"trailing\":true}"))];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert_eq!(results, vec!["{\"trailing\":true}"]);
    }

    #[tokio::test]
    async fn empty_stream_yields_nothing() {
        let chunks: Vec<Result<Bytes, reqwest::Error>> = vec![];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn carriage_returns_stripped() {
        let chunks = vec![Ok(Bytes::from("data: {\"cr\":true}\r\n\r\n"))];
        let stream = futures::stream::iter(chunks);

        let results: Vec<String> = parse_sse_lines(stream).collect().await;
        assert_eq!(results, vec!["{\"cr\":true}"]);
    }
}
