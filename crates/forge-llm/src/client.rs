//! Streaming Gemini client (API-key authentication).
//!
//! One request maps to one `streamGenerateContent` call. The response SSE
//! stream is parsed into text fragments; [`collect_text`] concatenates
//! them into the full response body, aborting on the first error.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{debug, error, instrument, warn};

use forge_core::text::truncate_str;

use crate::error::GeminiError;
use crate::sse::parse_sse_lines;
use crate::types::{
    DEFAULT_BASE_URL, GeminiContent, GeminiStreamChunk, HarmProbability, relay_generation_config,
    relay_safety_settings,
};

/// Stream of response text fragments in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, GeminiError>> + Send>>;

/// A single generation request.
#[derive(Clone, Debug)]
pub struct GenerateRequest {
    /// Model ID. Plain IDs (`gemini-1.0-pro`) resolve under `models/`;
    /// IDs already carrying a path (`tunedModels/...`) are used as-is.
    pub model: String,
    /// Conversation contents (the relay sends a single user turn).
    pub contents: Vec<GeminiContent>,
}

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    /// HTTP client (reused across requests).
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new client against the production API.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the API base URL (tests point this at a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a shared HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The streaming endpoint URL for a model.
    fn api_url(&self, model: &str) -> String {
        let base = &self.base_url;
        let key = &self.api_key;
        if model.contains('/') {
            // Tuned models carry their collection prefix in the ID.
            format!("{base}/{model}:streamGenerateContent?key={key}&alt=sse")
        } else {
            format!("{base}/models/{model}:streamGenerateContent?key={key}&alt=sse")
        }
    }

    /// Build the request body with the relay's fixed generation policy.
    fn build_request_body(contents: &[GeminiContent]) -> serde_json::Value {
        json!({
            "contents": contents,
            "generationConfig": relay_generation_config(),
            "safetySettings": relay_safety_settings(),
        })
    }

    /// Start a streaming generation and return its fragment stream.
    ///
    /// Non-2xx responses are mapped through the error-body parser before
    /// any stream is returned; errors inside the stream (chunk-level error
    /// objects, `SAFETY` finishes) surface as `Err` items.
    #[instrument(skip_all, fields(model = %request.model))]
    pub async fn stream_generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<FragmentStream, GeminiError> {
        let url = self.api_url(&request.model);
        let body = Self::build_request_body(&request.contents);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        debug!(
            content_count = request.contents.len(),
            "starting Gemini stream"
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(GeminiError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map_or(0, |secs| secs * 1000);
            let body_text = response.text().await.unwrap_or_default();
            let (message, code, retryable) = parse_api_error(&body_text, status.as_u16());
            error!(
                status = status.as_u16(),
                code = code.as_deref().unwrap_or("unknown"),
                retryable,
                "Gemini API error"
            );
            if status.as_u16() == 429 {
                return Err(GeminiError::RateLimited {
                    retry_after_ms,
                    message,
                });
            }
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
                code,
                retryable,
            });
        }

        let byte_stream = Box::pin(response.bytes_stream());
        let fragments = parse_sse_lines(byte_stream).flat_map(|line| {
            let items = match serde_json::from_str::<GeminiStreamChunk>(&line) {
                Ok(chunk) => chunk_fragments(chunk),
                Err(e) => {
                    warn!(
                        error = %e,
                        data_preview = truncate_str(&line, 100),
                        "failed to parse Gemini SSE chunk"
                    );
                    vec![]
                }
            };
            futures::stream::iter(items)
        });

        Ok(Box::pin(fragments))
    }
}

/// Extract fragment items from a parsed stream chunk.
fn chunk_fragments(chunk: GeminiStreamChunk) -> Vec<Result<String, GeminiError>> {
    if let Some(error) = chunk.error {
        let retryable = error.code == 429 || error.code >= 500;
        return vec![Err(GeminiError::Api {
            status: u16::try_from(error.code).unwrap_or(500),
            message: error.message,
            code: None,
            retryable,
        })];
    }

    let mut items = Vec::new();
    let Some(candidate) = chunk.candidates.into_iter().flatten().next() else {
        return items;
    };

    if let Some(content) = &candidate.content {
        for part in &content.parts {
            if let Some(text) = part.visible_text() {
                if !text.is_empty() {
                    items.push(Ok(text.to_string()));
                }
            }
        }
    }

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        let reason = candidate
            .safety_ratings
            .as_ref()
            .and_then(|ratings| {
                ratings
                    .iter()
                    .find(|r| {
                        matches!(r.probability, HarmProbability::Medium | HarmProbability::High)
                    })
                    .and_then(|r| serde_json::to_value(r.category).ok())
            })
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| "SAFETY".to_string());
        items.push(Err(GeminiError::SafetyBlocked { reason }));
    }

    items
}

/// Parse an API error response body.
fn parse_api_error(body: &str, status: u16) -> (String, Option<String>, bool) {
    let retryable = status == 429 || status >= 500;
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let error = &json["error"];
        let message = error["message"]
            .as_str()
            .unwrap_or("Unknown error")
            .to_string();
        let code = error["status"].as_str().map(String::from);
        (message, code, retryable)
    } else {
        (format!("HTTP {status}: {body}"), None, retryable)
    }
}

/// Consume a fragment stream into the full response text.
///
/// Fragments are concatenated in arrival order; the first `Err` aborts
/// and is returned as-is.
pub async fn collect_text(mut stream: FragmentStream) -> Result<String, GeminiError> {
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment?);
    }
    Ok(text)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
