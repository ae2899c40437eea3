//! Inbound message dispatch — parses analysis requests and relays them
//! through the Gemini client.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use forge_core::request::{AnalyzeRequest, RequestKind};
use forge_core::text::trim_code_fences;
use forge_llm::types::GeminiContent;
use forge_llm::{GeminiClient, GeminiError, GenerateRequest, collect_text};

use crate::websocket::connection::ClientConnection;

/// Incoming WebSocket frame (`{"event": ..., "payload": {...}}`).
#[derive(Debug, Deserialize)]
pub struct InboundFrame {
    /// Event name identifying the request kind.
    pub event: String,
    /// Request payload, validated per event.
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Errors from handling a single request.
///
/// These never reach the client; a failed request produces no outbound
/// frame. They are logged and counted on the server side only.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload did not match the expected request shape.
    #[error("invalid request payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The upstream provider call failed.
    #[error(transparent)]
    Provider(#[from] GeminiError),
}

/// Routes analysis requests to the Gemini client and emits results back
/// on the originating connection.
pub struct Dispatcher {
    client: Arc<GeminiClient>,
}

impl Dispatcher {
    /// Create a dispatcher around a Gemini client.
    #[must_use]
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Handle one analysis request end to end.
    ///
    /// Validates the payload, streams the full provider response, strips
    /// wrapping code fences, and emits exactly one response frame on the
    /// originating connection. On any failure the connection receives
    /// nothing.
    #[instrument(skip_all, fields(conn_id = %connection.id, event = kind.request_event()))]
    pub async fn handle(
        &self,
        kind: RequestKind,
        connection: Arc<ClientConnection>,
        payload: serde_json::Value,
    ) -> Result<(), DispatchError> {
        metrics::counter!("relay_requests", "kind" => kind.request_event()).increment(1);

        let request: AnalyzeRequest = serde_json::from_value(payload)?;
        debug!(file_name = %request.file_name, "dispatching analysis request");

        let generate = GenerateRequest {
            model: kind.model().to_string(),
            contents: vec![GeminiContent::user(kind.prompt_parts(&request))],
        };

        let stream = self.client.stream_generate(&generate).await?;
        let text = collect_text(stream).await?;
        let output = trim_code_fences(&text);

        if !connection.emit(kind.response_event(), &output) {
            // Client gone or backed up; the response is dropped.
            warn!(dropped = connection.drop_count(), "failed to emit response");
        }
        Ok(())
    }
}
