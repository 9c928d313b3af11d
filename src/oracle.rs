//! The model oracle: an opaque text generator behind a narrow interface.
//!
//! The runtime never cares how generation happens; it hands over the
//! conversation log and gets text back. The production implementation
//! streams from an Ollama-compatible `/api/chat` endpoint.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::sync::mpsc::UnboundedSender;

use crate::history::Message;

#[derive(Debug)]
pub enum OracleError {
    /// The endpoint was unreachable or the connection broke mid-stream.
    /// Worth another attempt.
    Transport(String),
    /// The endpoint answered with a non-success status.
    Status(u16),
    /// The endpoint answered with bytes we could not make sense of.
    Decode(String),
}

impl OracleError {
    pub fn is_transient(&self) -> bool {
        matches!(self, OracleError::Transport(_))
    }
}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::Transport(e) => write!(f, "oracle unreachable: {e}"),
            OracleError::Status(code) => write!(f, "oracle answered status {code}"),
            OracleError::Decode(e) => write!(f, "oracle sent an undecodable reply: {e}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// A text-generation backend. Implementations may stream pieces into
/// `sink` as they arrive; the full reply is returned either way.
#[async_trait]
pub trait ModelOracle: Send + Sync {
    async fn generate(
        &self,
        history: &[Message],
        sink: Option<UnboundedSender<String>>,
    ) -> Result<String, OracleError>;
}

/// Talks to an Ollama-compatible chat endpoint with streaming enabled.
pub struct OllamaOracle {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaOracle {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ModelOracle for OllamaOracle {
    async fn generate(
        &self,
        history: &[Message],
        sink: Option<UnboundedSender<String>>,
    ) -> Result<String, OracleError> {
        let messages: Vec<serde_json::Value> = history
            .iter()
            .map(|m| serde_json::json!({ "role": m.wire_role(), "content": m.content() }))
            .collect();
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        // The reply is newline-delimited JSON; frames may split anywhere,
        // so buffer until each full line is in.
        let mut stream = response.bytes_stream();
        let mut store: Vec<u8> = Vec::with_capacity(4096);
        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| OracleError::Transport(e.to_string()))?;
            store.extend_from_slice(&chunk);
            while let Some(newline) = store.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = store.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let (piece, done) = decode_chat_line(line)?;
                if !piece.is_empty() {
                    if let Some(tx) = &sink {
                        let _ = tx.send(piece.clone());
                    }
                    full.push_str(&piece);
                }
                if done {
                    return Ok(full);
                }
            }
        }
        Ok(full)
    }
}

/// Decode one NDJSON frame into `(content piece, done)`.
fn decode_chat_line(line: &str) -> Result<(String, bool), OracleError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| OracleError::Decode(e.to_string()))?;
    if let Some(error) = value["error"].as_str() {
        return Err(OracleError::Decode(error.to_string()));
    }
    let piece = value["message"]["content"].as_str().unwrap_or("").to_string();
    let done = value["done"].as_bool().unwrap_or(false);
    Ok((piece, done))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_decode_piece_and_done() {
        let (piece, done) =
            decode_chat_line(r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#)
                .unwrap();
        assert_eq!(piece, "Hel");
        assert!(!done);

        let (piece, done) =
            decode_chat_line(r#"{"message":{"role":"assistant","content":""},"done":true}"#)
                .unwrap();
        assert_eq!(piece, "");
        assert!(done);
    }

    #[test]
    fn endpoint_errors_surface_as_decode_errors() {
        let err = decode_chat_line(r#"{"error":"model not found"}"#).unwrap_err();
        assert!(matches!(err, OracleError::Decode(m) if m.contains("model not found")));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode_chat_line("not json at all").is_err());
    }

    #[test]
    fn transport_errors_are_the_transient_ones() {
        assert!(OracleError::Transport("refused".to_string()).is_transient());
        assert!(!OracleError::Status(500).is_transient());
        assert!(!OracleError::Decode("x".to_string()).is_transient());
    }
}
