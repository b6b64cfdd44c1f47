//! Boundary with the external chat transport.
//!
//! The core only needs two things from the outside world: a way to send a
//! tool result back keyed by call id ([`ResultSink`]), and a way to check
//! that an image URL loads ([`ImageProbe`]). The [`stream`] codec covers the
//! line-oriented data-stream parts the chat client exchanges.

pub mod http;
pub mod stream;

pub use http::{HttpImageProbe, ImageCheck, ImageProbe};
pub use stream::{FinishMessage, StreamDecoder, StreamEvent, StreamPart, TokenUsage};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport returned status {0}")]
    Status(u16),

    #[error("Transport channel closed")]
    Closed,

    #[error("Malformed stream part: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Outbound "send tool result" call.
///
/// Delivery and retry semantics belong to the implementation; the
/// dispatcher calls it at most once per successful delivery of a call id.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn send_result(&self, call_id: &str, result: Value) -> Result<(), TransportError>;
}

/// A tool result addressed to the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundResult {
    pub call_id: String,
    pub result: Value,
}

impl OutboundResult {
    pub fn to_part(&self) -> StreamPart {
        StreamPart::ToolResult {
            tool_call_id: self.call_id.clone(),
            result: self.result.clone(),
        }
    }
}

/// Sink that forwards results into a tokio channel drained by the transport.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<OutboundResult>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ResultSink for ChannelSink {
    async fn send_result(&self, call_id: &str, result: Value) -> Result<(), TransportError> {
        self.tx
            .send(OutboundResult {
                call_id: call_id.to_string(),
                result,
            })
            .map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_sink_forwards_results() {
        let (sink, mut rx) = ChannelSink::new();
        sink.send_result("call_1", json!({"confirmed": true})).await.unwrap();
        let sent = rx.recv().await.unwrap();
        assert_eq!(sent.call_id, "call_1");
        assert_eq!(
            stream::encode_part(&sent.to_part()),
            "a:{\"toolCallId\":\"call_1\",\"result\":{\"confirmed\":true}}\n"
        );
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        let err = sink.send_result("call_1", json!(null)).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
