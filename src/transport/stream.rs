//! Data-stream part codec.
//!
//! Each part is one line, `<type-id>:<json>\n`. Only the parts the tool
//! pipeline cares about are modelled.

use crate::catalogue::ToolId;
use crate::dispatch::{InvocationState, InvocationUpdate, ToolInvocation};
use crate::transport::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const TEXT_PART: &str = "0";
pub const DATA_PART: &str = "2";
pub const ERROR_PART: &str = "3";
pub const TOOL_CALL_PART: &str = "9";
pub const TOOL_RESULT_PART: &str = "a";
pub const FINISH_MESSAGE_PART: &str = "d";
pub const REASONING_PART: &str = "g";

#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    Text(String),
    Data(Value),
    Error(String),
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    ToolResult {
        tool_call_id: String,
        result: Value,
    },
    Finish(FinishMessage),
    Reasoning(String),
}

/// Payload of a finish part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishMessage {
    pub finish_reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl FinishMessage {
    pub fn stop() -> Self {
        Self {
            finish_reason: "stop".to_string(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    /// A zero `total` is taken as "not reported" and filled in from the parts.
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
        .with_total()
    }

    fn with_total(mut self) -> Self {
        if self.total_tokens == 0 {
            self.total_tokens = self.prompt_tokens + self.completion_tokens;
        }
        self
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolCallPayload {
    tool_call_id: String,
    tool_name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultPayload {
    tool_call_id: String,
    result: Value,
}

impl StreamPart {
    pub fn type_id(&self) -> &'static str {
        match self {
            StreamPart::Text(_) => TEXT_PART,
            StreamPart::Data(_) => DATA_PART,
            StreamPart::Error(_) => ERROR_PART,
            StreamPart::ToolCall { .. } => TOOL_CALL_PART,
            StreamPart::ToolResult { .. } => TOOL_RESULT_PART,
            StreamPart::Finish(_) => FINISH_MESSAGE_PART,
            StreamPart::Reasoning(_) => REASONING_PART,
        }
    }
}

/// Render one part as a protocol line (with trailing newline).
pub fn encode_part(part: &StreamPart) -> String {
    let payload = match part {
        StreamPart::Text(s) | StreamPart::Error(s) | StreamPart::Reasoning(s) => {
            serde_json::to_string(s)
        }
        StreamPart::Data(v) => serde_json::to_string(v),
        StreamPart::Finish(finish) => serde_json::to_string(finish),
        StreamPart::ToolCall {
            tool_call_id,
            tool_name,
            args,
        } => serde_json::to_string(&ToolCallPayload {
            tool_call_id: tool_call_id.clone(),
            tool_name: tool_name.clone(),
            args: args.clone(),
        }),
        StreamPart::ToolResult {
            tool_call_id,
            result,
        } => serde_json::to_string(&ToolResultPayload {
            tool_call_id: tool_call_id.clone(),
            result: result.clone(),
        }),
    };
    // Serialising strings and JSON values does not fail; fall back to an
    // error part rather than emitting a broken line.
    match payload {
        Ok(json) => format!("{}:{}\n", part.type_id(), json),
        Err(e) => format!("{}:{:?}\n", ERROR_PART, e.to_string()),
    }
}

/// Parse one protocol line.
pub fn decode_part(line: &str) -> Result<StreamPart, TransportError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (type_id, payload) = line
        .split_once(':')
        .ok_or_else(|| TransportError::Malformed(format!("missing type prefix in '{}'", line)))?;
    let bad = |e: serde_json::Error| TransportError::Malformed(format!("part {}: {}", type_id, e));

    let part = match type_id {
        TEXT_PART => StreamPart::Text(serde_json::from_str(payload).map_err(bad)?),
        DATA_PART => StreamPart::Data(serde_json::from_str(payload).map_err(bad)?),
        ERROR_PART => StreamPart::Error(serde_json::from_str(payload).map_err(bad)?),
        REASONING_PART => StreamPart::Reasoning(serde_json::from_str(payload).map_err(bad)?),
        FINISH_MESSAGE_PART => {
            let mut finish: FinishMessage = serde_json::from_str(payload).map_err(bad)?;
            finish.usage = finish.usage.map(TokenUsage::with_total);
            StreamPart::Finish(finish)
        }
        TOOL_CALL_PART => {
            let p: ToolCallPayload = serde_json::from_str(payload).map_err(bad)?;
            StreamPart::ToolCall {
                tool_call_id: p.tool_call_id,
                tool_name: p.tool_name,
                args: p.args,
            }
        }
        TOOL_RESULT_PART => {
            let p: ToolResultPayload = serde_json::from_str(payload).map_err(bad)?;
            StreamPart::ToolResult {
                tool_call_id: p.tool_call_id,
                result: p.result,
            }
        }
        other => {
            return Err(TransportError::Malformed(format!(
                "unsupported part type '{}'",
                other
            )))
        }
    };
    Ok(part)
}

/// What one decoded line means for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The turn produced output other than tool parts. Reported once, and
    /// only if no tool call of this turn was seen first.
    TurnStarted { message_id: String },
    Invocation(InvocationUpdate),
}

impl StreamEvent {
    pub fn into_update(self) -> Option<InvocationUpdate> {
        match self {
            StreamEvent::Invocation(update) => Some(update),
            StreamEvent::TurnStarted { .. } => None,
        }
    }
}

/// Turns the parts of one assistant turn into session events.
///
/// A tool call part opens an invocation in `pending`; a later tool result
/// part for the same call id completes it. Any other part makes the turn
/// known, so a text-only turn still counts as the latest one.
pub struct StreamDecoder {
    message_id: String,
    calls: HashMap<String, (ToolId, Value)>,
    announced: bool,
}

impl StreamDecoder {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            calls: HashMap::new(),
            announced: false,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn feed(&mut self, line: &str) -> Result<Option<StreamEvent>, TransportError> {
        if line.trim().is_empty() {
            return Ok(None);
        }
        let invocation = match decode_part(line)? {
            StreamPart::ToolCall {
                tool_call_id,
                tool_name,
                args,
            } => {
                let tool_id = ToolId::new(tool_name);
                self.announced = true;
                self.calls
                    .insert(tool_call_id.clone(), (tool_id.clone(), args.clone()));
                ToolInvocation::new(tool_call_id, tool_id, InvocationState::Pending, args)
            }
            StreamPart::ToolResult {
                tool_call_id,
                result,
            } => {
                let (tool_id, args) = self.calls.get(&tool_call_id).cloned().ok_or_else(|| {
                    TransportError::Malformed(format!(
                        "tool result for unknown call '{}'",
                        tool_call_id
                    ))
                })?;
                ToolInvocation::new(tool_call_id, tool_id, InvocationState::Completed, args)
                    .with_result(result)
            }
            StreamPart::Text(_)
            | StreamPart::Data(_)
            | StreamPart::Error(_)
            | StreamPart::Finish(_)
            | StreamPart::Reasoning(_) => {
                if self.announced {
                    return Ok(None);
                }
                self.announced = true;
                return Ok(Some(StreamEvent::TurnStarted {
                    message_id: self.message_id.clone(),
                }));
            }
        };
        Ok(Some(StreamEvent::Invocation(InvocationUpdate::new(
            self.message_id.clone(),
            invocation,
        ))))
    }
}
