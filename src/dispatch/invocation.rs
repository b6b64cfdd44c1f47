//! Tool invocation lifecycle

use crate::catalogue::ToolId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle state of one invocation. Only external events move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationState {
    Pending,
    Executing,
    Completed,
    Failed,
}

impl InvocationState {
    fn rank(&self) -> u8 {
        match self {
            InvocationState::Pending => 0,
            InvocationState::Executing => 1,
            InvocationState::Completed | InvocationState::Failed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }

    /// Classify moving from `self` to `next`.
    pub fn transition_to(&self, next: InvocationState) -> Transition {
        if *self == next {
            Transition::Duplicate
        } else if self.is_terminal() && next.is_terminal() {
            Transition::Conflict
        } else if next.rank() > self.rank() {
            Transition::Advance
        } else {
            Transition::Stale
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationState::Pending => "pending",
            InvocationState::Executing => "executing",
            InvocationState::Completed => "completed",
            InvocationState::Failed => "failed",
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an incoming state relates to the one already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Strictly later in the lifecycle; replaces the recorded invocation.
    Advance,
    /// Same state delivered again; no additional effect.
    Duplicate,
    /// Earlier state delivered late; ignored.
    Stale,
    /// A second, different terminal state; the first one wins.
    Conflict,
}

/// One call of a tool, as delivered by the chat transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub call_id: String,
    pub tool_id: ToolId,
    pub state: InvocationState,
    #[serde(default)]
    pub arguments: Value,
    /// Present only when `state` is `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolInvocation {
    pub fn new(
        call_id: impl Into<String>,
        tool_id: impl Into<ToolId>,
        state: InvocationState,
        arguments: Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_id: tool_id.into(),
            state,
            arguments,
            result: None,
            error: None,
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Drop a `result` delivered with a non-completed state.
    pub fn normalized(mut self) -> Self {
        if self.state != InvocationState::Completed {
            self.result = None;
        }
        self
    }
}

/// An invocation update attached to the assistant turn that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationUpdate {
    pub message_id: String,
    pub invocation: ToolInvocation,
}

impl InvocationUpdate {
    pub fn new(message_id: impl Into<String>, invocation: ToolInvocation) -> Self {
        Self {
            message_id: message_id.into(),
            invocation,
        }
    }
}
