//! Serving side: how the agent learns about frontend tools.
//!
//! Frontend tools can be advertised directly as function definitions, or
//! behind a single proxy tool (`call_frontend_action`) whose calls are
//! rewritten into frontend tool calls before they reach the client stream.

use crate::catalogue::ToolCatalogue;
use crate::transport::StreamPart;
use crate::types::{ToolCall, ToolDefinition, ToolResult};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

pub const PROXY_TOOL_NAME: &str = "call_frontend_action";
pub const UNKNOWN_FRONTEND_ACTION: &str = "unknown_frontend_action";

/// Function definitions for every catalogue tool, in catalogue order.
pub fn advertise(catalogue: &ToolCatalogue) -> Vec<ToolDefinition> {
    catalogue
        .iter()
        .map(|tool| {
            ToolDefinition::function(
                tool.id.as_str(),
                tool.description.clone(),
                tool.parameters.to_json(),
            )
        })
        .collect()
}

pub fn proxy_tool_definition() -> ToolDefinition {
    ToolDefinition::function(
        PROXY_TOOL_NAME,
        "Use this function to request an action or UI update on the frontend application. \
         Specify the exact frontend action name and necessary arguments.",
        json!({
            "type": "object",
            "properties": {
                "frontend_tool_name": {
                    "type": "string",
                    "description": "The specific name of the action the frontend should perform (e.g., 'show_confirmation_modal', 'display_product_card')."
                },
                "frontend_tool_args": {
                    "type": "object",
                    "description": "A JSON object containing the arguments required by the frontend action."
                }
            },
            "required": ["frontend_tool_name", "frontend_tool_args"]
        }),
    )
}

/// Rewrites proxy tool calls into the frontend tool calls they request.
#[derive(Debug, Clone)]
pub struct FrontendActionProxy {
    catalogue: Arc<ToolCatalogue>,
}

impl FrontendActionProxy {
    pub fn new(catalogue: Arc<ToolCatalogue>) -> Self {
        Self { catalogue }
    }

    /// The frontend call behind a proxy call, reusing the proxy's call id.
    ///
    /// Returns `None` for calls of any other tool.
    pub fn intercept(&self, call: &ToolCall) -> Option<ToolCall> {
        if call.name != PROXY_TOOL_NAME {
            return None;
        }
        let name = call
            .arguments
            .get("frontend_tool_name")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_FRONTEND_ACTION)
            .to_string();
        let arguments = match call.arguments.get("frontend_tool_args") {
            Some(args) if args.is_object() => args.clone(),
            _ => json!({}),
        };

        if self.catalogue.contains(&name) {
            info!(call_id = %call.id, tool = %name, "frontend action requested");
        } else {
            warn!(call_id = %call.id, tool = %name, "proxy requested a tool outside the catalogue");
        }
        Some(ToolCall {
            id: call.id.clone(),
            name,
            arguments,
        })
    }

    /// Stream part announcing the frontend call, for proxy calls only.
    pub fn stream_part(&self, call: &ToolCall) -> Option<StreamPart> {
        self.intercept(call).map(|frontend| StreamPart::ToolCall {
            tool_call_id: frontend.id,
            tool_name: frontend.name,
            args: frontend.arguments,
        })
    }

    /// What the agent's own loop receives as the proxy call's result.
    pub fn acknowledge(&self, call: &ToolCall) -> Option<ToolResult> {
        self.intercept(call).map(|frontend| {
            ToolResult::new(
                call.id.clone(),
                Value::String(format!("Frontend action '{}' requested.", frontend.name)),
            )
        })
    }
}
