//! 类型模块：与智能体运行时交换的函数调用类型。
//!
//! # Types Module
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ToolDefinition`] | Function definition advertised to the agent |
//! | [`ToolCall`] | Tool call emitted by the agent |
//! | [`ToolResult`] | Result handed back for a tool call |
//!
//! ## Example
//!
//! ```rust
//! use frontend_tools::types::ToolDefinition;
//!
//! let tool = ToolDefinition::function(
//!     "get_weather",
//!     "Get current weather for a location",
//!     serde_json::json!({
//!         "type": "object",
//!         "properties": {
//!             "location": {"type": "string"}
//!         }
//!     }),
//! );
//! assert_eq!(tool.tool_type, "function");
//! ```

pub mod tool;

pub use tool::{FunctionDefinition, ToolCall, ToolDefinition, ToolResult};
