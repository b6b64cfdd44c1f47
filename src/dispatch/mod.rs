//! 调度层：接收工具调用更新，校验参数并路由到界面、本地处理器或确认提示。
//!
//! # Tool Invocation Dispatcher
//!
//! Consumes the invocation feed of one chat session. Each update is keyed by
//! call id and applied by replacement; an update only takes effect when it
//! advances the invocation's lifecycle (`pending → executing → completed |
//! failed`).
//!
//! Every invocation gets exactly one treatment:
//!
//! | Treatment | Behaviour |
//! |-----------|-----------|
//! | Confirmation | Rendered as a prompt; the user's choice becomes the result |
//! | Local handler | Arguments are checked, a handler computes `{success, ...}` |
//! | Display | Rendered only; the backend drives the lifecycle |
//! | Unknown | Not in the catalogue; rendered with a generic fallback |
//!
//! Results go back through [`ResultSink`](crate::transport::ResultSink) at
//! most once per call id. A failed send raises a retryable banner.
//!
//! ## Example
//!
//! ```rust
//! use frontend_tools::dispatch::{Dispatcher, InvocationState, InvocationUpdate, ToolInvocation};
//! use frontend_tools::transport::{ChannelSink, HttpImageProbe};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> frontend_tools::Result<()> {
//! let (sink, mut results) = ChannelSink::new();
//! let mut dispatcher = Dispatcher::builtin(Arc::new(sink), Arc::new(HttpImageProbe::new()?))?;
//!
//! dispatcher
//!     .process(InvocationUpdate::new(
//!         "msg_1",
//!         ToolInvocation::new(
//!             "call_1",
//!             "change_background_color",
//!             InvocationState::Executing,
//!             json!({"colorHexCode": "#FFC0CB"}),
//!         ),
//!     ))
//!     .await;
//!
//! assert_eq!(dispatcher.background_color(), Some("#FFC0CB"));
//! assert_eq!(results.recv().await.unwrap().call_id, "call_1");
//! # Ok(())
//! # }
//! ```

pub mod confirmation;
pub mod dispatcher;
pub mod handler;
pub mod invocation;
pub mod tools;
pub mod view;

pub use confirmation::{ConfirmationPrompt, PromptError, PromptMode, Selection};
pub use dispatcher::{Dispatcher, DispatcherBuilder, HandlerCompletion, HandlerJob};
pub use handler::{
    BackgroundColorHandler, HandlerResult, LocalHandler, ProductCardHandler, UiAction,
};
pub use invocation::{InvocationState, InvocationUpdate, ToolInvocation, Transition};
pub use tools::{
    BackgroundColorArgs, ButtonSpec, ButtonStyle, ButtonValue, ConfirmationArgs,
    FrontendToolCall, ProductCardArgs, ToolInfoArgs,
};
pub use view::{Banner, Delivery, Entry, RenderedTool, SessionView, ToolCard, ToolTreatment};
