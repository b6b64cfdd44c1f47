//! # frontend-tools
//!
//! 前端工具目录、模式生成器与工具调用调度器。
//!
//! One tool catalogue, two runtimes. Frontend tools are declared once in an
//! authoring document, translated into the artifact the agent server loads,
//! and interpreted on the client when the agent invokes them.
//!
//! ## Overview
//!
//! - **Catalogue**: ordered, validated tool descriptors with recursive
//!   parameter schemas. Integrity violations fail at load time.
//! - **Translator**: regenerates a Python module or JSON document from the
//!   authoring YAML. Output is byte-identical for unchanged input and is
//!   written atomically.
//! - **Dispatcher**: consumes tool invocation updates keyed by call id,
//!   checks arguments, runs local handlers or confirmation prompts and sends
//!   each result back exactly once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frontend_tools::codegen::Translator;
//! use frontend_tools::config::GeneratorConfig;
//!
//! #[tokio::main]
//! async fn main() -> frontend_tools::Result<()> {
//!     let config = GeneratorConfig::from_env()?;
//!     let translator = Translator::from_config(&config)?;
//!     let report = translator.generate(&config.source, &config.output).await?;
//!     println!("{} tools -> {}", report.tools.len(), report.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`catalogue`] | Tool descriptors, parameter schemas, load-time validation |
//! | [`codegen`] | Schema translator and artifact writers |
//! | [`dispatch`] | Invocation lifecycle, handlers, confirmation prompts |
//! | [`transport`] | Result sink, image probe, data-stream codec |
//! | [`serving`] | Advertising tools to the agent, proxy tool rewriting |
//! | [`types`] | Function-calling types |
//! | [`config`] | Generator configuration |
//! | [`logging`] | Subscriber setup for the binaries |

pub mod catalogue;
pub mod codegen;
pub mod config;
pub mod dispatch;
pub mod logging;
pub mod serving;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use catalogue::{ParameterSchema, ToolCatalogue, ToolDescriptor, ToolId};
pub use codegen::{TargetFormat, Translator};
pub use dispatch::{Dispatcher, DispatcherBuilder, InvocationState, InvocationUpdate, ToolInvocation};
pub use transport::{ResultSink, TransportError};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
