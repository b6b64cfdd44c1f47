//! 工具目录层：工具描述、参数模式与加载时完整性校验。
//!
//! # Tool Catalogue
//!
//! The single source of truth for every frontend tool: its wire name, the
//! description shown to the agent, and its parameter tree.
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`schema`] | Recursive parameter schema (`ParameterSchema`) |
//! | [`descriptor`] | `ToolId`, `ToolDescriptor` and the validated `ToolCatalogue` |
//! | [`document`] | Authoring and published document shapes |
//! | [`validator`] | Meta-schema and integrity validation |
//! | [`loader`] | File loading for both document forms |
//! | [`error`] | Catalogue error types |
//!
//! ## Example
//!
//! ```rust
//! use frontend_tools::catalogue::ToolCatalogue;
//!
//! let catalogue = ToolCatalogue::builtin();
//! let tool = catalogue.get("change_background_color").unwrap();
//! assert_eq!(tool.parameters.required_names(), ["colorHexCode"]);
//! ```

pub mod descriptor;
pub mod document;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validator;

pub use descriptor::{ToolCatalogue, ToolDescriptor, ToolId};
pub use document::{AuthoringDocument, PublishedDocument, SchemaEntry};
pub use error::CatalogueError;
pub use loader::CatalogueLoader;
pub use schema::{ParameterSchema, SchemaKind, SchemaType};
pub use validator::CatalogueValidator;

use once_cell::sync::Lazy;

/// Authoring document shipped with the crate.
pub const BUILTIN_AUTHORING_DOCUMENT: &str = include_str!("../../catalogue/frontend_tools.yaml");

/// Well-known tool ids of the built-in catalogue.
pub mod names {
    pub const ASK_USER_CONFIRMATION: &str = "ask_user_confirmation";
    pub const DISPLAY_PRODUCT_CARD: &str = "display_product_card";
    pub const DISPLAY_TOOL_INFO: &str = "display_tool_info";
    pub const CHANGE_BACKGROUND_COLOR: &str = "change_background_color";
}

static BUILTIN: Lazy<ToolCatalogue> = Lazy::new(|| {
    CatalogueLoader::new()
        .and_then(|loader| loader.parse_authoring(BUILTIN_AUTHORING_DOCUMENT))
        .and_then(AuthoringDocument::into_catalogue)
        .expect("built-in catalogue must be valid (covered by unit tests)")
});

impl ToolCatalogue {
    /// The process-wide built-in catalogue, parsed once on first use.
    pub fn builtin() -> &'static ToolCatalogue {
        &BUILTIN
    }
}
