//! Generator error types

use crate::catalogue::CatalogueError;

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error("Failed to render tool '{tool}': {reason}")]
    Render { tool: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CodegenError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        CodegenError::Io {
            path: path.as_ref().to_string_lossy().to_string(),
            source,
        }
    }

    /// Tool id that could not be translated, when the failure is tool-specific.
    pub fn tool_id(&self) -> Option<&str> {
        match self {
            CodegenError::Catalogue(e) => e.tool_id(),
            CodegenError::Render { tool, .. } => Some(tool),
            CodegenError::Io { .. } => None,
        }
    }
}
