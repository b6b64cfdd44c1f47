//! Catalogue error types

/// Catalogue integrity and loading errors.
///
/// Every variant is fatal at load or generation time.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("Failed to load catalogue from {path}: {reason}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    LoadError {
        path: String,
        reason: String,
        hint: Option<String>,
    },

    #[error("Catalogue syntax error: {0}")]
    Parse(String),

    #[error("Catalogue structure invalid:\n  - {}", .0.join("\n  - "))]
    Structure(Vec<String>),

    #[error("Duplicate tool id '{id}'{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    DuplicateId { id: String, hint: Option<String> },

    #[error("Tool '{id}' has no description")]
    MissingDescription { id: String },

    #[error("Tool '{id}' parameters must have type 'object' at the root, found '{found}'")]
    RootNotObject { id: String, found: String },

    #[error("No schema definition found for declared tool '{id}'{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    MissingSchema { id: String, hint: Option<String> },

    #[error("Invalid schema for tool '{tool}' at {path}: {reason}")]
    InvalidSchema {
        tool: String,
        path: String,
        reason: String,
    },

    #[error("Internal catalogue error: {0}")]
    Internal(String),
}

impl CatalogueError {
    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            CatalogueError::LoadError { ref mut hint, .. } => *hint = hint_val,
            CatalogueError::DuplicateId { ref mut hint, .. } => *hint = hint_val,
            CatalogueError::MissingSchema { ref mut hint, .. } => *hint = hint_val,
            _ => (),
        }
        self
    }

    /// Tool id the error is about, when there is one.
    pub fn tool_id(&self) -> Option<&str> {
        match self {
            CatalogueError::DuplicateId { id, .. }
            | CatalogueError::MissingDescription { id }
            | CatalogueError::RootNotObject { id, .. }
            | CatalogueError::MissingSchema { id, .. } => Some(id),
            CatalogueError::InvalidSchema { tool, .. } => Some(tool),
            _ => None,
        }
    }
}
