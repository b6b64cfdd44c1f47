//! Catalogue loader for authoring (YAML/JSON) and published (JSON) documents

use crate::catalogue::document::{AuthoringDocument, PublishedDocument};
use crate::catalogue::validator::CatalogueValidator;
use crate::catalogue::{CatalogueError, ToolCatalogue};
use std::path::Path;
use tracing::debug;

/// Loads and validates catalogue documents.
pub struct CatalogueLoader {
    validator: CatalogueValidator,
}

impl CatalogueLoader {
    pub fn new() -> Result<Self, CatalogueError> {
        Ok(Self {
            validator: CatalogueValidator::new()?,
        })
    }

    /// Parse an authoring document (YAML, or JSON since it is a YAML subset).
    pub fn parse_authoring(&self, content: &str) -> Result<AuthoringDocument, CatalogueError> {
        let raw: serde_json::Value = serde_yaml::from_str(content)
            .map_err(|e| CatalogueError::Parse(format!("Invalid YAML: {}", e)))?;
        self.validator.validate_document(&raw)?;
        serde_json::from_value(raw)
            .map_err(|e| CatalogueError::Parse(format!("Invalid authoring document: {}", e)))
    }

    /// Parse a published document produced by the JSON target.
    pub fn parse_published(&self, content: &str) -> Result<ToolCatalogue, CatalogueError> {
        let document: PublishedDocument = serde_json::from_str(content)
            .map_err(|e| CatalogueError::Parse(format!("Invalid published catalogue: {}", e)))?;
        document.into_catalogue()
    }

    /// Read and parse the authoring document at `path`.
    pub async fn load_authoring(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<AuthoringDocument, CatalogueError> {
        let path = path.as_ref();
        let content = Self::read_text(path).await?;
        self.parse_authoring(&content)
    }

    /// Load a catalogue from either document form.
    ///
    /// `.json` files without a `schemas` key are treated as published
    /// documents; everything else is parsed as an authoring document.
    pub async fn load_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<ToolCatalogue, CatalogueError> {
        let path = path.as_ref();
        let content = Self::read_text(path).await?;
        let is_json = path
            .extension()
            .map(|ext| ext == "json")
            .unwrap_or(false);

        let catalogue = if is_json && !Self::looks_like_authoring(&content) {
            self.parse_published(&content)?
        } else {
            self.parse_authoring(&content)?.into_catalogue()?
        };
        debug!(path = %path.display(), tools = catalogue.len(), "catalogue loaded");
        Ok(catalogue)
    }

    fn looks_like_authoring(content: &str) -> bool {
        serde_json::from_str::<serde_json::Value>(content)
            .ok()
            .and_then(|v| v.get("schemas").map(|_| ()))
            .is_some()
    }

    async fn read_text(path: &Path) -> Result<String, CatalogueError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CatalogueError::LoadError {
                path: path.to_string_lossy().to_string(),
                reason: e.to_string(),
                hint: Some("Check if the file exists and you have read permissions.".to_string()),
            })?;

        // Editors on some platforms prepend a UTF-8 BOM.
        let body = if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
            bytes[3..].to_vec()
        } else {
            bytes
        };
        String::from_utf8(body).map_err(|e| CatalogueError::LoadError {
            path: path.to_string_lossy().to_string(),
            reason: format!("Invalid UTF-8: {}", e),
            hint: None,
        })
    }
}
