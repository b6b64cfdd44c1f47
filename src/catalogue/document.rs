//! Authoring and published catalogue documents.
//!
//! The authoring form separates the canonical id list (`tools`) from the
//! per-id definitions (`schemas`); the published form is the flat ordered
//! descriptor list emitted by the JSON generator target.

use crate::catalogue::schema::ParameterSchema;
use crate::catalogue::{CatalogueError, ToolCatalogue, ToolDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Definition of one tool inside the authoring document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<ParameterSchema>,
}

/// The authoring document, as written by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthoringDocument {
    /// Canonical ordered tool ids.
    pub tools: Vec<String>,
    pub schemas: BTreeMap<String, SchemaEntry>,
}

impl AuthoringDocument {
    /// Resolve every declared id to a descriptor, in declaration order.
    ///
    /// Fails on the first id without a usable definition.
    pub fn resolve(&self) -> Result<Vec<ToolDescriptor>, CatalogueError> {
        let mut out = Vec::with_capacity(self.tools.len());
        for id in &self.tools {
            let entry = self.schemas.get(id).ok_or_else(|| {
                CatalogueError::MissingSchema {
                    id: id.clone(),
                    hint: None,
                }
                .with_hint(format!("Add a '{}' entry under 'schemas'", id))
            })?;
            let description = entry
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| CatalogueError::MissingDescription { id: id.clone() })?;
            let parameters = entry.parameters.clone().ok_or_else(|| {
                CatalogueError::InvalidSchema {
                    tool: id.clone(),
                    path: "parameters".to_string(),
                    reason: "missing parameter schema".to_string(),
                }
            })?;
            out.push(ToolDescriptor::new(id.as_str(), description, parameters));
        }

        for orphan in self.orphans() {
            tracing::warn!(tool = %orphan, "schema defined but not listed in 'tools'; skipping");
        }
        Ok(out)
    }

    /// Definitions with no entry in the id list.
    pub fn orphans(&self) -> Vec<&str> {
        self.schemas
            .keys()
            .filter(|k| !self.tools.iter().any(|t| t == *k))
            .map(String::as_str)
            .collect()
    }

    pub fn into_catalogue(self) -> Result<ToolCatalogue, CatalogueError> {
        ToolCatalogue::new(self.resolve()?)
    }
}

/// The flat document produced by the JSON target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedDocument {
    pub tools: Vec<ToolDescriptor>,
}

impl PublishedDocument {
    pub fn from_catalogue(catalogue: &ToolCatalogue) -> Self {
        Self {
            tools: catalogue.descriptors().to_vec(),
        }
    }

    pub fn into_catalogue(self) -> Result<ToolCatalogue, CatalogueError> {
        ToolCatalogue::new(self.tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> AuthoringDocument {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_resolve_follows_declaration_order() {
        let d = doc(
            r#"
tools: [zeta, alpha]
schemas:
  alpha: { description: "A", parameters: { type: object } }
  zeta: { description: "Z", parameters: { type: object } }
"#,
        );
        let ids: Vec<String> = d.resolve().unwrap().into_iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_missing_schema_names_the_tool() {
        let d = doc(
            r#"
tools: [alpha, beta]
schemas:
  alpha: { description: "A", parameters: { type: object } }
"#,
        );
        let err = d.resolve().unwrap_err();
        assert!(matches!(err, CatalogueError::MissingSchema { ref id, .. } if id == "beta"));
    }

    #[test]
    fn test_missing_description_is_reported() {
        let d = doc(
            r#"
tools: [alpha]
schemas:
  alpha: { parameters: { type: object } }
"#,
        );
        assert!(matches!(
            d.resolve(),
            Err(CatalogueError::MissingDescription { .. })
        ));
    }

    #[test]
    fn test_orphans_are_listed_not_emitted() {
        let d = doc(
            r#"
tools: [alpha]
schemas:
  alpha: { description: "A", parameters: { type: object } }
  legacy: { description: "L", parameters: { type: object } }
"#,
        );
        assert_eq!(d.orphans(), vec!["legacy"]);
        assert_eq!(d.resolve().unwrap().len(), 1);
    }
}
