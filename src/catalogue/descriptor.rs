//! Tool descriptors and the validated catalogue

use crate::catalogue::schema::ParameterSchema;
use crate::catalogue::validator::CatalogueValidator;
use crate::catalogue::CatalogueError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

/// Wire-level name of a tool. Renaming one is a breaking change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(String);

impl ToolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ToolId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ToolId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ToolId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One invocable tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(rename = "name")]
    pub id: ToolId,
    pub description: String,
    pub parameters: ParameterSchema,
}

impl ToolDescriptor {
    pub fn new(
        id: impl Into<ToolId>,
        description: impl Into<String>,
        parameters: ParameterSchema,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Ordered, validated set of tool descriptors.
///
/// Only constructible through [`ToolCatalogue::new`], so every value in
/// circulation has unique ids and object-rooted parameter trees.
#[derive(Debug, Clone)]
pub struct ToolCatalogue {
    tools: Vec<ToolDescriptor>,
    index: HashMap<ToolId, usize>,
}

impl ToolCatalogue {
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self, CatalogueError> {
        CatalogueValidator::validate_descriptors(&tools)?;
        let index = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        Ok(Self { tools, index })
    }

    pub fn get(&self, id: &str) -> Option<&ToolDescriptor> {
        self.index.get(id).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ToolId> {
        self.tools.iter().map(|t| &t.id)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }
}

impl<'a> IntoIterator for &'a ToolCatalogue {
    type Item = &'a ToolDescriptor;
    type IntoIter = std::slice::Iter<'a, ToolDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.tools.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_tool() -> ToolDescriptor {
        ToolDescriptor::new(
            "change_background_color",
            "Sets the background color",
            ParameterSchema::object()
                .property("colorHexCode", ParameterSchema::string())
                .require(&["colorHexCode"]),
        )
    }

    #[test]
    fn test_lookup_by_str() {
        let catalogue = ToolCatalogue::new(vec![color_tool()]).unwrap();
        assert!(catalogue.contains("change_background_color"));
        assert_eq!(
            catalogue.get("change_background_color").unwrap().description,
            "Sets the background color"
        );
        assert!(catalogue.get("does_not_exist").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected_at_construction() {
        let err = ToolCatalogue::new(vec![color_tool(), color_tool()]).unwrap_err();
        assert!(matches!(err, CatalogueError::DuplicateId { ref id, .. } if id == "change_background_color"));
    }

    #[test]
    fn test_descriptor_serialises_id_as_name() {
        let value = serde_json::to_value(color_tool()).unwrap();
        assert_eq!(value["name"], "change_background_color");
        assert_eq!(value["parameters"]["type"], "object");
    }
}
