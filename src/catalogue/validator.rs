//! Catalogue validation: authoring document structure (JSON Schema) and
//! descriptor integrity.

use crate::catalogue::schema::{ParameterSchema, SchemaKind, SchemaType};
use crate::catalogue::{CatalogueError, ToolDescriptor};
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Tool ids become enum members and function names in generated code.
static TOOL_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("tool id pattern is a valid regex")
});

/// Meta-schema for the authoring document.
///
/// Kept permissive about `description` / `parameters` presence so the
/// semantic pass can report those with the offending tool id.
const AUTHORING_META_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "type": "object",
  "required": ["tools", "schemas"],
  "additionalProperties": false,
  "properties": {
    "tools": { "type": "array", "items": { "type": "string", "minLength": 1 } },
    "schemas": {
      "type": "object",
      "additionalProperties": {
        "type": "object",
        "additionalProperties": false,
        "properties": {
          "description": { "type": "string" },
          "parameters": { "$ref": "#/definitions/parameter" }
        }
      }
    }
  },
  "definitions": {
    "typeName": { "enum": ["string", "number", "boolean", "object", "array"] },
    "parameter": {
      "type": "object",
      "required": ["type"],
      "additionalProperties": false,
      "properties": {
        "type": {
          "oneOf": [
            { "$ref": "#/definitions/typeName" },
            { "type": "array", "items": { "$ref": "#/definitions/typeName" } }
          ]
        },
        "format": { "type": "string" },
        "enum": { "type": "array", "items": { "type": "string" } },
        "description": { "type": "string" },
        "properties": {
          "type": "object",
          "additionalProperties": { "$ref": "#/definitions/parameter" }
        },
        "items": { "$ref": "#/definitions/parameter" },
        "required": { "type": "array", "items": { "type": "string" } }
      }
    }
  }
}"##;

/// Validator for catalogue documents and descriptor lists.
pub struct CatalogueValidator {
    schema: JSONSchema,
}

impl CatalogueValidator {
    pub fn new() -> Result<Self, CatalogueError> {
        let schema_value: serde_json::Value = serde_json::from_str(AUTHORING_META_SCHEMA)
            .map_err(|e| CatalogueError::Internal(format!("Invalid meta-schema: {}", e)))?;
        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_value)
            .map_err(|e| CatalogueError::Internal(format!("Failed to compile meta-schema: {}", e)))?;
        Ok(Self { schema })
    }

    /// Structural check of a raw authoring document.
    pub fn validate_document(&self, document: &serde_json::Value) -> Result<(), CatalogueError> {
        if let Err(errors) = self.schema.validate(document) {
            let mut messages: Vec<String> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    if path.is_empty() {
                        e.to_string()
                    } else {
                        format!("{}: {}", path, e)
                    }
                })
                .collect();
            messages.sort();
            return Err(CatalogueError::Structure(messages));
        }
        Ok(())
    }

    /// Integrity checks every catalogue must pass before it is usable.
    pub fn validate_descriptors(tools: &[ToolDescriptor]) -> Result<(), CatalogueError> {
        let mut seen = HashSet::new();
        for tool in tools {
            let id = tool.id.as_str();
            if !seen.insert(id) {
                return Err(CatalogueError::DuplicateId {
                    id: id.to_string(),
                    hint: None,
                }
                .with_hint("Tool ids must be unique across the catalogue"));
            }
            if !TOOL_ID_PATTERN.is_match(id) {
                return Err(CatalogueError::InvalidSchema {
                    tool: id.to_string(),
                    path: "name".to_string(),
                    reason: "tool ids must match ^[A-Za-z_][A-Za-z0-9_]*$".to_string(),
                });
            }
            if tool.description.trim().is_empty() {
                return Err(CatalogueError::MissingDescription { id: id.to_string() });
            }
            if !tool.parameters.kind.is(SchemaType::Object) {
                return Err(CatalogueError::RootNotObject {
                    id: id.to_string(),
                    found: tool.parameters.kind.to_string(),
                });
            }
            Self::validate_node(id, &tool.parameters, "parameters")?;
        }
        Ok(())
    }

    fn validate_node(
        tool: &str,
        node: &ParameterSchema,
        path: &str,
    ) -> Result<(), CatalogueError> {
        let invalid = |path: &str, reason: String| CatalogueError::InvalidSchema {
            tool: tool.to_string(),
            path: path.to_string(),
            reason,
        };

        if let SchemaKind::Union(members) = &node.kind {
            if members.len() < 2 {
                return Err(invalid(path, "a union needs at least two member types".into()));
            }
            let distinct: HashSet<_> = members.iter().collect();
            if distinct.len() != members.len() {
                return Err(invalid(path, "union member types must be distinct".into()));
            }
            if let Some(t) = members.iter().find(|t| !t.is_scalar()) {
                return Err(invalid(path, format!("union members must be scalar, found '{}'", t)));
            }
        }

        if node.properties.is_some() && !node.kind.is(SchemaType::Object) {
            return Err(invalid(
                path,
                format!("'properties' is only allowed on objects, not {}", node.kind),
            ));
        }
        if node.items.is_some() && !node.kind.is(SchemaType::Array) {
            return Err(invalid(
                path,
                format!("'items' is only allowed on arrays, not {}", node.kind),
            ));
        }

        if let Some(values) = &node.enum_values {
            if !node.kind.is(SchemaType::String) {
                return Err(invalid(path, "'enum' is only allowed on strings".into()));
            }
            if values.is_empty() {
                return Err(invalid(path, "'enum' must list at least one value".into()));
            }
            let distinct: HashSet<_> = values.iter().collect();
            if distinct.len() != values.len() {
                return Err(invalid(path, "'enum' values must be distinct".into()));
            }
        }

        if let Some(required) = &node.required {
            if !node.kind.is(SchemaType::Object) {
                return Err(invalid(path, "'required' is only allowed on objects".into()));
            }
            let mut seen = HashSet::new();
            for name in required {
                if !seen.insert(name.as_str()) {
                    return Err(invalid(path, format!("'{}' is listed as required twice", name)));
                }
                if node.property_schema(name).is_none() {
                    return Err(invalid(
                        path,
                        format!("required property '{}' is not declared in 'properties'", name),
                    ));
                }
            }
        }

        if let Some(properties) = &node.properties {
            for (name, child) in properties {
                Self::validate_node(tool, child, &format!("{}.properties.{}", path, name))?;
            }
        }
        if let Some(items) = &node.items {
            Self::validate_node(tool, items, &format!("{}.items", path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(parameters: ParameterSchema) -> ToolDescriptor {
        ToolDescriptor::new("display_product_card", "Shows a product card", parameters)
    }

    #[test]
    fn test_required_must_be_declared() {
        let params = ParameterSchema::object()
            .property("product_id", ParameterSchema::string())
            .require(&["product_id", "price"]);
        let err = CatalogueValidator::validate_descriptors(&[tool(params)]).unwrap_err();
        match err {
            CatalogueError::InvalidSchema { path, reason, .. } => {
                assert_eq!(path, "parameters");
                assert!(reason.contains("'price'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_root_must_be_object() {
        let err = CatalogueValidator::validate_descriptors(&[tool(ParameterSchema::string())])
            .unwrap_err();
        assert!(matches!(err, CatalogueError::RootNotObject { ref found, .. } if found == "string"));
    }

    #[test]
    fn test_blank_description_rejected() {
        let descriptor = ToolDescriptor::new("noop", "   ", ParameterSchema::object());
        let err = CatalogueValidator::validate_descriptors(&[descriptor]).unwrap_err();
        assert!(matches!(err, CatalogueError::MissingDescription { ref id } if id == "noop"));
    }

    #[test]
    fn test_items_only_on_arrays() {
        let mut node = ParameterSchema::string();
        node.items = Some(Box::new(ParameterSchema::string()));
        let params = ParameterSchema::object().property("tags", node);
        let err = CatalogueValidator::validate_descriptors(&[tool(params)]).unwrap_err();
        assert!(
            matches!(err, CatalogueError::InvalidSchema { ref path, .. } if path == "parameters.properties.tags")
        );
    }

    #[test]
    fn test_union_members_must_be_scalar() {
        let params = ParameterSchema::object().property(
            "value",
            ParameterSchema::union(&[SchemaType::String, SchemaType::Object]),
        );
        assert!(CatalogueValidator::validate_descriptors(&[tool(params)]).is_err());
    }

    #[test]
    fn test_tool_id_must_be_identifier() {
        let descriptor = ToolDescriptor::new("display-card", "Shows a card", ParameterSchema::object());
        let err = CatalogueValidator::validate_descriptors(&[descriptor]).unwrap_err();
        assert!(matches!(err, CatalogueError::InvalidSchema { ref path, .. } if path == "name"));
    }

    #[test]
    fn test_meta_schema_rejects_unknown_top_level_keys() {
        let validator = CatalogueValidator::new().unwrap();
        let doc = json!({"tools": [], "schemas": {}, "version": 2});
        assert!(matches!(
            validator.validate_document(&doc),
            Err(CatalogueError::Structure(_))
        ));
    }

    #[test]
    fn test_meta_schema_rejects_unknown_type_name() {
        let validator = CatalogueValidator::new().unwrap();
        let doc = json!({
            "tools": ["t"],
            "schemas": {"t": {"description": "d", "parameters": {"type": "integer"}}}
        });
        let err = validator.validate_document(&doc).unwrap_err();
        assert!(err.to_string().contains("/schemas/t/parameters"));
    }

    #[test]
    fn test_meta_schema_accepts_union_type() {
        let validator = CatalogueValidator::new().unwrap();
        let doc = json!({
            "tools": ["t"],
            "schemas": {"t": {"description": "d", "parameters": {
                "type": "object",
                "properties": {"v": {"type": ["string", "boolean"]}}
            }}}
        });
        assert!(validator.validate_document(&doc).is_ok());
    }
}
