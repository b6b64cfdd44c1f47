//! Parameter schema tree.
//!
//! A deliberately small subset of JSON Schema: `type` (single or union),
//! `enum`, `format`, `description`, `properties`, `items` and `required`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Primitive JSON type names understood by the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
        }
    }

    /// Whether `value` is an instance of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Object => value.is_object(),
            SchemaType::Array => value.is_array(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SchemaType::String | SchemaType::Number | SchemaType::Boolean
        )
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node kind: a single type, or a union written as `"type": [..]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaKind {
    Single(SchemaType),
    Union(Vec<SchemaType>),
}

impl SchemaKind {
    pub fn is(&self, ty: SchemaType) -> bool {
        matches!(self, SchemaKind::Single(t) if *t == ty)
    }

    pub fn is_union(&self) -> bool {
        matches!(self, SchemaKind::Union(_))
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            SchemaKind::Single(t) => t.accepts(value),
            SchemaKind::Union(members) => members.iter().any(|t| t.accepts(value)),
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Single(t) => write!(f, "{}", t),
            SchemaKind::Union(members) => {
                let names: Vec<&str> = members.iter().map(|t| t.as_str()).collect();
                write!(f, "union[{}]", names.join(", "))
            }
        }
    }
}

/// One node of a tool's parameter tree.
///
/// `properties` is keyed in sorted order so that every rendering of the
/// tree is deterministic; `required` and `enum` keep their authored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, ParameterSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSchema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl ParameterSchema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            format: None,
            enum_values: None,
            description: None,
            properties: None,
            items: None,
            required: None,
        }
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::Single(SchemaType::String))
    }

    pub fn number() -> Self {
        Self::new(SchemaKind::Single(SchemaType::Number))
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Single(SchemaType::Boolean))
    }

    pub fn object() -> Self {
        Self::new(SchemaKind::Single(SchemaType::Object))
    }

    pub fn array(items: ParameterSchema) -> Self {
        let mut schema = Self::new(SchemaKind::Single(SchemaType::Array));
        schema.items = Some(Box::new(items));
        schema
    }

    pub fn union(members: &[SchemaType]) -> Self {
        Self::new(SchemaKind::Union(members.to_vec()))
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn property(mut self, name: impl Into<String>, schema: ParameterSchema) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    pub fn require(mut self, names: &[&str]) -> Self {
        self.required = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Required property names, in authored order.
    pub fn required_names(&self) -> &[String] {
        self.required.as_deref().unwrap_or(&[])
    }

    pub fn property_schema(&self, name: &str) -> Option<&ParameterSchema> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    /// Required fields that are absent (or `null`) in `arguments`.
    ///
    /// Non-object arguments are missing every required field.
    pub fn missing_required<'a>(&'a self, arguments: &Value) -> Vec<&'a str> {
        self.required_names()
            .iter()
            .filter(|name| {
                arguments
                    .get(name.as_str())
                    .map(Value::is_null)
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect()
    }

    /// First structural difference between two trees, as a dotted path.
    ///
    /// Compares `kind`, `required` (as a set), `enum` (ordered) and the
    /// `properties` key sets, recursing into properties and `items`.
    /// Descriptions and formats are not structural.
    pub fn structural_mismatch(&self, other: &ParameterSchema) -> Option<String> {
        self.mismatch_at(other, "parameters")
    }

    fn mismatch_at(&self, other: &ParameterSchema, path: &str) -> Option<String> {
        if self.kind != other.kind {
            return Some(format!("{}: type {} != {}", path, self.kind, other.kind));
        }
        let req_a: BTreeSet<&String> = self.required_names().iter().collect();
        let req_b: BTreeSet<&String> = other.required_names().iter().collect();
        if req_a != req_b {
            return Some(format!("{}.required", path));
        }
        if self.enum_values != other.enum_values {
            return Some(format!("{}.enum", path));
        }
        match (&self.properties, &other.properties) {
            (None, None) => {}
            (Some(a), Some(b)) => {
                if !a.keys().eq(b.keys()) {
                    return Some(format!("{}.properties", path));
                }
                for (name, child) in a {
                    // Key sets are equal, so the lookup always succeeds.
                    if let Some(other_child) = b.get(name) {
                        let child_path = format!("{}.properties.{}", path, name);
                        if let Some(diff) = child.mismatch_at(other_child, &child_path) {
                            return Some(diff);
                        }
                    }
                }
            }
            _ => return Some(format!("{}.properties", path)),
        }
        match (&self.items, &other.items) {
            (None, None) => None,
            (Some(a), Some(b)) => a.mismatch_at(b, &format!("{}.items", path)),
            _ => Some(format!("{}.items", path)),
        }
    }

    pub fn to_json(&self) -> Value {
        // Serialising a tree of strings, vecs and maps cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
