//! Python target: a module with a tool-name enum, one schema function per
//! tool and an aggregate accessor.

use crate::catalogue::schema::{ParameterSchema, SchemaKind};
use crate::catalogue::{ToolCatalogue, ToolDescriptor};
use crate::codegen::{CodegenError, Emitter};
use std::collections::HashMap;
use std::fmt::Write as _;

const INDENT: &str = "    ";

#[derive(Debug, Clone, Default)]
pub struct PythonEmitter;

impl PythonEmitter {
    pub fn new() -> Self {
        Self
    }

    fn member_name(tool: &ToolDescriptor) -> String {
        tool.id.as_str().to_uppercase()
    }

    fn function_name(tool: &ToolDescriptor) -> String {
        format!("get_{}_schema", tool.id.as_str())
    }

    fn render_tool(&self, out: &mut String, tool: &ToolDescriptor) -> Result<(), CodegenError> {
        let id = tool.id.as_str();
        let _ = writeln!(out, "def {}() -> Dict[str, Any]:", Self::function_name(tool));
        let _ = writeln!(out, "{INDENT}\"\"\"Generate schema for the {} tool\"\"\"", id);
        let _ = writeln!(out, "{INDENT}return {{");
        let _ = writeln!(
            out,
            "{INDENT}{INDENT}\"name\": FrontendToolName.{},",
            Self::member_name(tool)
        );
        let _ = writeln!(
            out,
            "{INDENT}{INDENT}\"description\": {},",
            quote(id, &tool.description)?
        );
        let _ = write!(out, "{INDENT}{INDENT}\"parameters\": ");
        write_schema(out, id, &tool.parameters, 2)?;
        out.push('\n');
        let _ = writeln!(out, "{INDENT}}}");
        Ok(())
    }
}

impl Emitter for PythonEmitter {
    fn render(&self, catalogue: &ToolCatalogue, source_name: &str) -> Result<String, CodegenError> {
        let mut members: HashMap<String, &str> = HashMap::new();
        for tool in catalogue {
            if let Some(previous) = members.insert(Self::member_name(tool), tool.id.as_str()) {
                return Err(CodegenError::Render {
                    tool: tool.id.to_string(),
                    reason: format!("enum member name collides with tool '{}'", previous),
                });
            }
        }

        let mut out = String::new();
        out.push_str("# frontend_tools.py\n");
        out.push_str("# GENERATED FILE - DO NOT EDIT DIRECTLY\n");
        let _ = writeln!(out, "# This file is auto-generated from {}", source_name);
        out.push_str("# To make changes, edit the catalogue and run generate_frontend_tools\n\n");
        out.push_str("from enum import Enum\n");
        out.push_str("from typing import Any, Dict, List\n\n");

        section(&mut out, "Tool Name Enum");
        out.push_str("class FrontendToolName(str, Enum):\n");
        let _ = writeln!(out, "{INDENT}\"\"\"Enum for all available frontend tool names\"\"\"");
        for tool in catalogue {
            let _ = writeln!(
                out,
                "{INDENT}{} = {}",
                Self::member_name(tool),
                quote(tool.id.as_str(), tool.id.as_str())?
            );
        }
        out.push('\n');

        section(&mut out, "Schema Definitions");
        for tool in catalogue {
            self.render_tool(&mut out, tool)?;
            out.push('\n');
        }

        out.push_str("def get_all_frontend_tool_schemas() -> List[Dict[str, Any]]:\n");
        let _ = writeln!(out, "{INDENT}\"\"\"Get all frontend tool schemas\"\"\"");
        let calls: Vec<String> = catalogue
            .iter()
            .map(|t| format!("{INDENT}{INDENT}{}()", Self::function_name(t)))
            .collect();
        if calls.is_empty() {
            let _ = writeln!(out, "{INDENT}return []");
        } else {
            let _ = writeln!(out, "{INDENT}return [");
            out.push_str(&calls.join(",\n"));
            out.push('\n');
            let _ = writeln!(out, "{INDENT}]");
        }
        Ok(out)
    }
}

fn section(out: &mut String, title: &str) {
    let rule = format!("# {}\n", "-".repeat(77));
    out.push_str(&rule);
    let _ = writeln!(out, "# {}", title);
    out.push_str(&rule);
    out.push('\n');
}

/// Double-quoted literal. JSON string escapes are valid Python escapes.
fn quote(tool: &str, text: &str) -> Result<String, CodegenError> {
    serde_json::to_string(text).map_err(|e| CodegenError::Render {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

fn quote_list(tool: &str, items: &[String]) -> Result<String, CodegenError> {
    let quoted: Result<Vec<String>, CodegenError> =
        items.iter().map(|item| quote(tool, item)).collect();
    Ok(format!("[{}]", quoted?.join(", ")))
}

fn write_schema(
    out: &mut String,
    tool: &str,
    node: &ParameterSchema,
    depth: usize,
) -> Result<(), CodegenError> {
    let pad = INDENT.repeat(depth + 1);
    let mut fields: Vec<String> = Vec::new();

    let kind = match &node.kind {
        SchemaKind::Single(t) => quote(tool, t.as_str())?,
        SchemaKind::Union(members) => {
            let names: Vec<String> = members.iter().map(|t| t.as_str().to_string()).collect();
            quote_list(tool, &names)?
        }
    };
    fields.push(format!("{pad}\"type\": {kind}"));
    if let Some(format) = &node.format {
        fields.push(format!("{pad}\"format\": {}", quote(tool, format)?));
    }
    if let Some(values) = &node.enum_values {
        fields.push(format!("{pad}\"enum\": {}", quote_list(tool, values)?));
    }
    if let Some(description) = &node.description {
        fields.push(format!("{pad}\"description\": {}", quote(tool, description)?));
    }
    if let Some(properties) = &node.properties {
        let mut block = format!("{pad}\"properties\": {{");
        if !properties.is_empty() {
            block.push('\n');
            let inner = INDENT.repeat(depth + 2);
            let mut entries = Vec::with_capacity(properties.len());
            for (name, child) in properties {
                let mut entry = format!("{inner}{}: ", quote(tool, name)?);
                write_schema(&mut entry, tool, child, depth + 2)?;
                entries.push(entry);
            }
            block.push_str(&entries.join(",\n"));
            block.push('\n');
            block.push_str(&pad);
        }
        block.push('}');
        fields.push(block);
    }
    if let Some(items) = &node.items {
        let mut block = format!("{pad}\"items\": ");
        write_schema(&mut block, tool, items, depth + 1)?;
        fields.push(block);
    }
    if let Some(required) = &node.required {
        fields.push(format!("{pad}\"required\": {}", quote_list(tool, required)?));
    }

    out.push_str("{\n");
    out.push_str(&fields.join(",\n"));
    out.push('\n');
    out.push_str(&INDENT.repeat(depth));
    out.push('}');
    Ok(())
}
