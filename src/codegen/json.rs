//! JSON target: the published document, fetchable at runtime instead of
//! compiled into the consumer.

use crate::catalogue::{PublishedDocument, ToolCatalogue};
use crate::codegen::{CodegenError, Emitter};

#[derive(Debug, Clone, Default)]
pub struct JsonEmitter;

impl JsonEmitter {
    pub fn new() -> Self {
        Self
    }
}

impl Emitter for JsonEmitter {
    fn render(&self, catalogue: &ToolCatalogue, _source_name: &str) -> Result<String, CodegenError> {
        let document = PublishedDocument::from_catalogue(catalogue);
        let mut out = serde_json::to_string_pretty(&document).map_err(|e| CodegenError::Render {
            tool: catalogue
                .ids()
                .next()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            reason: e.to_string(),
        })?;
        out.push('\n');
        Ok(out)
    }
}
