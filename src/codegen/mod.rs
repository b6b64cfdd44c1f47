//! 代码生成层：把工具目录翻译成第二个运行时可直接使用的产物。
//!
//! # Schema Translator
//!
//! One-directional and regenerative: the authoring document is parsed, its
//! canonical id list drives iteration, every id is resolved to a schema, and
//! the result is rendered into one target artifact. Re-running against an
//! unchanged document yields byte-identical output and touches nothing.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`python`] | Python module target (enum + per-tool functions) |
//! | [`json`] | Published JSON document target |
//! | [`writer`] | Atomic, idempotent artifact writes |
//! | [`error`] | Generator error types |
//!
//! ## Example
//!
//! ```rust
//! use frontend_tools::catalogue::BUILTIN_AUTHORING_DOCUMENT;
//! use frontend_tools::codegen::{TargetFormat, Translator};
//!
//! let translator = Translator::new(TargetFormat::Python).unwrap();
//! let first = translator.translate_str(BUILTIN_AUTHORING_DOCUMENT, "frontend_tools.yaml").unwrap();
//! let second = translator.translate_str(BUILTIN_AUTHORING_DOCUMENT, "frontend_tools.yaml").unwrap();
//! assert_eq!(first.rendered, second.rendered);
//! ```

pub mod error;
pub mod json;
pub mod python;
pub mod writer;

pub use error::CodegenError;
pub use json::JsonEmitter;
pub use python::PythonEmitter;
pub use writer::{write_artifact, write_atomic, WriteOutcome};

use crate::catalogue::{AuthoringDocument, CatalogueLoader, ToolCatalogue, ToolId};
use crate::config::GeneratorConfig;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// Renders a validated catalogue into one target representation.
pub trait Emitter: Send + Sync {
    fn render(&self, catalogue: &ToolCatalogue, source_name: &str) -> Result<String, CodegenError>;
}

/// Target representation of the generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    #[default]
    Python,
    Json,
}

impl TargetFormat {
    pub fn default_file_name(&self) -> &'static str {
        match self {
            TargetFormat::Python => "frontend_tools.py",
            TargetFormat::Json => "frontend_tools.json",
        }
    }

    pub fn emitter(&self) -> Box<dyn Emitter> {
        match self {
            TargetFormat::Python => Box::new(PythonEmitter::new()),
            TargetFormat::Json => Box::new(JsonEmitter::new()),
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFormat::Python => write!(f, "python"),
            TargetFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for TargetFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(TargetFormat::Python),
            "json" => Ok(TargetFormat::Json),
            other => Err(format!(
                "unknown target format '{}' (expected 'python' or 'json')",
                other
            )),
        }
    }
}

/// A translated catalogue together with its rendered artifact.
#[derive(Debug, Clone)]
pub struct Translation {
    pub catalogue: ToolCatalogue,
    pub rendered: String,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub output: PathBuf,
    pub tools: Vec<ToolId>,
    pub outcome: WriteOutcome,
}

/// Result of comparing a committed artifact with a fresh translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftStatus {
    UpToDate,
    Stale,
    Missing,
}

pub struct Translator {
    loader: CatalogueLoader,
    format: TargetFormat,
}

impl Translator {
    pub fn new(format: TargetFormat) -> Result<Self, CodegenError> {
        Ok(Self {
            loader: CatalogueLoader::new()?,
            format,
        })
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self, CodegenError> {
        Self::new(config.format)
    }

    pub fn format(&self) -> TargetFormat {
        self.format
    }

    pub fn translate_document(
        &self,
        document: AuthoringDocument,
        source_name: &str,
    ) -> Result<Translation, CodegenError> {
        let catalogue = document.into_catalogue()?;
        let rendered = self.format.emitter().render(&catalogue, source_name)?;
        Ok(Translation {
            catalogue,
            rendered,
        })
    }

    pub fn translate_str(
        &self,
        content: &str,
        source_name: &str,
    ) -> Result<Translation, CodegenError> {
        let document = self.loader.parse_authoring(content)?;
        self.translate_document(document, source_name)
    }

    async fn translate_file(&self, source: &Path) -> Result<Translation, CodegenError> {
        let document = self.loader.load_authoring(source).await?;
        self.translate_document(document, &source_name(source))
    }

    /// Translate `source` and atomically replace `output`.
    ///
    /// Nothing is written unless the whole catalogue translated.
    pub async fn generate(
        &self,
        source: &Path,
        output: &Path,
    ) -> Result<GenerationReport, CodegenError> {
        debug!(source = %source.display(), format = %self.format, "translating catalogue");
        let translation = self.translate_file(source).await?;
        let outcome = write_artifact(output, &translation.rendered).await?;
        let tools: Vec<ToolId> = translation.catalogue.ids().cloned().collect();
        info!(
            output = %output.display(),
            tools = tools.len(),
            changed = outcome == WriteOutcome::Written,
            "frontend tool artifact generated"
        );
        Ok(GenerationReport {
            output: output.to_path_buf(),
            tools,
            outcome,
        })
    }

    /// Compare the committed artifact with a fresh in-memory translation.
    pub async fn check(&self, source: &Path, output: &Path) -> Result<DriftStatus, CodegenError> {
        let translation = self.translate_file(source).await?;
        match tokio::fs::read(output).await {
            Ok(existing) if existing == translation.rendered.as_bytes() => Ok(DriftStatus::UpToDate),
            Ok(_) => Ok(DriftStatus::Stale),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DriftStatus::Missing),
            Err(e) => Err(CodegenError::io(output, e)),
        }
    }
}

/// File name only, so artifacts do not depend on the machine's checkout path.
fn source_name(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| source.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_format_from_str() {
        assert_eq!("python".parse::<TargetFormat>().unwrap(), TargetFormat::Python);
        assert_eq!(" JSON ".parse::<TargetFormat>().unwrap(), TargetFormat::Json);
        assert!("typescript".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn test_source_name_strips_directories() {
        assert_eq!(
            source_name(Path::new("/srv/app/catalogue/frontend_tools.yaml")),
            "frontend_tools.yaml"
        );
    }
}
