//! Generator configuration.
//!
//! Resolved from environment variables so the generator binary can stay
//! argument-free:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `FRONTEND_TOOLS_SOURCE` | `catalogue/frontend_tools.yaml` |
//! | `FRONTEND_TOOLS_FORMAT` | `python` |
//! | `FRONTEND_TOOLS_OUTPUT` | `generated/frontend_tools.py` (or `.json`) |

use crate::codegen::TargetFormat;
use crate::error::{Error, ErrorContext};
use std::path::PathBuf;

pub const SOURCE_ENV: &str = "FRONTEND_TOOLS_SOURCE";
pub const OUTPUT_ENV: &str = "FRONTEND_TOOLS_OUTPUT";
pub const FORMAT_ENV: &str = "FRONTEND_TOOLS_FORMAT";

const DEFAULT_SOURCE: &str = "catalogue/frontend_tools.yaml";
const DEFAULT_OUTPUT_DIR: &str = "generated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub source: PathBuf,
    pub output: PathBuf,
    pub format: TargetFormat,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let format = TargetFormat::default();
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR).join(format.default_file_name()),
            format,
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary variable lookup (used by `from_env`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let format = match non_empty(FORMAT_ENV) {
            Some(raw) => raw.parse::<TargetFormat>().map_err(|reason| {
                Error::configuration_with_context(
                    reason,
                    ErrorContext::new()
                        .with_field_path(FORMAT_ENV)
                        .with_source("generator_config"),
                )
            })?,
            None => TargetFormat::default(),
        };
        let source = non_empty(SOURCE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE));
        let output = non_empty(OUTPUT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR).join(format.default_file_name()));

        Ok(Self {
            source,
            output,
            format,
        })
    }
}
