//! Regenerates the frontend tool artifact from the authoring catalogue.
//!
//! Takes no arguments; paths and target format come from the
//! `FRONTEND_TOOLS_*` environment variables. Exits non-zero when any tool
//! cannot be translated, leaving the previous artifact in place.

use anyhow::Context;
use frontend_tools::codegen::{CodegenError, Translator, WriteOutcome};
use frontend_tools::config::GeneratorConfig;
use frontend_tools::logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = GeneratorConfig::from_env().context("invalid generator configuration")?;
    let translator = Translator::from_config(&config)?;

    let report = translator
        .generate(&config.source, &config.output)
        .await
        .map_err(|e| describe(e, &config))?;

    let status = match report.outcome {
        WriteOutcome::Written => "written",
        WriteOutcome::Unchanged => "unchanged",
    };
    println!(
        "✅ {} ({} tools, {}): {}",
        report.output.display(),
        report.tools.len(),
        config.format,
        status
    );
    Ok(())
}

fn describe(error: CodegenError, config: &GeneratorConfig) -> anyhow::Error {
    let context = match error.tool_id() {
        Some(id) => format!("could not translate tool '{}'", id),
        None => format!("could not generate from {}", config.source.display()),
    };
    anyhow::Error::new(error).context(context)
}
