//! Checks that the committed frontend tool artifact matches the catalogue.
//! Used by CI to catch catalogue edits that were not regenerated.

use anyhow::Context;
use frontend_tools::codegen::{DriftStatus, Translator};
use frontend_tools::config::GeneratorConfig;
use frontend_tools::logging;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    match run().await {
        Ok(DriftStatus::UpToDate) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<DriftStatus> {
    let config = GeneratorConfig::from_env().context("invalid generator configuration")?;
    let translator = Translator::from_config(&config)?;

    println!("Using catalogue: {}", config.source.display());
    let status = translator
        .check(&config.source, &config.output)
        .await
        .with_context(|| format!("could not translate {}", config.source.display()))?;

    match status {
        DriftStatus::UpToDate => println!("✅ {} is up to date", config.output.display()),
        DriftStatus::Stale => println!(
            "❌ {} is stale; run generate_frontend_tools",
            config.output.display()
        ),
        DriftStatus::Missing => println!(
            "❌ {} does not exist; run generate_frontend_tools",
            config.output.display()
        ),
    }
    Ok(status)
}
