mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;

use coincast_engine::telemetry::{self, LogFormat};

use crate::cli::Cli;
use crate::error::CliError;

/// Results are stale: training fell back and nothing fresh was produced.
const EXIT_STALE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    telemetry::init(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Human
    })?;

    let result = commands::run(&cli).await?;
    output::render(&result, cli.format, cli.pretty)?;

    if result.stale {
        return Ok(ExitCode::from(EXIT_STALE));
    }
    Ok(ExitCode::SUCCESS)
}
