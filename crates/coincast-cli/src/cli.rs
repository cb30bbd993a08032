//! CLI argument definitions for coincast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forecast` | Train on a snapshot file and print scored forecasts |
//! | `screen` | List assets whose history trend exceeds a threshold |
//!
//! # Examples
//!
//! ```bash
//! coincast forecast --input markets.json --sentiment sentiment.json --pretty
//! coincast forecast --input markets.json --variant hybrid --query eth --rank
//! coincast screen --input markets.json --min-trend 25
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use coincast_engine::PipelineVariant;

#[derive(Debug, Parser)]
#[command(
    name = "coincast",
    version,
    about = "Recurrent price forecasts and investment labels for crypto assets"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Emit logs to stderr as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Detailed,
    Hybrid,
}

impl From<VariantArg> for PipelineVariant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Detailed => Self::Detailed,
            VariantArg::Hybrid => Self::Hybrid,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one training cycle and print the run report.
    ///
    /// Exit code 3 means training fell back and no fresh forecasts exist.
    Forecast(ForecastArgs),

    /// Screen assets by the trend of their full history.
    Screen(ScreenArgs),
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// JSON array of `{asset_id, name?, symbol?, current_price, history}`.
    #[arg(long)]
    pub input: PathBuf,

    /// JSON object mapping asset ids to sentiment in [-1, 1].
    #[arg(long)]
    pub sentiment: Option<PathBuf>,

    /// YAML pipeline configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base schedule; fields set in `--config` still apply on top of it.
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Seed for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep forecasts whose id, name or symbol contains this text.
    #[arg(long)]
    pub query: Option<String>,

    /// Sort forecasts by predicted change, largest first.
    #[arg(long, default_value_t = false)]
    pub rank: bool,
}

#[derive(Debug, Args)]
pub struct ScreenArgs {
    #[arg(long)]
    pub input: PathBuf,

    /// Minimum first-to-last change of the history, in percent.
    #[arg(long, default_value_t = coincast_core::screening::STRONG_GROWTH_PCT)]
    pub min_trend: f64,

    /// List every asset with its trend instead of screening.
    #[arg(long, default_value_t = false)]
    pub all: bool,
}
