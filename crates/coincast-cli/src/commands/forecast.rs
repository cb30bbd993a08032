use coincast_core::MarketRecord;
use coincast_engine::{
    ForecastPipeline, PipelineConfig, PipelineVariant, RunOutcome, SentimentMap,
};
use serde::Serialize;
use tracing::info;

use crate::cli::ForecastArgs;
use crate::error::CliError;

use super::{read_file, CommandResult};

pub async fn run(args: &ForecastArgs) -> Result<CommandResult, CliError> {
    let config = resolve_config(args)?;
    let records = MarketRecord::parse_batch(&read_file(&args.input).await?)?;
    if records.is_empty() {
        return Err(CliError::Command(String::from("input contains no assets")));
    }
    let sentiment = match &args.sentiment {
        Some(path) => SentimentMap::from_json(&read_file(path).await?)?,
        None => SentimentMap::new(),
    };
    info!(
        assets = records.len(),
        readings = sentiment.len(),
        variant = %config.variant,
        "starting forecast run"
    );

    let pipeline = ForecastPipeline::new(config)?;
    let outcome = pipeline.run_records(&records, &sentiment).await?;
    render_outcome(&outcome, args)
}

/// `--variant` picks the base schedule; fields set in `--config` apply on
/// top of it, and `--seed` on top of both.
fn resolve_config(args: &ForecastArgs) -> Result<PipelineConfig, CliError> {
    let variant = args.variant.map(PipelineVariant::from);
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path_with_variant(path, variant)
            .map_err(coincast_engine::PipelineError::from)?,
        None => variant.map(PipelineConfig::for_variant).unwrap_or_default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

#[derive(Debug, Serialize)]
struct ForecastResponse<'a> {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    training: Option<&'a coincast_engine::TrainingSummary>,
    forecasts: Vec<coincast_core::AssetForecast>,
}

fn render_outcome(outcome: &RunOutcome, args: &ForecastArgs) -> Result<CommandResult, CliError> {
    let query = args.query.as_deref();
    match outcome {
        RunOutcome::Completed(report) => {
            let data = serde_json::to_value(ForecastResponse {
                outcome: "completed",
                reason: None,
                run_id: Some(report.run_id.to_string()),
                training: Some(&report.training),
                forecasts: report.select(query, args.rank),
            })?;
            Ok(CommandResult::ok(data).with_warnings(report.warnings.clone()))
        }
        RunOutcome::Fallback { reason, previous } => {
            let data = serde_json::to_value(ForecastResponse {
                outcome: "fallback",
                reason: Some(reason.to_string()),
                run_id: previous.as_ref().map(|report| report.run_id.to_string()),
                training: previous.as_ref().map(|report| &report.training),
                forecasts: previous
                    .as_ref()
                    .map(|report| report.select(query, args.rank))
                    .unwrap_or_default(),
            })?;
            Ok(CommandResult::ok(data)
                .with_warnings(vec![format!("{reason}; showing previous results")])
                .stale())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    fn args(input: PathBuf) -> ForecastArgs {
        ForecastArgs {
            input,
            sentiment: None,
            config: None,
            variant: None,
            seed: Some(5),
            query: None,
            rank: true,
        }
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn variant_flag_keeps_configured_overrides() {
        let config = write_temp("variant: detailed\nepochs: 3\nseed: 9\n");
        let mut forecast_args = args(PathBuf::from("unused.json"));
        forecast_args.config = Some(config.path().to_path_buf());
        forecast_args.variant = Some(crate::cli::VariantArg::Hybrid);
        forecast_args.seed = None;

        let resolved = resolve_config(&forecast_args).expect("valid config");
        assert_eq!(resolved.variant, PipelineVariant::Hybrid);
        assert_eq!(resolved.epochs, 3);
        assert_eq!(resolved.window_len, 30);
        assert_eq!(resolved.seed, Some(9));
    }

    #[test]
    fn variant_flag_without_config_uses_its_schedule() {
        let mut forecast_args = args(PathBuf::from("unused.json"));
        forecast_args.variant = Some(crate::cli::VariantArg::Hybrid);

        let resolved = resolve_config(&forecast_args).expect("valid config");
        assert_eq!(resolved, PipelineConfig::for_variant(PipelineVariant::Hybrid).with_seed(5));
    }

    #[tokio::test]
    async fn forecasts_every_asset_in_input() {
        let config = write_temp("epochs: 2\nlstm_units: 4\ngru_units: 3\n");
        let input = write_temp(
            r#"[
                {"asset_id": "bitcoin", "symbol": "btc", "current_price": 8.0, "history": [1, 2, 3, 4, 5, 6, 7]},
                {"asset_id": "ethereum", "symbol": "eth", "current_price": 2.0, "history": [7, 6, 5, 4, 3, 2, 1]}
            ]"#,
        );
        let mut forecast_args = args(input.path().to_path_buf());
        forecast_args.config = Some(config.path().to_path_buf());

        let result = run(&forecast_args).await.expect("runs");
        assert!(!result.stale);
        assert_eq!(result.data["outcome"], "completed");
        assert_eq!(result.data["forecasts"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn missing_input_is_an_io_error() {
        let err = run(&args(PathBuf::from("/nonexistent/markets.json")))
            .await
            .err()
            .expect("missing file");
        assert_eq!(err.exit_code(), 10);
    }
}
