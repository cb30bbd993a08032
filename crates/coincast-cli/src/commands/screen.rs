use coincast_core::{MarketRecord, ScreenFilter};
use serde::Serialize;

use crate::cli::ScreenArgs;
use crate::error::CliError;

use super::{read_file, CommandResult};

#[derive(Debug, Serialize)]
struct ScreenEntry<'a> {
    asset_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
    current_price: f64,
    trend_pct: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ScreenResponse<'a> {
    filter: ScreenFilter,
    matched: usize,
    total: usize,
    assets: Vec<ScreenEntry<'a>>,
}

pub async fn run(args: &ScreenArgs) -> Result<CommandResult, CliError> {
    if !args.min_trend.is_finite() {
        return Err(CliError::Command(String::from(
            "--min-trend must be a finite number",
        )));
    }
    let records = MarketRecord::parse_batch(&read_file(&args.input).await?)?;
    let filter = if args.all {
        ScreenFilter::All
    } else {
        ScreenFilter::StrongGrowth {
            min_pct: args.min_trend,
        }
    };

    let hits = filter.apply(&records);
    let flat = records.len() - records.iter().filter(|r| r.history.len() >= 2).count();
    let assets = hits
        .iter()
        .map(|hit| ScreenEntry {
            asset_id: hit.record.asset_id.as_str(),
            name: hit.record.name.as_deref(),
            symbol: hit.record.symbol.as_deref(),
            current_price: hit.record.current_price,
            trend_pct: hit.trend_pct,
        })
        .collect::<Vec<_>>();

    let data = serde_json::to_value(ScreenResponse {
        filter,
        matched: assets.len(),
        total: records.len(),
        assets,
    })?;

    let mut result = CommandResult::ok(data);
    if flat > 0 {
        result = result.with_warnings(vec![format!(
            "{flat} asset(s) have fewer than two observations and no trend"
        )]);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn keeps_assets_above_min_trend() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(
            br#"[
                {"asset_id": "pepe", "current_price": 1.5, "history": [1.0, 1.5]},
                {"asset_id": "usdt", "current_price": 1.0, "history": [1.0, 1.0]},
                {"asset_id": "new", "current_price": 3.0, "history": [3.0]}
            ]"#,
        )
        .expect("write");

        let args = ScreenArgs {
            input: file.path().to_path_buf(),
            min_trend: 20.0,
            all: false,
        };
        let result = run(&args).await.expect("screens");

        assert_eq!(result.data["matched"], 1);
        assert_eq!(result.data["total"], 3);
        assert_eq!(result.data["assets"][0]["asset_id"], "pepe");
        assert_eq!(result.warnings.len(), 1);
    }
}
