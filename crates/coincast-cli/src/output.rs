use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let document = json!({
                "data": result.data,
                "warnings": result.warnings,
                "stale": result.stale,
            });
            let payload = if pretty {
                serde_json::to_string_pretty(&document)?
            } else {
                serde_json::to_string(&document)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => print!("{}", render_table(result)),
    }
    Ok(())
}

/// Forecast rows when the data carries them, otherwise the JSON payload
/// indented under `data:`.
fn render_table(result: &CommandResult) -> String {
    let mut out = String::new();
    if let Some(outcome) = result.data.get("outcome").and_then(Value::as_str) {
        out.push_str(&format!("outcome     : {outcome}\n"));
    }
    if let Some(run_id) = result.data.get("run_id").and_then(Value::as_str) {
        out.push_str(&format!("run_id      : {run_id}\n"));
    }
    if !result.warnings.is_empty() {
        out.push_str("warnings:\n");
        for warning in &result.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }

    match result.data.get("forecasts").and_then(Value::as_array) {
        Some(forecasts) => {
            out.push_str(&format!(
                "{:<16} {:>14} {:>14} {:>9} {:>7} {:>7}  {}\n",
                "asset", "current", "predicted", "change%", "conf", "vol%", "label"
            ));
            for row in forecasts {
                out.push_str(&format!(
                    "{:<16} {:>14.4} {:>14.4} {:>9.2} {:>7.1} {:>7.2}  {}\n",
                    text(row, "asset_id"),
                    number(row, "current_price"),
                    number(row, "predicted_price"),
                    number(row, "percent_change"),
                    number(row, "confidence"),
                    number(row, "volatility"),
                    text(row, "recommendation"),
                ));
            }
        }
        None => {
            out.push_str("data:\n");
            let pretty = serde_json::to_string_pretty(&result.data).unwrap_or_default();
            for line in pretty.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }
    }
    out
}

fn text<'a>(row: &'a Value, key: &str) -> &'a str {
    row.get(key).and_then(Value::as_str).unwrap_or("-")
}

fn number(row: &Value, key: &str) -> f64 {
    row.get(key).and_then(Value::as_f64).unwrap_or(f64::NAN)
}
