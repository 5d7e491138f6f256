pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the selected formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Scenario metric columns shown by the table and CSV formatters.
pub(crate) const METRIC_COLUMNS: [&str; 4] = ["npv", "irr", "payback_simple", "payback_discounted"];

/// Flatten an evaluation's `scenarios` map into one row per scenario.
pub(crate) fn scenario_rows(scenarios: &serde_json::Map<String, Value>) -> Vec<Vec<String>> {
    scenarios
        .iter()
        .map(|(key, scenario)| {
            let enabled = scenario.get("enabled").and_then(Value::as_bool).unwrap_or(false);
            let mut row = vec![key.clone(), enabled.to_string()];
            for col in METRIC_COLUMNS {
                let cell = scenario
                    .get("metrics")
                    .and_then(|m| m.get(col))
                    .map(cell_text)
                    .unwrap_or_default();
                row.push(cell);
            }
            row
        })
        .collect()
}

/// Plain-text rendering of a scalar cell; `null` becomes empty.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
