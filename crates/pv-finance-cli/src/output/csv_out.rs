use serde_json::{Map, Value};
use std::io;

use super::{cell_text, scenario_rows, METRIC_COLUMNS};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Evaluations become one row per scenario, `results` arrays one row per
/// element, anything else a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match (map.get("result"), map.get("results")) {
            (Some(Value::Object(result)), _) => match result.get("scenarios") {
                Some(Value::Object(scenarios)) => write_scenarios_csv(&mut wtr, scenarios),
                _ => write_fields_csv(&mut wtr, result),
            },
            (_, Some(Value::Array(results))) => write_array_csv(&mut wtr, results),
            _ => write_fields_csv(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&cell_text(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_scenarios_csv(wtr: &mut StdoutWriter<'_>, scenarios: &Map<String, Value>) {
    let mut header = vec!["scenario", "enabled"];
    header.extend(METRIC_COLUMNS);
    let _ = wtr.write_record(&header);
    for row in scenario_rows(scenarios) {
        let _ = wtr.write_record(&row);
    }
}

fn write_fields_csv(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &cell_text(val)]);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&cell_text(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(cell_text).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
