use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell_text, scenario_rows, METRIC_COLUMNS};

/// Render output as tables using the tabled crate.
///
/// A full evaluation prints one metrics row per scenario; command outputs
/// carrying a `results` array print one row per element.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                print_result_table(result);
            } else if let Some(Value::Array(rows)) = map.get("results") {
                print_array_table(rows);
            } else {
                print_flat_object(map);
            }
            print_notes(map);
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Map<String, Value>) {
    let Some(Value::Object(scenarios)) = result.get("scenarios") else {
        print_flat_object(result);
        return;
    };

    if let Some(Value::Object(derived)) = result.get("derived") {
        print_flat_object(derived);
        println!();
    }

    let mut builder = Builder::default();
    let mut header = vec!["scenario", "enabled"];
    header.extend(METRIC_COLUMNS);
    builder.push_record(header);
    for row in scenario_rows(scenarios) {
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        _ => cell_text(value),
    }
}
