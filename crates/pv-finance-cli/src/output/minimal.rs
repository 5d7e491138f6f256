use serde_json::Value;

use super::cell_text;

/// Headline metrics, most important first.
const PRIORITY_KEYS: [&str; 4] = ["npv", "irr", "payback_simple", "payback_discounted"];

/// Print only the headline figure of the output.
///
/// Evaluations print `scenario: npv` for every active scenario; result rows
/// print their first non-null headline metric.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Object(scenarios)) = result.get("scenarios") {
        for (key, scenario) in scenarios {
            let enabled = scenario.get("enabled").and_then(Value::as_bool).unwrap_or(false);
            if enabled {
                let npv = scenario.get("metrics").and_then(|m| m.get("npv"));
                println!("{}: {}", key, npv.map(format_minimal).unwrap_or_default());
            }
        }
        return;
    }

    if let Some(Value::Array(rows)) = result.get("results") {
        for row in rows {
            println!("{}", headline(row));
        }
        return;
    }

    println!("{}", headline(result));
}

fn headline(value: &Value) -> String {
    let Value::Object(map) = value else {
        return format_minimal(value);
    };

    let label = map
        .get("scenario")
        .and_then(Value::as_str)
        .map(|s| format!("{}: ", s))
        .unwrap_or_default();

    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return format!("{}{}", label, format_minimal(val));
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        _ => cell_text(value),
    }
}
