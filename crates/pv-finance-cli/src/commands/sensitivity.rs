use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use pv_finance_core::incentives::{one_way_sensitivity, PvSensitivityInput, ScenarioKey};
use pv_finance_core::types::SensitivityVariable;

use crate::commands::scenarios::{resolve_raw_input, PvInputArgs};

/// Arguments for a one-way sensitivity sweep
#[derive(Args)]
pub struct SensitivityArgs {
    /// Variable to sweep: name:min:max:step (e.g., prezzoEnergia:0.15:0.35:0.05)
    #[arg(long = "var")]
    pub variable: String,

    /// Scenario to report (repeatable); defaults to every active scenario
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,

    #[command(flatten)]
    pub pv: PvInputArgs,
}

fn parse_sens_var(arg: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = arg.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            arg
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parse_bound(parts[1])?,
        max: parse_bound(parts[2])?,
        step: parse_bound(parts[3])?,
    })
}

fn parse_bound(s: &str) -> Result<Decimal, Box<dyn std::error::Error>> {
    s.trim()
        .replace(',', ".")
        .parse::<Decimal>()
        .map_err(|e| format!("Invalid sweep bound '{}': {}", s, e).into())
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let variable = parse_sens_var(&args.variable)?;

    let scenarios = if args.scenarios.is_empty() {
        None
    } else {
        let keys = args
            .scenarios
            .iter()
            .map(|s| ScenarioKey::parse(s).ok_or_else(|| format!("Unknown scenario '{}'", s)))
            .collect::<Result<Vec<_>, _>>()?;
        Some(keys)
    };

    let input = PvSensitivityInput {
        base_inputs: resolve_raw_input(&args.pv)?,
        variable,
        scenarios,
    };
    let output = one_way_sensitivity(&input)?;

    Ok(json!({
        "variable": output.result.variable,
        "results": output.result.rows,
        "warnings": output.warnings,
        "methodology": output.methodology,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sens_var_accepts_comma_decimals() {
        let var = parse_sens_var("prezzoEnergia:0,15:0.35:0,05").unwrap();
        assert_eq!(var.name, "prezzoEnergia");
        assert_eq!(var.min, Decimal::new(15, 2));
        assert_eq!(var.max, Decimal::new(35, 2));
        assert_eq!(var.step, Decimal::new(5, 2));
    }

    #[test]
    fn test_parse_sens_var_rejects_wrong_arity() {
        assert!(parse_sens_var("capex:1000:2000").is_err());
        assert!(parse_sens_var("capex:a:2000:100").is_err());
    }
}
