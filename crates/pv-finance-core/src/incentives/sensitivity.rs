use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PvFinanceError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SensitivityVariable, Years};
use crate::PvFinanceResult;

use super::compose::{scenario_composition, ScenarioKey};
use super::evaluate::compute_scenarios;
use super::input::RawPvInput;
use super::normalize::normalize;

const MAX_SWEEP_POINTS: usize = 500;

/// Input for a one-way sensitivity sweep over a raw PV input field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvSensitivityInput {
    /// Base case raw inputs
    pub base_inputs: RawPvInput,
    /// Field to sweep, in raw units (percent fields in 0..=100)
    pub variable: SensitivityVariable,
    /// Scenarios to report; defaults to every enabled scenario
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<ScenarioKey>>,
}

/// Metrics of one scenario at one sweep point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub value: Decimal,
    pub scenario: ScenarioKey,
    pub npv: Option<Money>,
    pub irr: Option<Rate>,
    pub payback_simple: Option<Years>,
}

/// Output of a one-way sensitivity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvSensitivityOutput {
    pub variable: String,
    pub values: Vec<Decimal>,
    pub rows: Vec<SensitivityRow>,
}

/// Re-run the full scenario pipeline for each value of one input field.
///
/// Each point overwrites the field in a copy of the base inputs and is
/// normalized as usual, so values outside the field's domain are clamped.
pub fn one_way_sensitivity(
    input: &PvSensitivityInput,
) -> PvFinanceResult<ComputationOutput<PvSensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let values = generate_sweep_values(&input.variable)?;

    let base_flags = normalize(&input.base_inputs).parameters.flags;
    let reported: Vec<ScenarioKey> = match &input.scenarios {
        Some(keys) if !keys.is_empty() => keys.clone(),
        _ => ScenarioKey::ALL
            .into_iter()
            .filter(|k| scenario_composition(*k, &base_flags).is_some())
            .collect(),
    };

    let mut rows = Vec::with_capacity(values.len() * reported.len());
    for value in &values {
        let mut raw = input.base_inputs.clone();
        raw.set(&input.variable.name, *value)?;
        let normalization = normalize(&raw);
        if !normalization.corrections.is_empty() {
            warnings.push(format!(
                "{} = {value}: {} input correction(s) applied",
                input.variable.name,
                normalization.corrections.len()
            ));
        }

        let scenarios = compute_scenarios(&normalization.parameters)?;
        for key in &reported {
            let Some(result) = scenarios.get(key) else {
                continue;
            };
            if !result.enabled {
                warnings.push(format!(
                    "{} = {value}: scenario '{key}' not active",
                    input.variable.name
                ));
            }
            rows.push(SensitivityRow {
                value: *value,
                scenario: *key,
                npv: result.metrics.npv,
                irr: result.metrics.irr,
                payback_simple: result.metrics.payback_simple,
            });
        }
    }

    let output = PvSensitivityOutput {
        variable: input.variable.name.clone(),
        values,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-way sensitivity of PV incentive scenarios",
        &serde_json::json!({
            "variable": input.variable.name,
            "min": input.variable.min.to_string(),
            "max": input.variable.max.to_string(),
            "step": input.variable.step.to_string(),
            "scenarios": reported,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> PvFinanceResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(PvFinanceError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(PvFinanceError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }
    // None when the point count itself leaves the decimal range
    let points = var
        .max
        .checked_sub(var.min)
        .and_then(|span| span.checked_div(var.step));
    if points.map_or(true, |p| p >= Decimal::from(MAX_SWEEP_POINTS)) {
        return Err(PvFinanceError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
        });
    }

    let mut values = Vec::new();
    let mut current = Some(var.min);
    while let Some(value) = current.filter(|v| *v <= var.max) {
        values.push(value);
        current = value.checked_add(var.step);
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}
