use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Serialize;

use pv_finance_core::incentives::{
    evaluate_scenarios, one_way_sensitivity, CashflowRecord, PvSensitivityInput, RawPvInput,
    ScenarioKey, ScenarioMetrics,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// One scenario's series as returned to JavaScript.
#[derive(Serialize)]
struct ScenarioCashflows<'a> {
    scenario: ScenarioKey,
    enabled: bool,
    metrics: &'a ScenarioMetrics,
    cashflows: &'a [CashflowRecord],
    warnings: &'a [String],
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Evaluate every incentive scenario from the raw form inputs.
///
/// Accepts English or form field names; returns the full output envelope.
#[napi]
pub fn evaluate_pv_scenarios(input_json: String) -> NapiResult<String> {
    let input: RawPvInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = evaluate_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Yearly cash flows and metrics of a single scenario.
#[napi]
pub fn pv_scenario_cashflows(input_json: String, scenario: String) -> NapiResult<String> {
    let key = ScenarioKey::parse(&scenario)
        .ok_or_else(|| to_napi_error(format!("Unknown scenario '{}'", scenario)))?;
    let input: RawPvInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = evaluate_scenarios(&input).map_err(to_napi_error)?;
    let result = output
        .result
        .scenarios
        .get(&key)
        .ok_or_else(|| to_napi_error(format!("Scenario '{}' missing from output", key)))?;

    serde_json::to_string(&ScenarioCashflows {
        scenario: key,
        enabled: result.enabled,
        metrics: &result.metrics,
        cashflows: &result.cashflows,
        warnings: &output.warnings,
    })
    .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn pv_sensitivity(input_json: String) -> NapiResult<String> {
    let input: PvSensitivityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = one_way_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
