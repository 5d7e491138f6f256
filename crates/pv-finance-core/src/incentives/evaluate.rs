use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Energy, Money, Rate, Years};
use crate::PvFinanceResult;

use super::compose::{compose_cashflows, scenario_composition, CompositionOptions, ScenarioKey};
use super::input::RawPvInput;
use super::normalize::{normalize, InputCorrection, NormalizedParameters};
use super::projection::{build_base_projection, BaseProjection, ProjectionYear};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One year of a scenario cash flow series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowRecord {
    pub year: u32,
    pub nominal: Money,
    pub discounted: Money,
    pub cumulative_nominal: Money,
    pub cumulative_discounted: Money,
}

/// Profitability metrics; `None` where a metric is not applicable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    /// Years until cumulative nominal cash flow turns non-negative
    pub payback_simple: Option<Years>,
    /// Years until cumulative discounted cash flow turns non-negative
    pub payback_discounted: Option<Years>,
    pub npv: Option<Money>,
    pub irr: Option<Rate>,
}

/// Result for one named scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub key: ScenarioKey,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<CompositionOptions>,
    pub metrics: ScenarioMetrics,
    pub cashflows: Vec<CashflowRecord>,
}

impl ScenarioResult {
    /// A scenario that is not active under the selected flags.
    pub fn disabled(key: ScenarioKey) -> Self {
        Self {
            key,
            enabled: false,
            composition: None,
            metrics: ScenarioMetrics::default(),
            cashflows: Vec::new(),
        }
    }
}

/// Quantities derived from the normalized parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedQuantities {
    pub annual_production_kwh: Energy,
    pub nominal_cer_tariff: Money,
    pub effective_cer_tariff: Money,
}

/// Full output of a PV incentive scenario evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvScenarioOutput {
    pub parameters: NormalizedParameters,
    pub derived: DerivedQuantities,
    pub corrections: Vec<InputCorrection>,
    pub projection: Vec<ProjectionYear>,
    pub scenarios: BTreeMap<ScenarioKey, ScenarioResult>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate one scenario against a prebuilt projection.
pub fn evaluate_scenario(
    key: ScenarioKey,
    params: &NormalizedParameters,
    projection: &BaseProjection,
) -> PvFinanceResult<ScenarioResult> {
    let options = match scenario_composition(key, &params.flags) {
        Some(options) => options,
        None => return Ok(ScenarioResult::disabled(key)),
    };

    let nominal = compose_cashflows(params, projection, &options);
    let discounted = time_value::discount_flows(params.discount_rate, &nominal)?;

    let mut cashflows = Vec::with_capacity(nominal.len());
    let mut cumulative_nominal = Decimal::ZERO;
    let mut cumulative_discounted = Decimal::ZERO;
    for (year, (n, d)) in nominal.iter().zip(discounted.iter()).enumerate() {
        cumulative_nominal += n;
        cumulative_discounted += d;
        cashflows.push(CashflowRecord {
            year: year as u32,
            nominal: *n,
            discounted: *d,
            cumulative_nominal,
            cumulative_discounted,
        });
    }

    let metrics = ScenarioMetrics {
        payback_simple: time_value::payback_period(&nominal),
        payback_discounted: time_value::payback_period(&discounted),
        npv: Some(time_value::npv(params.discount_rate, &nominal)?),
        irr: time_value::irr(&nominal),
    };

    Ok(ScenarioResult {
        key,
        enabled: true,
        composition: Some(options),
        metrics,
        cashflows,
    })
}

/// Evaluate all six scenarios from normalized parameters.
///
/// Pure and deterministic: identical parameters give identical results.
pub fn compute_scenarios(
    params: &NormalizedParameters,
) -> PvFinanceResult<BTreeMap<ScenarioKey, ScenarioResult>> {
    let projection = build_base_projection(params);
    scenarios_from_projection(params, &projection)
}

/// Normalize raw inputs and evaluate every scenario.
///
/// Input corrections and undefined metrics of enabled scenarios are reported
/// as warnings; neither stops the evaluation.
pub fn evaluate_scenarios(
    input: &RawPvInput,
) -> PvFinanceResult<ComputationOutput<PvScenarioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let normalization = normalize(input);
    for c in &normalization.corrections {
        warnings.push(format!(
            "Input '{}' = '{}' {}; using {}",
            c.field, c.raw, c.reason, c.applied
        ));
    }

    let params = normalization.parameters;
    let projection = build_base_projection(&params);
    let scenarios = scenarios_from_projection(&params, &projection)?;

    for result in scenarios.values().filter(|r| r.enabled) {
        if result.metrics.irr.is_none() {
            warnings.push(format!(
                "Scenario '{}': IRR undefined, cash flows never change sign",
                result.key
            ));
        }
        if result.metrics.payback_simple.is_none() {
            warnings.push(format!(
                "Scenario '{}': investment not paid back within {} years",
                result.key, params.horizon_years
            ));
        }
    }

    let derived = DerivedQuantities {
        annual_production_kwh: params.annual_production(),
        nominal_cer_tariff: params.nominal_cer_tariff(),
        effective_cer_tariff: params.effective_cer_tariff(),
    };

    let assumptions = serde_json::json!({
        "horizon_years": params.horizon_years,
        "discount_rate": params.discount_rate.to_string(),
        "flags": params.flags,
        "irr_bracket": [
            time_value::IRR_LOWER_BOUND.to_string(),
            time_value::IRR_UPPER_BOUND.to_string(),
        ],
    });

    let output = PvScenarioOutput {
        parameters: params,
        derived,
        corrections: normalization.corrections,
        projection: projection.years,
        scenarios,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "PV incentive scenarios: base projection, PNRR/IRPEF/CER/P.IVA composition, NPV, bisection IRR, payback",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scenarios_from_projection(
    params: &NormalizedParameters,
    projection: &BaseProjection,
) -> PvFinanceResult<BTreeMap<ScenarioKey, ScenarioResult>> {
    let mut scenarios = BTreeMap::new();
    for key in ScenarioKey::ALL {
        scenarios.insert(key, evaluate_scenario(key, params, projection)?);
    }
    Ok(scenarios)
}
