use clap::Args;
use serde_json::{json, Value};

use pv_finance_core::incentives::{
    build_base_projection, evaluate_scenarios, normalize, RawPvInput, ScenarioKey,
};

use crate::input;

/// Raw PV inputs. Values are taken as typed, so `0,25` and `0.25` are both
/// accepted; percentages are given in 0..=100.
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PvInputArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Installed power (kWp)
    #[arg(long, alias = "potenza")]
    pub power_kwp: Option<String>,

    /// Specific yearly yield (kWh/kWp)
    #[arg(long, alias = "prod-specifica")]
    pub specific_yield: Option<String>,

    /// Capital expenditure (EUR)
    #[arg(long)]
    pub capex: Option<String>,

    /// Fixed annual operating expenditure (EUR)
    #[arg(long)]
    pub opex: Option<String>,

    /// Annual production degradation (%)
    #[arg(long, alias = "degrado")]
    pub degradation_pct: Option<String>,

    /// Self-consumed share of production (%)
    #[arg(long, alias = "autoconsumo")]
    pub self_consumption_pct: Option<String>,

    /// Energy price in year 1 (EUR/kWh)
    #[arg(long, alias = "prezzo-energia")]
    pub energy_price: Option<String>,

    /// Annual energy price inflation (%)
    #[arg(long, alias = "inflazione")]
    pub price_inflation_pct: Option<String>,

    /// Annual CER operating cost (EUR)
    #[arg(long)]
    pub cer_opex: Option<String>,

    /// Fixed yearly energy allocated to the CER (kWh)
    #[arg(long)]
    pub cer_energy_kwh: Option<String>,

    /// Share of production allocated to the CER (%)
    #[arg(long)]
    pub cer_share_pct: Option<String>,

    /// Degrade a fixed CER allocation with production
    #[arg(long)]
    pub cer_share_degrades: bool,

    /// Analysis horizon (years, 1-30)
    #[arg(long, alias = "orizzonte")]
    pub horizon_years: Option<String>,

    /// Discount rate (%)
    #[arg(long, alias = "tasso-sconto")]
    pub discount_rate_pct: Option<String>,

    /// PNRR grant share of capex (%)
    #[arg(long)]
    pub grant_pct: Option<String>,

    /// IRPEF marginal rate (%)
    #[arg(long)]
    pub irpef_rate_pct: Option<String>,

    /// Business tax rate for the depreciation shield (%)
    #[arg(long)]
    pub tax_rate_pct: Option<String>,

    /// Depreciation period (years, 1-20)
    #[arg(long)]
    pub depreciation_years: Option<String>,

    /// CER incentive tariff (EUR/kWh)
    #[arg(long)]
    pub cer_incentive: Option<String>,

    /// CER premium tariff (EUR/kWh)
    #[arg(long)]
    pub cer_premium: Option<String>,

    /// CER zone bonus (EUR/kWh)
    #[arg(long)]
    pub cer_zone_bonus: Option<String>,

    /// Take the PNRR capital grant
    #[arg(long)]
    pub pnrr: bool,

    /// Claim the IRPEF 50% deduction
    #[arg(long)]
    pub irpef: bool,

    /// Join a renewable energy community
    #[arg(long)]
    pub cer: bool,

    /// Depreciate as a VAT-registered business
    #[arg(long)]
    pub piva: bool,

    /// Combined CER + P.IVA regime
    #[arg(long)]
    pub piva_cer: bool,
}

/// Arguments for a full scenario evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub pv: PvInputArgs,
}

/// Arguments for the per-scenario metrics summary
#[derive(Args)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub pv: PvInputArgs,
}

/// Arguments for a single scenario's yearly cash flows
#[derive(Args)]
pub struct CashflowsArgs {
    /// Scenario: base, pnrr, irpef, cer, piva, pivacer
    #[arg(long, default_value = "base")]
    pub scenario: String,

    #[command(flatten)]
    pub pv: PvInputArgs,
}

/// Arguments for the base projection detail
#[derive(Args)]
pub struct ProjectionArgs {
    #[command(flatten)]
    pub pv: PvInputArgs,
}

/// Resolve raw inputs from `--input`, piped stdin, or individual flags.
pub fn resolve_raw_input(args: &PvInputArgs) -> Result<RawPvInput, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        return input::file::read_input(path);
    }
    if let Some(raw) = input::stdin::read_stdin()? {
        return Ok(raw);
    }

    let mut raw = RawPvInput::default();
    let values = [
        ("power_kwp", &args.power_kwp),
        ("specific_yield", &args.specific_yield),
        ("capex", &args.capex),
        ("opex", &args.opex),
        ("degradation_pct", &args.degradation_pct),
        ("self_consumption_pct", &args.self_consumption_pct),
        ("energy_price", &args.energy_price),
        ("price_inflation_pct", &args.price_inflation_pct),
        ("cer_opex", &args.cer_opex),
        ("cer_energy_kwh", &args.cer_energy_kwh),
        ("cer_share_pct", &args.cer_share_pct),
        ("horizon_years", &args.horizon_years),
        ("discount_rate_pct", &args.discount_rate_pct),
        ("grant_pct", &args.grant_pct),
        ("irpef_rate_pct", &args.irpef_rate_pct),
        ("tax_rate_pct", &args.tax_rate_pct),
        ("depreciation_years", &args.depreciation_years),
        ("cer_incentive", &args.cer_incentive),
        ("cer_premium", &args.cer_premium),
        ("cer_zone_bonus", &args.cer_zone_bonus),
    ];
    for (field, value) in values {
        if let Some(v) = value {
            raw.set(field, v.as_str())?;
        }
    }

    let flags = [
        ("cer_share_degrades", args.cer_share_degrades),
        ("pnrr", args.pnrr),
        ("irpef", args.irpef),
        ("cer", args.cer),
        ("piva", args.piva),
        ("piva_cer", args.piva_cer),
    ];
    for (field, on) in flags {
        if on {
            raw.set(field, true)?;
        }
    }

    Ok(raw)
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = resolve_raw_input(&args.pv)?;
    let result = evaluate_scenarios(&raw)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = resolve_raw_input(&args.pv)?;
    let output = evaluate_scenarios(&raw)?;

    let rows: Vec<Value> = output
        .result
        .scenarios
        .values()
        .map(|r| {
            json!({
                "scenario": r.key,
                "enabled": r.enabled,
                "npv": r.metrics.npv,
                "irr": r.metrics.irr,
                "payback_simple": r.metrics.payback_simple,
                "payback_discounted": r.metrics.payback_discounted,
            })
        })
        .collect();

    Ok(json!({
        "results": rows,
        "warnings": output.warnings,
        "methodology": output.methodology,
    }))
}

pub fn run_cashflows(args: CashflowsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let key = ScenarioKey::parse(&args.scenario).ok_or_else(|| {
        format!(
            "Unknown scenario '{}' (expected base, pnrr, irpef, cer, piva or pivacer)",
            args.scenario
        )
    })?;

    let raw = resolve_raw_input(&args.pv)?;
    let output = evaluate_scenarios(&raw)?;
    let result = output
        .result
        .scenarios
        .get(&key)
        .ok_or_else(|| format!("Scenario '{key}' missing from output"))?;

    if !result.enabled {
        return Err(format!("Scenario '{key}' is not active for the selected flags").into());
    }

    Ok(json!({
        "scenario": key,
        "results": result.cashflows,
        "warnings": output.warnings,
    }))
}

pub fn run_projection(args: ProjectionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = resolve_raw_input(&args.pv)?;
    let normalization = normalize(&raw);
    let projection = build_base_projection(&normalization.parameters);

    let warnings: Vec<String> = normalization
        .corrections
        .iter()
        .map(|c| format!("Input '{}' = '{}' {}; using {}", c.field, c.raw, c.reason, c.applied))
        .collect();

    Ok(json!({
        "results": projection.years,
        "warnings": warnings,
    }))
}
