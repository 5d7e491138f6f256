use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::PvFinanceError;
use crate::PvFinanceResult;

// ---------------------------------------------------------------------------
// Raw values
// ---------------------------------------------------------------------------

/// A raw form value as supplied by the caller.
///
/// Numbers may arrive as JSON numbers or as text with either a dot or a comma
/// as decimal separator. Nothing here is validated; coercion never fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(serde_json::Number),
    Text(String),
}

impl RawValue {
    /// Numeric reading of the value. Unparsable text and booleans read as `None`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            RawValue::Flag(_) => None,
            RawValue::Number(n) => parse_decimal(&n.to_string()),
            RawValue::Text(s) => parse_decimal(&s.trim().replace(',', ".")),
        }
    }

    /// Boolean reading of the value.
    pub fn to_flag(&self) -> bool {
        match self {
            RawValue::Flag(b) => *b,
            RawValue::Number(_) => self.to_decimal().is_some_and(|d| !d.is_zero()),
            RawValue::Text(s) => matches!(
                s.trim().to_lowercase().as_str(),
                "true" | "1" | "on" | "yes" | "si" | "sì"
            ),
        }
    }

    /// Text form used when reporting a corrected value.
    pub fn display(&self) -> String {
        match self {
            RawValue::Flag(b) => b.to_string(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Flag(b)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Number(n.into())
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<Decimal> for RawValue {
    fn from(d: Decimal) -> Self {
        RawValue::Text(d.to_string())
    }
}

// ---------------------------------------------------------------------------
// Raw input set
// ---------------------------------------------------------------------------

/// The flat set of raw inputs driving a PV scenario evaluation.
///
/// Percentages are in 0..=100 form (`70` = 70%). Each field also accepts the
/// original form name through a serde alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPvInput {
    /// Installed power (kWp)
    #[serde(alias = "potenza", skip_serializing_if = "Option::is_none")]
    pub power_kwp: Option<RawValue>,
    /// Specific yearly yield (kWh/kWp)
    #[serde(alias = "prodSpecifica", skip_serializing_if = "Option::is_none")]
    pub specific_yield: Option<RawValue>,
    /// Capital expenditure (EUR)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capex: Option<RawValue>,
    /// Fixed annual operating expenditure (EUR), not inflated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opex: Option<RawValue>,
    /// Annual production degradation (%)
    #[serde(alias = "degrado", skip_serializing_if = "Option::is_none")]
    pub degradation_pct: Option<RawValue>,
    /// Share of production self-consumed (%)
    #[serde(alias = "autoconsumo", skip_serializing_if = "Option::is_none")]
    pub self_consumption_pct: Option<RawValue>,
    /// Energy price in year 1 (EUR/kWh)
    #[serde(alias = "prezzoEnergia", skip_serializing_if = "Option::is_none")]
    pub energy_price: Option<RawValue>,
    /// Annual energy price inflation (%)
    #[serde(alias = "inflazione", skip_serializing_if = "Option::is_none")]
    pub price_inflation_pct: Option<RawValue>,
    /// Annual CER operating cost (EUR)
    #[serde(alias = "costoCer", skip_serializing_if = "Option::is_none")]
    pub cer_opex: Option<RawValue>,
    /// Fixed yearly energy allocated to the CER (kWh)
    #[serde(alias = "energiaCer", skip_serializing_if = "Option::is_none")]
    pub cer_energy_kwh: Option<RawValue>,
    /// Share of production allocated to the CER (%)
    #[serde(alias = "quotaCer", skip_serializing_if = "Option::is_none")]
    pub cer_share_pct: Option<RawValue>,
    /// Whether a fixed CER allocation degrades with production
    #[serde(alias = "cerDegrada", skip_serializing_if = "Option::is_none")]
    pub cer_share_degrades: Option<RawValue>,
    /// Analysis horizon (years, 1..=30)
    #[serde(alias = "orizzonte", skip_serializing_if = "Option::is_none")]
    pub horizon_years: Option<RawValue>,
    /// Discount rate (%)
    #[serde(alias = "tassoSconto", skip_serializing_if = "Option::is_none")]
    pub discount_rate_pct: Option<RawValue>,
    /// PNRR grant as a share of capex (%)
    #[serde(alias = "quotaPnrr", skip_serializing_if = "Option::is_none")]
    pub grant_pct: Option<RawValue>,
    /// Marginal IRPEF rate applied to the deduction (%)
    #[serde(alias = "aliquotaIrpef", skip_serializing_if = "Option::is_none")]
    pub irpef_rate_pct: Option<RawValue>,
    /// Business tax rate for the depreciation shield (%)
    #[serde(alias = "aliquotaFiscale", skip_serializing_if = "Option::is_none")]
    pub tax_rate_pct: Option<RawValue>,
    /// Depreciation period (years, 1..=20)
    #[serde(alias = "anniAmmortamento", skip_serializing_if = "Option::is_none")]
    pub depreciation_years: Option<RawValue>,
    /// CER incentive tariff component (EUR/kWh)
    #[serde(alias = "tariffaIncentivo", skip_serializing_if = "Option::is_none")]
    pub cer_incentive: Option<RawValue>,
    /// CER premium tariff component (EUR/kWh)
    #[serde(alias = "tariffaPremio", skip_serializing_if = "Option::is_none")]
    pub cer_premium: Option<RawValue>,
    /// CER zone bonus tariff component (EUR/kWh)
    #[serde(alias = "bonusZona", skip_serializing_if = "Option::is_none")]
    pub cer_zone_bonus: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnrr: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub irpef: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cer: Option<RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piva: Option<RawValue>,
    #[serde(alias = "pivaCer", skip_serializing_if = "Option::is_none")]
    pub piva_cer: Option<RawValue>,
}

impl RawPvInput {
    /// Overwrite a single field, addressed by either of its accepted names.
    pub fn set(&mut self, field: &str, value: impl Into<RawValue>) -> PvFinanceResult<()> {
        let value = value.into();
        let slot = match field {
            "power_kwp" | "potenza" => &mut self.power_kwp,
            "specific_yield" | "prodSpecifica" => &mut self.specific_yield,
            "capex" => &mut self.capex,
            "opex" => &mut self.opex,
            "degradation_pct" | "degrado" => &mut self.degradation_pct,
            "self_consumption_pct" | "autoconsumo" => &mut self.self_consumption_pct,
            "energy_price" | "prezzoEnergia" => &mut self.energy_price,
            "price_inflation_pct" | "inflazione" => &mut self.price_inflation_pct,
            "cer_opex" | "costoCer" => &mut self.cer_opex,
            "cer_energy_kwh" | "energiaCer" => &mut self.cer_energy_kwh,
            "cer_share_pct" | "quotaCer" => &mut self.cer_share_pct,
            "cer_share_degrades" | "cerDegrada" => &mut self.cer_share_degrades,
            "horizon_years" | "orizzonte" => &mut self.horizon_years,
            "discount_rate_pct" | "tassoSconto" => &mut self.discount_rate_pct,
            "grant_pct" | "quotaPnrr" => &mut self.grant_pct,
            "irpef_rate_pct" | "aliquotaIrpef" => &mut self.irpef_rate_pct,
            "tax_rate_pct" | "aliquotaFiscale" => &mut self.tax_rate_pct,
            "depreciation_years" | "anniAmmortamento" => &mut self.depreciation_years,
            "cer_incentive" | "tariffaIncentivo" => &mut self.cer_incentive,
            "cer_premium" | "tariffaPremio" => &mut self.cer_premium,
            "cer_zone_bonus" | "bonusZona" => &mut self.cer_zone_bonus,
            "pnrr" => &mut self.pnrr,
            "irpef" => &mut self.irpef,
            "cer" => &mut self.cer,
            "piva" => &mut self.piva,
            "piva_cer" | "pivaCer" => &mut self.piva_cer,
            other => {
                return Err(PvFinanceError::InvalidInput {
                    field: other.to_string(),
                    reason: "Unknown PV input field".into(),
                })
            }
        };
        *slot = Some(value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenario flags
// ---------------------------------------------------------------------------

/// Incentive regimes selected by the caller.
///
/// `piva_cer` only influences whether the `base` scenario carries the tax
/// shield; the combined CER + P.IVA scenario itself is driven by `piva && cer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFlags {
    pub pnrr: bool,
    pub irpef: bool,
    pub cer: bool,
    pub piva: bool,
    pub piva_cer: bool,
}

impl ScenarioFlags {
    /// Read the flags from a raw input set; missing flags are off.
    pub fn from_raw(raw: &RawPvInput) -> Self {
        let flag = |v: &Option<RawValue>| v.as_ref().is_some_and(RawValue::to_flag);
        Self {
            pnrr: flag(&raw.pnrr),
            irpef: flag(&raw.irpef),
            cer: flag(&raw.cer),
            piva: flag(&raw.piva),
            piva_cer: flag(&raw.piva_cer),
        }
    }

    /// P.IVA selected with no other regime alongside it.
    pub fn piva_only(&self) -> bool {
        self.piva && !self.cer && !self.pnrr && !self.irpef && !self.piva_cer
    }
}
