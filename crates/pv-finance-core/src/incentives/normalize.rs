use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Energy, Money, Rate};

use super::input::{RawPvInput, RawValue, ScenarioFlags};

/// Longest supported analysis horizon (years)
pub const MAX_HORIZON_YEARS: u32 = 30;
/// Longest supported depreciation period (years)
pub const MAX_DEPRECIATION_YEARS: u32 = 20;

/// Upper bounds on magnitude inputs. Together with the percentage and year
/// clamps they keep every projected flow, and sums of a full horizon of
/// flows, well inside the decimal range.
pub const MAX_POWER_KWP: Decimal = dec!(10000000);
pub const MAX_SPECIFIC_YIELD: Decimal = dec!(10000);
pub const MAX_UNIT_PRICE: Decimal = dec!(1000);
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Validated engine parameters. Every rate is a fraction in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedParameters {
    /// Installed power (kWp)
    pub power_kwp: Decimal,
    /// Capital expenditure
    pub capex: Money,
    /// Fixed annual operating expenditure, never inflated
    pub opex: Money,
    /// Specific yearly yield (kWh/kWp)
    pub specific_yield: Energy,
    /// Compounding annual production degradation
    pub degradation: Rate,
    /// Self-consumed share of production
    pub self_consumption: Rate,
    /// Energy price in year 1 (EUR/kWh)
    pub energy_price: Money,
    /// Annual energy price inflation
    pub price_inflation: Rate,
    /// Annual CER operating cost
    pub cer_opex: Money,
    /// Fixed yearly CER allocation (kWh), used when `cer_share` is zero
    pub cer_energy_kwh: Energy,
    /// Share of production allocated to the CER
    pub cer_share: Rate,
    /// Fixed CER allocation follows production degradation
    pub cer_share_degrades: bool,
    pub horizon_years: u32,
    pub discount_rate: Rate,
    /// PNRR grant share of capex
    pub grant_share: Rate,
    pub irpef_rate: Rate,
    pub tax_rate: Rate,
    pub depreciation_years: u32,
    /// CER incentive tariff (EUR/kWh)
    pub cer_incentive: Money,
    /// CER premium tariff (EUR/kWh)
    pub cer_premium: Money,
    /// CER zone bonus (EUR/kWh)
    pub cer_zone_bonus: Money,
    pub flags: ScenarioFlags,
}

impl NormalizedParameters {
    /// Year-1 production (kWh) = power × specific yield.
    pub fn annual_production(&self) -> Energy {
        self.power_kwp * self.specific_yield
    }

    /// Sum of the three CER tariff components before any PNRR adjustment.
    pub fn nominal_cer_tariff(&self) -> Money {
        self.cer_incentive + self.cer_premium + self.cer_zone_bonus
    }

    /// Incentive component, halved when the PNRR grant is taken.
    pub fn adjusted_incentive(&self) -> Money {
        if self.flags.pnrr {
            self.cer_incentive / dec!(2)
        } else {
            self.cer_incentive
        }
    }

    /// Tariff actually earned on CER-allocated energy.
    pub fn effective_cer_tariff(&self) -> Money {
        self.adjusted_incentive() + self.cer_premium + self.cer_zone_bonus
    }
}

/// A raw value that could not be used as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputCorrection {
    pub field: String,
    pub raw: String,
    pub applied: Decimal,
    pub reason: String,
}

/// Normalized parameters together with the corrections applied to reach them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Normalization {
    pub parameters: NormalizedParameters,
    pub corrections: Vec<InputCorrection>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Coerce and clamp raw inputs into engine parameters.
///
/// Never fails: unparsable or missing numbers read as 0, out-of-range values
/// are clamped to the nearest bound. Magnitudes are clamped to [0, max] with a
/// per-field maximum; percentages are clamped to [0, 100] and then stored as
/// fractions; horizon and depreciation period are truncated to
/// whole years and clamped to [1, 30] and [1, 20].
pub fn normalize(raw: &RawPvInput) -> Normalization {
    let mut n = Normalizer::default();

    let parameters = NormalizedParameters {
        power_kwp: n.magnitude("power_kwp", &raw.power_kwp, MAX_POWER_KWP),
        capex: n.magnitude("capex", &raw.capex, MAX_AMOUNT),
        opex: n.magnitude("opex", &raw.opex, MAX_AMOUNT),
        specific_yield: n.magnitude("specific_yield", &raw.specific_yield, MAX_SPECIFIC_YIELD),
        degradation: n.percentage("degradation_pct", &raw.degradation_pct),
        self_consumption: n.percentage("self_consumption_pct", &raw.self_consumption_pct),
        energy_price: n.magnitude("energy_price", &raw.energy_price, MAX_UNIT_PRICE),
        price_inflation: n.percentage("price_inflation_pct", &raw.price_inflation_pct),
        cer_opex: n.magnitude("cer_opex", &raw.cer_opex, MAX_AMOUNT),
        cer_energy_kwh: n.magnitude("cer_energy_kwh", &raw.cer_energy_kwh, MAX_AMOUNT),
        cer_share: n.percentage("cer_share_pct", &raw.cer_share_pct),
        cer_share_degrades: raw
            .cer_share_degrades
            .as_ref()
            .is_some_and(RawValue::to_flag),
        horizon_years: n.whole_years("horizon_years", &raw.horizon_years, MAX_HORIZON_YEARS),
        discount_rate: n.percentage("discount_rate_pct", &raw.discount_rate_pct),
        grant_share: n.percentage("grant_pct", &raw.grant_pct),
        irpef_rate: n.percentage("irpef_rate_pct", &raw.irpef_rate_pct),
        tax_rate: n.percentage("tax_rate_pct", &raw.tax_rate_pct),
        depreciation_years: n.whole_years(
            "depreciation_years",
            &raw.depreciation_years,
            MAX_DEPRECIATION_YEARS,
        ),
        cer_incentive: n.magnitude("cer_incentive", &raw.cer_incentive, MAX_UNIT_PRICE),
        cer_premium: n.magnitude("cer_premium", &raw.cer_premium, MAX_UNIT_PRICE),
        cer_zone_bonus: n.magnitude("cer_zone_bonus", &raw.cer_zone_bonus, MAX_UNIT_PRICE),
        flags: ScenarioFlags::from_raw(raw),
    };

    Normalization {
        parameters,
        corrections: n.corrections,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Normalizer {
    corrections: Vec<InputCorrection>,
}

impl Normalizer {
    /// Numeric reading; `None` when the field is absent.
    fn read(&mut self, field: &str, raw: &Option<RawValue>) -> Option<Decimal> {
        let value = raw.as_ref()?;
        match value.to_decimal() {
            Some(d) => Some(d),
            None => {
                self.correct(field, value, Decimal::ZERO, "not a number");
                Some(Decimal::ZERO)
            }
        }
    }

    fn correct(&mut self, field: &str, raw: &RawValue, applied: Decimal, reason: &str) {
        self.corrections.push(InputCorrection {
            field: field.to_string(),
            raw: raw.display(),
            applied,
            reason: reason.to_string(),
        });
    }

    /// Magnitude (money, energy, power) clamped to [0, max].
    fn magnitude(&mut self, field: &str, raw: &Option<RawValue>, max: Decimal) -> Decimal {
        let value = self.read(field, raw).unwrap_or(Decimal::ZERO);
        let (applied, reason) = if value < Decimal::ZERO {
            (Decimal::ZERO, "below minimum 0".to_string())
        } else if value > max {
            (max, format!("above maximum {max}"))
        } else {
            return value;
        };
        if let Some(r) = raw {
            self.correct(field, r, applied, &reason);
        }
        applied
    }

    /// Percentage clamped to [0, 100], returned as a fraction.
    fn percentage(&mut self, field: &str, raw: &Option<RawValue>) -> Rate {
        let value = self.read(field, raw).unwrap_or(Decimal::ZERO);
        let clamped = value.clamp(Decimal::ZERO, dec!(100));
        if clamped != value {
            if let Some(r) = raw {
                self.correct(field, r, clamped, "outside 0..=100");
            }
        }
        clamped / dec!(100)
    }

    /// Whole number of years clamped to [1, max].
    fn whole_years(&mut self, field: &str, raw: &Option<RawValue>, max: u32) -> u32 {
        let value = self.read(field, raw).unwrap_or(Decimal::ZERO);
        let clamped = value.trunc().clamp(Decimal::ONE, Decimal::from(max));
        if clamped != value {
            if let Some(r) = raw {
                self.correct(field, r, clamped, &format!("outside whole years 1..={max}"));
            }
        }
        clamped.to_u32().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(pairs: &[(&str, &str)]) -> RawPvInput {
        let mut input = RawPvInput::default();
        for (field, value) in pairs {
            input.set(field, *value).unwrap();
        }
        input
    }

    #[test]
    fn test_percentages_become_fractions() {
        let n = normalize(&raw(&[("autoconsumo", "70"), ("tassoSconto", "3")]));
        assert_eq!(n.parameters.self_consumption, dec!(0.7));
        assert_eq!(n.parameters.discount_rate, dec!(0.03));
        assert!(n.corrections.is_empty());
    }

    #[test]
    fn test_percentages_clamped() {
        let n = normalize(&raw(&[("autoconsumo", "140"), ("degrado", "-2")]));
        assert_eq!(n.parameters.self_consumption, Decimal::ONE);
        assert_eq!(n.parameters.degradation, Decimal::ZERO);
        assert_eq!(n.corrections.len(), 2);
        assert_eq!(n.corrections[0].field, "degradation_pct");
        assert_eq!(n.corrections[1].applied, dec!(100));
    }

    #[test]
    fn test_magnitudes_clamped_at_zero() {
        let n = normalize(&raw(&[("capex", "-500"), ("opex", "100")]));
        assert_eq!(n.parameters.capex, Decimal::ZERO);
        assert_eq!(n.parameters.opex, dec!(100));
        assert_eq!(n.corrections.len(), 1);
    }

    #[test]
    fn test_magnitudes_clamped_at_maximum() {
        let n = normalize(&raw(&[
            ("potenza", "1e20"),
            ("prodSpecifica", "1e20"),
            ("capex", "1e27"),
            ("prezzoEnergia", "0,25"),
        ]));
        assert_eq!(n.parameters.power_kwp, MAX_POWER_KWP);
        assert_eq!(n.parameters.specific_yield, MAX_SPECIFIC_YIELD);
        assert_eq!(n.parameters.capex, MAX_AMOUNT);
        assert_eq!(n.parameters.energy_price, dec!(0.25));
        assert_eq!(n.corrections.len(), 3);
        assert!(n.corrections[0].reason.starts_with("above maximum"));
        assert_eq!(n.corrections[1].field, "capex");
        assert_eq!(n.corrections[1].applied, MAX_AMOUNT);
    }

    #[test]
    fn test_comma_decimal_and_garbage() {
        let n = normalize(&raw(&[("prezzoEnergia", "0,25"), ("potenza", "six")]));
        assert_eq!(n.parameters.energy_price, dec!(0.25));
        assert_eq!(n.parameters.power_kwp, Decimal::ZERO);
        assert_eq!(n.corrections.len(), 1);
        assert_eq!(n.corrections[0].reason, "not a number");
    }

    #[test]
    fn test_missing_fields_default() {
        let n = normalize(&RawPvInput::default());
        let p = &n.parameters;
        assert_eq!(p.capex, Decimal::ZERO);
        assert_eq!(p.horizon_years, 1);
        assert_eq!(p.depreciation_years, 1);
        assert_eq!(p.flags, ScenarioFlags::default());
        assert!(n.corrections.is_empty());
    }

    #[test]
    fn test_year_fields_truncated_and_clamped() {
        let n = normalize(&raw(&[("orizzonte", "45"), ("anniAmmortamento", "7,9")]));
        assert_eq!(n.parameters.horizon_years, 30);
        assert_eq!(n.parameters.depreciation_years, 7);

        let n = normalize(&raw(&[("orizzonte", "0"), ("anniAmmortamento", "25")]));
        assert_eq!(n.parameters.horizon_years, 1);
        assert_eq!(n.parameters.depreciation_years, 20);
        assert_eq!(n.corrections.len(), 2);
    }

    #[test]
    fn test_derived_tariffs() {
        let mut input = raw(&[
            ("potenza", "6"),
            ("prodSpecifica", "1200"),
            ("tariffaIncentivo", "0,11"),
            ("tariffaPremio", "0,008"),
            ("bonusZona", "0,01"),
        ]);
        let p = normalize(&input).parameters;
        assert_eq!(p.annual_production(), dec!(7200));
        assert_eq!(p.nominal_cer_tariff(), dec!(0.128));
        assert_eq!(p.effective_cer_tariff(), dec!(0.128));

        input.set("pnrr", true).unwrap();
        let p = normalize(&input).parameters;
        assert_eq!(p.adjusted_incentive(), dec!(0.055));
        assert_eq!(p.effective_cer_tariff(), dec!(0.073));
        assert_eq!(p.nominal_cer_tariff(), dec!(0.128));
    }
}
