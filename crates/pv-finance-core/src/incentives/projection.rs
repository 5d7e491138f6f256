use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Energy, Money};

use super::normalize::NormalizedParameters;

/// Share of capex deductible under the IRPEF scheme
const IRPEF_DEDUCTIBLE_SHARE: Decimal = dec!(0.5);
/// Straight-line IRPEF deduction period (years)
const IRPEF_DEDUCTION_YEARS: u32 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Physical and revenue drivers for one operating year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub production_kwh: Energy,
    pub energy_price: Money,
    pub self_consumption_savings: Money,
    pub cer_energy_kwh: Energy,
    /// CER revenue before the CER operating cost
    pub cer_revenue: Money,
}

/// Unconditioned yearly cash flow components.
///
/// Every series has `horizon + 1` entries; index 0 is the investment date and
/// always holds zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseProjection {
    /// Self-consumption savings less opex
    pub base_flows: Vec<Money>,
    /// CER revenue less CER operating cost
    pub cer_flows: Vec<Money>,
    /// IRPEF deduction benefit
    pub irpef_flows: Vec<Money>,
    /// Depreciation tax shield
    pub piva_flows: Vec<Money>,
    /// Per-year drivers, years 1..=horizon
    pub years: Vec<ProjectionYear>,
}

impl BaseProjection {
    pub fn horizon(&self) -> usize {
        self.base_flows.len().saturating_sub(1)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the yearly cash flow components over the analysis horizon.
///
/// Production degrades geometrically from the year-1 yield, the energy price
/// compounds with inflation, opex stays flat. CER energy follows production
/// when a share is set; otherwise the fixed allocation is used, degraded at
/// the production rate only if requested. IRPEF returns half of capex over
/// ten years and the P.IVA shield depreciates capex straight-line, both
/// truncated at the horizon.
pub fn build_base_projection(params: &NormalizedParameters) -> BaseProjection {
    let horizon = params.horizon_years;
    let len = horizon as usize + 1;

    let mut base_flows = vec![Decimal::ZERO; len];
    let mut cer_flows = vec![Decimal::ZERO; len];
    let mut irpef_flows = vec![Decimal::ZERO; len];
    let mut piva_flows = vec![Decimal::ZERO; len];
    let mut years = Vec::with_capacity(horizon as usize);

    let tariff = params.effective_cer_tariff();
    let irpef_annual = params.capex * IRPEF_DEDUCTIBLE_SHARE
        / Decimal::from(IRPEF_DEDUCTION_YEARS)
        * params.irpef_rate;
    let piva_annual =
        params.capex / Decimal::from(params.depreciation_years.max(1)) * params.tax_rate;

    let irpef_years = horizon.min(IRPEF_DEDUCTION_YEARS);
    let piva_years = horizon.min(params.depreciation_years);

    let mut retention = Decimal::ONE;
    let mut price = params.energy_price;

    for year in 1..=horizon {
        if year > 1 {
            retention *= Decimal::ONE - params.degradation;
            price *= Decimal::ONE + params.price_inflation;
        }
        let production = params.annual_production() * retention;

        let savings = production * params.self_consumption * price;
        let cer_energy = cer_energy_for_year(params, production, retention);
        let cer_revenue = cer_energy * tariff;

        let y = year as usize;
        base_flows[y] = savings - params.opex;
        cer_flows[y] = cer_revenue - params.cer_opex;
        if year <= irpef_years {
            irpef_flows[y] = irpef_annual;
        }
        if year <= piva_years {
            piva_flows[y] = piva_annual;
        }

        years.push(ProjectionYear {
            year,
            production_kwh: production,
            energy_price: price,
            self_consumption_savings: savings,
            cer_energy_kwh: cer_energy,
            cer_revenue,
        });
    }

    BaseProjection {
        base_flows,
        cer_flows,
        irpef_flows,
        piva_flows,
        years,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Energy allocated to the CER in a year, given that year's production and
/// the cumulative degradation factor reached so far.
fn cer_energy_for_year(
    params: &NormalizedParameters,
    production: Energy,
    retention: Decimal,
) -> Energy {
    if params.cer_share > Decimal::ZERO {
        production * params.cer_share
    } else if params.cer_share_degrades {
        params.cer_energy_kwh * retention
    } else {
        params.cer_energy_kwh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incentives::input::ScenarioFlags;
    use rust_decimal::MathematicalOps;
    use rust_decimal_macros::dec;

    fn params() -> NormalizedParameters {
        NormalizedParameters {
            power_kwp: dec!(6),
            capex: dec!(9000),
            opex: dec!(100),
            specific_yield: dec!(1200),
            degradation: Decimal::ZERO,
            self_consumption: dec!(0.7),
            energy_price: dec!(0.25),
            price_inflation: Decimal::ZERO,
            cer_opex: Decimal::ZERO,
            cer_energy_kwh: Decimal::ZERO,
            cer_share: Decimal::ZERO,
            cer_share_degrades: false,
            horizon_years: 20,
            discount_rate: dec!(0.03),
            grant_share: Decimal::ZERO,
            irpef_rate: Decimal::ZERO,
            tax_rate: Decimal::ZERO,
            depreciation_years: 10,
            cer_incentive: Decimal::ZERO,
            cer_premium: Decimal::ZERO,
            cer_zone_bonus: Decimal::ZERO,
            flags: ScenarioFlags::default(),
        }
    }

    #[test]
    fn test_series_lengths_and_year_zero() {
        let p = params();
        let proj = build_base_projection(&p);
        for series in [&proj.base_flows, &proj.cer_flows, &proj.irpef_flows, &proj.piva_flows] {
            assert_eq!(series.len(), 21);
            assert_eq!(series[0], Decimal::ZERO);
        }
        assert_eq!(proj.years.len(), 20);
        assert_eq!(proj.horizon(), 20);
    }

    #[test]
    fn test_base_flow_year_one() {
        let proj = build_base_projection(&params());
        // 6 * 1200 * 0.7 * 0.25 - 100
        assert_eq!(proj.base_flows[1], dec!(1160));
        assert_eq!(proj.base_flows[20], dec!(1160));
    }

    #[test]
    fn test_degradation_compounds() {
        let mut p = params();
        p.degradation = dec!(0.02);
        let proj = build_base_projection(&p);
        let expected = dec!(7200) * (Decimal::ONE - dec!(0.02)).powu(2);
        assert_eq!(proj.years[2].production_kwh, expected);
        assert_ne!(proj.years[2].production_kwh, dec!(7200) * dec!(0.96));
    }

    #[test]
    fn test_price_inflation_and_flat_opex() {
        let mut p = params();
        p.price_inflation = dec!(0.1);
        let proj = build_base_projection(&p);
        assert_eq!(proj.years[2].energy_price, dec!(0.3025));
        // 7200 * 0.7 * 0.3025 - 100
        assert_eq!(proj.base_flows[3], dec!(1424.6));
    }

    #[test]
    fn test_cer_share_tracks_degradation() {
        let mut p = params();
        p.degradation = dec!(0.1);
        p.cer_share = dec!(0.2);
        p.cer_energy_kwh = dec!(5000);
        p.cer_incentive = dec!(0.1);
        p.cer_opex = dec!(50);
        let proj = build_base_projection(&p);
        assert_eq!(proj.years[0].cer_energy_kwh, dec!(1440));
        assert_eq!(proj.years[1].cer_energy_kwh, dec!(1296));
        assert_eq!(proj.cer_flows[1], dec!(94));
    }

    #[test]
    fn test_fixed_cer_energy_flat_or_degrading() {
        let mut p = params();
        p.degradation = dec!(0.1);
        p.cer_energy_kwh = dec!(1000);
        p.cer_premium = dec!(0.1);
        let flat = build_base_projection(&p);
        assert_eq!(flat.years[2].cer_energy_kwh, dec!(1000));

        p.cer_share_degrades = true;
        let degrading = build_base_projection(&p);
        assert_eq!(degrading.years[2].cer_energy_kwh, dec!(810));
    }

    #[test]
    fn test_cer_opex_can_turn_flow_negative() {
        let mut p = params();
        p.cer_opex = dec!(30);
        let proj = build_base_projection(&p);
        assert_eq!(proj.cer_flows[1], dec!(-30));
    }

    #[test]
    fn test_irpef_ten_year_deduction() {
        let mut p = params();
        p.irpef_rate = dec!(0.5);
        let proj = build_base_projection(&p);
        // 9000 * 0.5 / 10 * 0.5
        assert_eq!(proj.irpef_flows[1], dec!(225));
        assert_eq!(proj.irpef_flows[10], dec!(225));
        assert_eq!(proj.irpef_flows[11], Decimal::ZERO);
        let nonzero = proj.irpef_flows.iter().filter(|f| !f.is_zero()).count();
        assert_eq!(nonzero, 10);
    }

    #[test]
    fn test_piva_truncated_by_horizon() {
        let mut p = params();
        p.tax_rate = dec!(0.24);
        p.depreciation_years = 5;
        p.horizon_years = 3;
        let proj = build_base_projection(&p);
        let nonzero = proj.piva_flows.iter().filter(|f| !f.is_zero()).count();
        assert_eq!(nonzero, 3);
        // 9000 / 5 * 0.24
        assert_eq!(proj.piva_flows[1], dec!(432));
    }

    #[test]
    fn test_single_year_horizon_and_depreciation() {
        let mut p = params();
        p.tax_rate = dec!(0.24);
        p.irpef_rate = dec!(0.5);
        p.depreciation_years = 1;
        p.horizon_years = 1;
        let proj = build_base_projection(&p);
        assert_eq!(proj.piva_flows, vec![Decimal::ZERO, dec!(2160)]);
        assert_eq!(proj.irpef_flows, vec![Decimal::ZERO, dec!(225)]);
    }

    #[test]
    fn test_zero_capex_no_tax_benefits() {
        let mut p = params();
        p.capex = Decimal::ZERO;
        p.tax_rate = dec!(0.24);
        p.irpef_rate = dec!(0.5);
        let proj = build_base_projection(&p);
        assert!(proj.irpef_flows.iter().all(|f| f.is_zero()));
        assert!(proj.piva_flows.iter().all(|f| f.is_zero()));
    }
}
