use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Money;

use super::input::ScenarioFlags;
use super::normalize::NormalizedParameters;
use super::projection::BaseProjection;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The six named incentive scenarios, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKey {
    Base,
    Pnrr,
    Irpef,
    Cer,
    Piva,
    PivaCer,
}

impl ScenarioKey {
    pub const ALL: [ScenarioKey; 6] = [
        ScenarioKey::Base,
        ScenarioKey::Pnrr,
        ScenarioKey::Irpef,
        ScenarioKey::Cer,
        ScenarioKey::Piva,
        ScenarioKey::PivaCer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKey::Base => "base",
            ScenarioKey::Pnrr => "pnrr",
            ScenarioKey::Irpef => "irpef",
            ScenarioKey::Cer => "cer",
            ScenarioKey::Piva => "piva",
            ScenarioKey::PivaCer => "pivacer",
        }
    }

    pub fn parse(s: &str) -> Option<ScenarioKey> {
        let key = s.trim().to_lowercase();
        ScenarioKey::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which projection components a scenario draws on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionOptions {
    pub include_cer: bool,
    pub include_pnrr: bool,
    pub include_irpef: bool,
    pub include_piva: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Composition of a scenario under the selected flags, `None` when the
/// scenario is not active.
///
/// `base` is always active and carries the P.IVA shield only when P.IVA is
/// the sole regime selected. `pivacer` needs both `piva` and `cer`,
/// independently of `pnrr` and `irpef`.
pub fn scenario_composition(key: ScenarioKey, flags: &ScenarioFlags) -> Option<CompositionOptions> {
    let options = match key {
        ScenarioKey::Base => CompositionOptions {
            include_piva: flags.piva_only(),
            ..Default::default()
        },
        ScenarioKey::Pnrr if flags.pnrr => CompositionOptions {
            include_cer: flags.cer,
            include_pnrr: true,
            ..Default::default()
        },
        ScenarioKey::Irpef if flags.irpef => CompositionOptions {
            include_irpef: true,
            ..Default::default()
        },
        ScenarioKey::Cer if flags.cer => CompositionOptions {
            include_cer: true,
            ..Default::default()
        },
        ScenarioKey::Piva if flags.piva => CompositionOptions {
            include_piva: true,
            ..Default::default()
        },
        ScenarioKey::PivaCer if flags.piva && flags.cer => CompositionOptions {
            include_cer: true,
            include_piva: true,
            ..Default::default()
        },
        _ => return None,
    };
    Some(options)
}

/// Nominal cash flow series (`horizon + 1` entries) for one composition.
///
/// Year 0 is the capex outlay, reduced by the grant share when PNRR is
/// included; the grant never touches later years. Later years start from the
/// base flow and add each included component.
pub fn compose_cashflows(
    params: &NormalizedParameters,
    projection: &BaseProjection,
    options: &CompositionOptions,
) -> Vec<Money> {
    let net_capex = if options.include_pnrr {
        params.capex * (Decimal::ONE - params.grant_share)
    } else {
        params.capex
    };

    let mut flows = Vec::with_capacity(projection.base_flows.len());
    flows.push(-net_capex);

    for y in 1..projection.base_flows.len() {
        let mut flow = projection.base_flows[y];
        if options.include_cer {
            flow += projection.cer_flows[y];
        }
        if options.include_irpef {
            flow += projection.irpef_flows[y];
        }
        if options.include_piva {
            flow += projection.piva_flows[y];
        }
        flows.push(flow);
    }

    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incentives::input::RawPvInput;
    use crate::incentives::normalize::normalize;
    use crate::incentives::projection::build_base_projection;
    use rust_decimal_macros::dec;

    fn flags(pnrr: bool, irpef: bool, cer: bool, piva: bool, piva_cer: bool) -> ScenarioFlags {
        ScenarioFlags {
            pnrr,
            irpef,
            cer,
            piva,
            piva_cer,
        }
    }

    #[test]
    fn test_base_always_active() {
        let none = flags(false, false, false, false, false);
        assert_eq!(
            scenario_composition(ScenarioKey::Base, &none),
            Some(CompositionOptions::default())
        );
        for key in &ScenarioKey::ALL[1..] {
            assert_eq!(scenario_composition(*key, &none), None, "{key} should be inactive");
        }
    }

    #[test]
    fn test_base_includes_piva_only_when_alone() {
        let alone = flags(false, false, false, true, false);
        assert!(scenario_composition(ScenarioKey::Base, &alone).unwrap().include_piva);

        for combined in [
            flags(true, false, false, true, false),
            flags(false, true, false, true, false),
            flags(false, false, true, true, false),
            flags(false, false, false, true, true),
        ] {
            let base = scenario_composition(ScenarioKey::Base, &combined).unwrap();
            assert_eq!(base, CompositionOptions::default());
        }
    }

    #[test]
    fn test_pnrr_carries_cer_flag() {
        let with_cer = flags(true, false, true, false, false);
        let options = scenario_composition(ScenarioKey::Pnrr, &with_cer).unwrap();
        assert!(options.include_pnrr && options.include_cer);
        assert!(!options.include_irpef && !options.include_piva);

        let without_cer = flags(true, false, false, false, false);
        let options = scenario_composition(ScenarioKey::Pnrr, &without_cer).unwrap();
        assert!(options.include_pnrr && !options.include_cer);
    }

    #[test]
    fn test_pivacer_requires_piva_and_cer() {
        for pnrr in [false, true] {
            for irpef in [false, true] {
                for piva_cer in [false, true] {
                    for (cer, piva) in [(false, false), (true, false), (false, true), (true, true)] {
                        let f = flags(pnrr, irpef, cer, piva, piva_cer);
                        let active = scenario_composition(ScenarioKey::PivaCer, &f).is_some();
                        assert_eq!(active, cer && piva, "flags {f:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_grant_reduces_year_zero_only() {
        let mut raw = RawPvInput::default();
        raw.set("capex", "100000").unwrap();
        raw.set("quotaPnrr", "30").unwrap();
        raw.set("orizzonte", "5").unwrap();
        raw.set("opex", "200").unwrap();
        let params = normalize(&raw).parameters;
        let projection = build_base_projection(&params);

        let with_grant = compose_cashflows(
            &params,
            &projection,
            &CompositionOptions {
                include_pnrr: true,
                ..Default::default()
            },
        );
        let without = compose_cashflows(&params, &projection, &CompositionOptions::default());

        assert_eq!(with_grant[0], dec!(-70000));
        assert_eq!(without[0], dec!(-100000));
        assert_eq!(with_grant[1..], without[1..]);
        assert_eq!(with_grant.len(), 6);
    }

    #[test]
    fn test_components_added_when_included() {
        let projection = BaseProjection {
            base_flows: vec![dec!(0), dec!(100), dec!(100)],
            cer_flows: vec![dec!(0), dec!(10), dec!(10)],
            irpef_flows: vec![dec!(0), dec!(1), dec!(0)],
            piva_flows: vec![dec!(0), dec!(1000), dec!(1000)],
            years: Vec::new(),
        };
        let mut raw = RawPvInput::default();
        raw.set("capex", "500").unwrap();
        let params = normalize(&raw).parameters;

        let all = CompositionOptions {
            include_cer: true,
            include_pnrr: false,
            include_irpef: true,
            include_piva: true,
        };
        let flows = compose_cashflows(&params, &projection, &all);
        assert_eq!(flows, vec![dec!(-500), dec!(1111), dec!(1110)]);
    }

    #[test]
    fn test_key_parse_and_display() {
        assert_eq!(ScenarioKey::parse("PivaCer"), Some(ScenarioKey::PivaCer));
        assert_eq!(ScenarioKey::parse("nope"), None);
        assert_eq!(ScenarioKey::PivaCer.to_string(), "pivacer");
        assert_eq!(
            serde_json::to_value(ScenarioKey::PivaCer).unwrap(),
            serde_json::json!("pivacer")
        );
    }
}
