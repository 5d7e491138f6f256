//! Photovoltaic investment scenarios under the Italian incentive regimes:
//! PNRR capital grant, IRPEF 50% deduction, CER community revenue and the
//! P.IVA depreciation tax shield.
//!
//! Data flows one way: raw inputs → [`normalize`] → [`projection`] →
//! [`compose`] → metrics in [`evaluate`].

pub mod compose;
pub mod evaluate;
pub mod input;
pub mod normalize;
pub mod projection;
pub mod sensitivity;

pub use compose::{compose_cashflows, scenario_composition, CompositionOptions, ScenarioKey};
pub use evaluate::{
    compute_scenarios, evaluate_scenario, evaluate_scenarios, CashflowRecord, DerivedQuantities,
    PvScenarioOutput, ScenarioMetrics, ScenarioResult,
};
pub use input::{RawPvInput, RawValue, ScenarioFlags};
pub use normalize::{normalize, InputCorrection, NormalizedParameters};
pub use projection::{build_base_projection, BaseProjection, ProjectionYear};
pub use sensitivity::{one_way_sensitivity, PvSensitivityInput, PvSensitivityOutput, SensitivityRow};
