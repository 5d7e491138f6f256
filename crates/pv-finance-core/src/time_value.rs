use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::PvFinanceError;
use crate::types::{Money, Rate, Years};
use crate::PvFinanceResult;

/// Lower end of the IRR search bracket (-99%)
pub const IRR_LOWER_BOUND: Rate = dec!(-0.99);
/// Upper end of the IRR search bracket (150%)
pub const IRR_UPPER_BOUND: Rate = dec!(1.5);

const IRR_TOLERANCE: Decimal = dec!(0.000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of a series of annual cash flows, index 0 undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> PvFinanceResult<Money> {
    let mut result = Decimal::ZERO;
    for (t, pv) in discounted_terms(rate, cash_flows)?.into_iter().enumerate() {
        result = result.checked_add(pv).ok_or_else(|| PvFinanceError::Overflow {
            context: format!("NPV running total at period {t}"),
        })?;
    }
    Ok(result)
}

/// Discount each flow to year 0: `flows[t] / (1 + rate)^t`.
pub fn discount_flows(rate: Rate, cash_flows: &[Money]) -> PvFinanceResult<Vec<Money>> {
    discounted_terms(rate, cash_flows)
}

fn discounted_terms(rate: Rate, cash_flows: &[Money]) -> PvFinanceResult<Vec<Money>> {
    if rate <= dec!(-1) {
        return Err(PvFinanceError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;
    let mut discounted = Vec::with_capacity(cash_flows.len());

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) => d,
                None => {
                    return Err(PvFinanceError::Overflow {
                        context: format!("discount factor at period {t}"),
                    })
                }
            };
        }
        if discount.is_zero() {
            return Err(PvFinanceError::DivisionByZero {
                context: format!("discount factor at period {t}"),
            });
        }
        match cf.checked_div(discount) {
            Some(pv) => discounted.push(pv),
            None => {
                return Err(PvFinanceError::Overflow {
                    context: format!("discounted flow at period {t}"),
                })
            }
        }
    }

    Ok(discounted)
}

/// Internal Rate of Return by bisection over [-99%, 150%].
///
/// Returns `None` unless the series holds at least one strictly positive and
/// one strictly negative flow, or when the NPV of the series leaves the
/// decimal range at some bisection rate. When the tolerance is not met within
/// the iteration cap the last midpoint is returned as a best-effort estimate.
pub fn irr(cash_flows: &[Money]) -> Option<Rate> {
    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !has_inflow || !has_outflow {
        return None;
    }

    let mut low = IRR_LOWER_BOUND;
    let mut high = IRR_UPPER_BOUND;
    let mut mid = (low + high) / dec!(2);

    for _ in 0..MAX_IRR_ITERATIONS {
        mid = (low + high) / dec!(2);
        let sample = sample_npv(mid, cash_flows)?;

        if let Some(pv) = sample.present {
            if pv.abs() < IRR_TOLERANCE {
                return Some(mid);
            }
        }

        if sample.signed > Decimal::ZERO {
            low = mid;
        } else {
            high = mid;
        }
    }

    Some(mid)
}

/// NPV evaluated for root finding.
struct NpvSample {
    /// Same sign as the NPV
    signed: Money,
    /// The NPV itself, when representable
    present: Option<Money>,
}

/// `None` when the series overflows at this rate.
///
/// Non-negative rates discount term by term, so no intermediate exceeds the
/// flows themselves. Negative rates compound forward to the last period
/// (Horner form), which stays bounded near -99%; the terminal value shares
/// the NPV's sign since `(1 + rate)^T > 0`.
fn sample_npv(rate: Rate, cash_flows: &[Money]) -> Option<NpvSample> {
    if rate >= Decimal::ZERO {
        let pv = npv(rate, cash_flows).ok()?;
        return Some(NpvSample {
            signed: pv,
            present: Some(pv),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut terminal = Decimal::ZERO;
    let mut compound = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            terminal = terminal.checked_mul(one_plus_r)?;
            compound = compound.checked_mul(one_plus_r)?;
        }
        terminal = terminal.checked_add(*cf)?;
    }

    Some(NpvSample {
        signed: terminal,
        present: terminal.checked_div(compound),
    })
}

/// Payback period of a cash flow series, in years.
///
/// Accumulates flows from year 0; the payback falls in the first year whose
/// running total is non-negative, interpolated linearly within that year.
/// Returns `None` when the running total never turns non-negative or leaves
/// the decimal range first.
pub fn payback_period(cash_flows: &[Money]) -> Option<Years> {
    let mut cumulative = Decimal::ZERO;

    for (year, cf) in cash_flows.iter().enumerate() {
        let previous = cumulative;
        cumulative = cumulative.checked_add(*cf)?;

        if cumulative >= Decimal::ZERO {
            if year == 0 {
                return Some(Decimal::ZERO);
            }
            // previous < 0 <= previous + cf, hence cf > 0 and the share lies in (0, 1]
            let fraction = -previous / cf;
            return Some(Decimal::from(year as u64 - 1) + fraction);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_at_minus_one() {
        let cfs = vec![dec!(-100), dec!(50)];
        assert!(npv(dec!(-1), &cfs).is_err());
    }

    #[test]
    fn test_discount_flows() {
        let cfs = vec![dec!(-100), dec!(110), dec!(121)];
        let discounted = discount_flows(dec!(0.10), &cfs).unwrap();
        assert_eq!(discounted, vec![dec!(-100), dec!(100), dec!(100)]);
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs).unwrap();
        // IRR ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.001));
        let residual = npv(result, &cfs).unwrap();
        assert!(residual.abs() < dec!(0.00001), "NPV at IRR = {residual}");
    }

    #[test]
    fn test_irr_exact_ten_percent() {
        let cfs = vec![dec!(-100), dec!(110)];
        let result = irr(&cfs).unwrap();
        assert!((result - dec!(0.10)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_irr_negative_rate() {
        // Only 80 of 100 recovered => IRR = -20%
        let cfs = vec![dec!(-100), dec!(80)];
        let result = irr(&cfs).unwrap();
        assert!((result - dec!(-0.20)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_irr_undefined_without_sign_change() {
        assert_eq!(irr(&[dec!(-100), dec!(-10), dec!(0)]), None);
        assert_eq!(irr(&[dec!(0), dec!(10), dec!(10)]), None);
        assert_eq!(irr(&[]), None);
    }

    #[test]
    fn test_irr_above_bracket_returns_estimate() {
        // True IRR is 300%, outside the bracket: bisection keeps raising the
        // lower bound and settles on the upper edge.
        let cfs = vec![dec!(-100), dec!(400)];
        let result = irr(&cfs).unwrap();
        assert!((IRR_UPPER_BOUND - result).abs() < dec!(0.000001));
    }

    #[test]
    fn test_payback_interpolated() {
        // cumulative: -1000, -600, -200, +200 => 2 + 200/400
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        assert_eq!(payback_period(&cfs), Some(dec!(2.5)));
    }

    #[test]
    fn test_payback_exact_year() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50)];
        assert_eq!(payback_period(&cfs), Some(dec!(2)));
    }

    #[test]
    fn test_payback_year_zero_non_negative() {
        assert_eq!(payback_period(&[dec!(0), dec!(10)]), Some(Decimal::ZERO));
        assert_eq!(payback_period(&[dec!(5), dec!(-10)]), Some(Decimal::ZERO));
    }

    #[test]
    fn test_payback_full_year_when_flow_equals_deficit() {
        // crossing flow exactly covers the deficit: the whole year is used
        assert_eq!(payback_period(&[dec!(-100), dec!(100)]), Some(Decimal::ONE));
        // cumulative: -100, -50, +150 => 1 + 50/200
        let cfs = vec![dec!(-100), dec!(50), dec!(200)];
        assert_eq!(payback_period(&cfs), Some(dec!(1.25)));
    }

    fn sci(s: &str) -> Decimal {
        Decimal::from_scientific(s).unwrap()
    }

    #[test]
    fn test_irr_large_flows_stay_in_range() {
        let mut cfs = vec![-sci("1e27")];
        cfs.extend(std::iter::repeat(sci("2e26")).take(30));
        let result = irr(&cfs).unwrap();
        assert!(result > dec!(0.15) && result < dec!(0.25), "IRR {result}");
    }

    #[test]
    fn test_overflowing_series_is_undefined_not_a_panic() {
        let cfs = vec![sci("7e28"), sci("7e28"), dec!(-1)];
        assert_eq!(irr(&cfs), None);
        assert!(matches!(
            npv(dec!(0), &cfs),
            Err(PvFinanceError::Overflow { .. })
        ));
        assert_eq!(payback_period(&[dec!(-1), sci("-7e28"), sci("-7e28")]), None);
    }

    #[test]
    fn test_discount_flows_overflow_is_an_error() {
        // (1 + 1e10)^3 leaves the decimal range
        let cfs = vec![dec!(1), dec!(1), dec!(1), dec!(1)];
        assert!(matches!(
            discount_flows(dec!(10000000000), &cfs),
            Err(PvFinanceError::Overflow { .. })
        ));
    }

    #[test]
    fn test_payback_never_reached() {
        let cfs = vec![dec!(-1000), dec!(100), dec!(100)];
        assert_eq!(payback_period(&cfs), None);
        assert_eq!(payback_period(&[]), None);
    }
}
