use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::SipPlannerError;
use crate::types::{Money, Percent};
use crate::SipResult;

const HUNDRED: Decimal = dec!(100);

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
///
/// Fails with `Overflow` once the product leaves Decimal's range.
pub fn compound(rate: Decimal, n: u32) -> SipResult<Decimal> {
    let mut result = Decimal::ONE;
    let factor = Decimal::ONE + rate;
    for _ in 0..n {
        result = checked_mul(result, factor, "compound growth")?;
    }
    Ok(result)
}

/// `a × b`, or `Overflow` naming `context`.
pub fn checked_mul(a: Decimal, b: Decimal, context: &str) -> SipResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| SipPlannerError::Overflow {
        context: context.into(),
    })
}

/// Convert an annual percentage into a per-period fraction (`rate/100/periods`).
pub fn periodic_rate(annual_rate: Percent, periods_per_year: u32) -> Decimal {
    annual_rate / HUNDRED / Decimal::from(periods_per_year)
}

/// Monthly compounding rate for an annual percentage.
pub fn monthly_rate(annual_rate: Percent) -> Decimal {
    periodic_rate(annual_rate, 12)
}

/// Future value factor of an annuity-due: `((1+r)^n - 1)/r × (1+r)`.
///
/// A zero rate degenerates to `n` (each payment is simply summed).
pub fn fv_annuity_due_factor(rate: Decimal, nper: u32) -> SipResult<Decimal> {
    if rate.is_zero() {
        return Ok(Decimal::from(nper));
    }
    if rate <= dec!(-1) {
        return Err(SipPlannerError::InvalidInput {
            field: "rate".into(),
            reason: "Periodic rate must be greater than -100%".into(),
        });
    }
    let growth = compound(rate, nper)?;
    let ordinary = (growth - Decimal::ONE)
        .checked_div(rate)
        .ok_or_else(|| SipPlannerError::Overflow {
            context: "annuity factor".into(),
        })?;
    checked_mul(ordinary, Decimal::ONE + rate, "annuity factor")
}

/// Future value of `pmt` paid at the start of each of `nper` periods.
pub fn fv_annuity_due(pmt: Money, rate: Decimal, nper: u32) -> SipResult<Money> {
    checked_mul(pmt, fv_annuity_due_factor(rate, nper)?, "annuity future value")
}

/// Compound annual growth rate in percent.
///
/// Returns `None` ("insufficient data", distinct from a zero return) when any
/// argument is non-positive.
pub fn cagr(start_value: Decimal, end_value: Decimal, years: Decimal) -> Option<Percent> {
    if start_value <= Decimal::ZERO || end_value <= Decimal::ZERO || years <= Decimal::ZERO {
        return None;
    }
    if start_value == end_value {
        return Some(Decimal::ZERO);
    }
    let ratio = end_value / start_value;
    let growth = if years == Decimal::ONE {
        ratio
    } else {
        ratio.checked_powd(Decimal::ONE / years)?
    };
    Some((growth - Decimal::ONE) * HUNDRED)
}

/// CAGR for direct user input: the same formula as [`cagr`], but invalid
/// arguments fail explicitly instead of yielding `None`.
pub fn try_cagr(start_value: Decimal, end_value: Decimal, years: Decimal) -> SipResult<Percent> {
    if years <= Decimal::ZERO {
        return Err(SipPlannerError::InvalidInput {
            field: "years".into(),
            reason: "CAGR period must be > 0".into(),
        });
    }
    if start_value <= Decimal::ZERO {
        return Err(SipPlannerError::InvalidInput {
            field: "start_value".into(),
            reason: "Starting value must be > 0".into(),
        });
    }
    if end_value <= Decimal::ZERO {
        return Err(SipPlannerError::InvalidInput {
            field: "end_value".into(),
            reason: "Ending value must be > 0".into(),
        });
    }
    cagr(start_value, end_value, years).ok_or_else(|| SipPlannerError::InvalidInput {
        field: "end_value".into(),
        reason: "Growth ratio is outside the representable range".into(),
    })
}

/// Real (inflation-adjusted) rate as a fraction: `(1+nominal)/(1+inflation) - 1`.
pub fn real_rate(nominal_rate: Percent, inflation_rate: Percent) -> SipResult<Decimal> {
    let denominator = Decimal::ONE + inflation_rate / HUNDRED;
    if denominator.is_zero() {
        return Err(SipPlannerError::DivisionByZero {
            context: "real rate (inflation of -100%)".into(),
        });
    }
    Ok((Decimal::ONE + nominal_rate / HUNDRED) / denominator - Decimal::ONE)
}

/// Grow `amount` by `inflation_rate` percent per year for `years` years.
pub fn inflate(amount: Money, inflation_rate: Percent, years: u32) -> SipResult<Money> {
    checked_mul(amount, compound(inflation_rate / HUNDRED, years)?, "inflated amount")
}
