use crate::time_value::{checked_mul, compound, real_rate};
use crate::types::{Money, Percent};
use crate::SipResult;

/// Grow the invested principal at the inflation-adjusted real rate.
///
/// `real = (1 + return)/(1 + inflation) - 1`, result = `nominal_invested × (1 + real)^years`.
/// This deflates the principal rather than the final corpus; callers display
/// it under that definition.
pub fn inflation_adjusted_value(
    nominal_invested: Money,
    annual_return_rate: Percent,
    inflation_rate: Percent,
    years: u32,
) -> SipResult<Money> {
    let real = real_rate(annual_return_rate, inflation_rate)?;
    checked_mul(nominal_invested, compound(real, years)?, "inflation-adjusted value")
}
