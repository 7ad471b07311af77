use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calculators::sip::{forward_projection, SipPlan, MAX_TENURE_YEARS};
use crate::error::SipPlannerError;
use crate::time_value::{fv_annuity_due_factor, inflate, monthly_rate};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::SipResult;

/// Monthly SIP needed to reach `target_corpus`, rounded to whole rupees.
///
/// Flat plans only: no step-up and no lump sum. The annuity-due factor is
/// undefined for a non-positive rate, so such rates are rejected rather than
/// approximated.
pub fn reverse_sip(target_corpus: Money, years: u32, annual_return_rate: Percent) -> SipResult<Money> {
    if years == 0 {
        return Err(SipPlannerError::InvalidInput {
            field: "years".into(),
            reason: "Tenure must be at least one year".into(),
        });
    }
    if annual_return_rate <= Decimal::ZERO {
        return Err(SipPlannerError::InvalidInput {
            field: "annual_return_rate".into(),
            reason: "Reverse SIP requires a positive return rate".into(),
        });
    }
    if target_corpus <= Decimal::ZERO {
        return Err(SipPlannerError::InvalidInput {
            field: "target_corpus".into(),
            reason: "Target corpus must be > 0".into(),
        });
    }

    if years > MAX_TENURE_YEARS {
        return Err(SipPlannerError::InvalidInput {
            field: "years".into(),
            reason: format!("Tenure cannot exceed {MAX_TENURE_YEARS} years"),
        });
    }
    let factor = fv_annuity_due_factor(monthly_rate(annual_return_rate), years * 12)?;
    if factor.is_zero() {
        return Err(SipPlannerError::DivisionByZero {
            context: "reverse SIP annuity factor".into(),
        });
    }

    Ok((target_corpus / factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
}

/// Goal planner input. The target is expressed in today's money when an
/// inflation rate is supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalInput {
    pub target_corpus: Money,
    pub years: u32,
    pub annual_return_rate: Percent,
    #[serde(default)]
    pub inflation_rate: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalOutput {
    pub target_today: Money,
    pub inflated_target: Money,
    pub required_monthly_sip: Money,
    pub total_investment: Money,
    pub projected_corpus: Money,
    pub expected_wealth_gain: Money,
}

/// Solve a savings goal: inflate the target, then reverse-solve the SIP.
pub fn plan_goal(input: &GoalInput) -> SipResult<ComputationOutput<GoalOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let inflated_target = match input.inflation_rate {
        Some(inflation) if inflation < Decimal::ZERO => {
            return Err(SipPlannerError::InvalidInput {
                field: "inflation_rate".into(),
                reason: "Inflation rate cannot be negative".into(),
            });
        }
        Some(inflation) => inflate(input.target_corpus, inflation, input.years)?,
        None => input.target_corpus,
    };

    let required_monthly_sip = reverse_sip(inflated_target, input.years, input.annual_return_rate)?;

    if let Some(inflation) = input.inflation_rate {
        if inflation >= input.annual_return_rate {
            warnings.push(format!(
                "Expected return ({}%) does not beat inflation ({}%); the goal loses real value",
                input.annual_return_rate, inflation
            ));
        }
    }

    let plan = SipPlan::monthly(required_monthly_sip, input.annual_return_rate, input.years);
    let (total_investment, projected_corpus) = forward_projection(&plan)?
        .last()
        .map(|y| (y.invested, y.corpus))
        .unwrap_or_default();

    let output = GoalOutput {
        target_today: input.target_corpus,
        inflated_target,
        required_monthly_sip,
        total_investment,
        projected_corpus,
        expected_wealth_gain: projected_corpus - total_investment,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reverse SIP (annuity-due, flat contributions)",
        &serde_json::json!({
            "target_corpus": input.target_corpus.to_string(),
            "years": input.years,
            "annual_return_rate": input.annual_return_rate.to_string(),
            "inflation_rate": input.inflation_rate.map(|r| r.to_string()),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reverse_sip_fifty_lakh_in_ten_years() {
        // 5,000,000 / 232.339 ≈ 21520
        assert_eq!(reverse_sip(dec!(5000000), 10, dec!(12)).unwrap(), dec!(21520));
    }

    #[test]
    fn test_reverse_sip_rejects_invalid_inputs() {
        assert!(reverse_sip(dec!(5000000), 0, dec!(12)).is_err());
        assert!(reverse_sip(dec!(5000000), 10, Decimal::ZERO).is_err());
        assert!(reverse_sip(dec!(5000000), 10, dec!(-3)).is_err());
        assert!(reverse_sip(Decimal::ZERO, 10, dec!(12)).is_err());
    }

    #[test]
    fn test_reverse_sip_long_tenure_is_an_error() {
        assert!(matches!(
            reverse_sip(dec!(1000000), 1000, dec!(12)),
            Err(SipPlannerError::InvalidInput { .. })
        ));
        assert!(matches!(
            reverse_sip(dec!(1000000), u32::MAX, dec!(12)),
            Err(SipPlannerError::InvalidInput { .. })
        ));
        // in range, but (1 + 100%/12)^1200 is beyond Decimal
        assert!(matches!(
            reverse_sip(dec!(1000000), MAX_TENURE_YEARS, dec!(100)),
            Err(SipPlannerError::Overflow { .. })
        ));
    }

    #[test]
    fn test_reverse_sip_round_trip() {
        let target = dec!(2500000);
        let sip = reverse_sip(target, 15, dec!(11)).unwrap();
        let corpus = forward_projection(&SipPlan::monthly(sip, dec!(11), 15))
            .unwrap()
            .pop()
            .unwrap()
            .corpus;
        let factor = fv_annuity_due_factor(monthly_rate(dec!(11)), 180).unwrap();
        // rounding to whole rupees moves the corpus by at most half a rupee per factor unit
        assert!((corpus - target).abs() <= factor / dec!(2));
    }

    #[test]
    fn test_plan_goal_inflates_target() {
        let input = GoalInput {
            target_corpus: dec!(1000000),
            years: 10,
            annual_return_rate: dec!(12),
            inflation_rate: Some(dec!(6)),
        };
        let out = plan_goal(&input).unwrap().result;
        assert!(out.inflated_target > dec!(1790000) && out.inflated_target < dec!(1791000));
        assert!(out.required_monthly_sip > reverse_sip(dec!(1000000), 10, dec!(12)).unwrap());
        assert_eq!(out.total_investment, out.required_monthly_sip * dec!(120));
    }

    #[test]
    fn test_plan_goal_warns_when_inflation_beats_return() {
        let input = GoalInput {
            target_corpus: dec!(500000),
            years: 5,
            annual_return_rate: dec!(5),
            inflation_rate: Some(dec!(7)),
        };
        let out = plan_goal(&input).unwrap();
        assert_eq!(out.warnings.len(), 1);
    }
}
