use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calculators::inflation::inflation_adjusted_value;
use crate::calculators::tax::tax_on_gains;
use crate::error::SipPlannerError;
use crate::time_value::{checked_mul, monthly_rate};
use crate::types::{with_metadata, CategoryTag, ComputationOutput, Money, Percent};
use crate::SipResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How often the SIP instalment is debited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SipFrequency {
    #[default]
    Monthly,
    BiMonthly,
    Quarterly,
}

impl SipFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            SipFrequency::Monthly => 12,
            SipFrequency::BiMonthly => 6,
            SipFrequency::Quarterly => 4,
        }
    }

    /// Months covered by one instalment.
    pub fn months_per_period(self) -> u32 {
        12 / self.periods_per_year()
    }
}

impl TryFrom<u32> for SipFrequency {
    type Error = String;

    fn try_from(periods: u32) -> Result<Self, Self::Error> {
        match periods {
            12 => Ok(SipFrequency::Monthly),
            6 => Ok(SipFrequency::BiMonthly),
            4 => Ok(SipFrequency::Quarterly),
            other => Err(format!(
                "Unsupported SIP frequency {other}; expected 12, 6 or 4 instalments per year"
            )),
        }
    }
}

impl From<SipFrequency> for u32 {
    fn from(f: SipFrequency) -> u32 {
        f.periods_per_year()
    }
}

/// Longest tenure accepted by the calculators.
pub const MAX_TENURE_YEARS: u32 = 100;

/// A single SIP plan. Built fresh per calculation and never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SipPlan {
    /// Contribution per month in year one. Non-monthly plans debit
    /// `monthly_amount × months_per_period` per instalment.
    pub monthly_amount: Money,
    pub annual_return_rate: Percent,
    pub years: u32,
    /// Annual increase of the contribution, compounding from year two.
    #[serde(default)]
    pub step_up_rate: Percent,
    /// One-off investment at time zero.
    #[serde(default)]
    pub lump_sum: Money,
    #[serde(default, rename = "frequency_per_year")]
    pub frequency: SipFrequency,
}

impl SipPlan {
    /// Flat monthly plan with no step-up and no lump sum.
    pub fn monthly(monthly_amount: Money, annual_return_rate: Percent, years: u32) -> Self {
        Self {
            monthly_amount,
            annual_return_rate,
            years,
            step_up_rate: Decimal::ZERO,
            lump_sum: Decimal::ZERO,
            frequency: SipFrequency::Monthly,
        }
    }

    pub fn validate(&self) -> SipResult<()> {
        if self.monthly_amount < Decimal::ZERO {
            return Err(SipPlannerError::InvalidInput {
                field: "monthly_amount".into(),
                reason: "Monthly amount cannot be negative".into(),
            });
        }
        if self.lump_sum < Decimal::ZERO {
            return Err(SipPlannerError::InvalidInput {
                field: "lump_sum".into(),
                reason: "Lump sum cannot be negative".into(),
            });
        }
        if self.monthly_amount.is_zero() && self.lump_sum.is_zero() {
            return Err(SipPlannerError::InvalidInput {
                field: "monthly_amount".into(),
                reason: "Either monthly_amount or lump_sum must be > 0".into(),
            });
        }
        if self.years > MAX_TENURE_YEARS {
            return Err(SipPlannerError::InvalidInput {
                field: "years".into(),
                reason: format!("Tenure cannot exceed {MAX_TENURE_YEARS} years"),
            });
        }
        if self.step_up_rate < Decimal::ZERO {
            return Err(SipPlannerError::InvalidInput {
                field: "step_up_rate".into(),
                reason: "Step-up rate cannot be negative".into(),
            });
        }
        if self.annual_return_rate <= dec!(-100) {
            return Err(SipPlannerError::InvalidInput {
                field: "annual_return_rate".into(),
                reason: "Annual return must be greater than -100%".into(),
            });
        }
        Ok(())
    }
}

/// Cumulative position at the end of a plan year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: u32,
    pub invested: Money,
    pub corpus: Money,
    pub returns: Money,
}

/// Full SIP calculator input: a plan plus optional inflation and tax treatment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipCalculatorInput {
    #[serde(flatten)]
    pub plan: SipPlan,
    #[serde(default)]
    pub inflation_rate: Option<Percent>,
    /// Category whose capital-gains rule applies to the final returns.
    #[serde(default)]
    pub tax_category: Option<CategoryTag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SipCalculatorOutput {
    pub total_invested: Money,
    pub final_corpus: Money,
    pub total_returns: Money,
    /// final_corpus / total_invested
    pub wealth_multiple: Decimal,
    pub inflation_adjusted_value: Option<Money>,
    pub tax_on_gains: Option<Money>,
    pub post_tax_corpus: Option<Money>,
    pub year_by_year: Vec<YearlyProjection>,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Project a SIP year by year.
///
/// Each instalment is invested at the start of its period and the corpus then
/// accrues one period of growth, so a flat monthly plan matches the
/// annuity-due closed form. The accrual is always iterative, which keeps a
/// zero return rate well defined. Long tenures at high rates can exceed
/// Decimal's range; that surfaces as `Overflow` rather than a panic.
pub fn forward_projection(plan: &SipPlan) -> SipResult<Vec<YearlyProjection>> {
    let periods = plan.frequency.periods_per_year();
    let months_per_period = Decimal::from(plan.frequency.months_per_period());
    let growth = Decimal::ONE + monthly_rate(plan.annual_return_rate) * months_per_period;
    let step_up = Decimal::ONE + plan.step_up_rate / dec!(100);

    let mut projections = Vec::with_capacity(plan.years.min(MAX_TENURE_YEARS) as usize);
    let mut corpus = plan.lump_sum;
    let mut invested = plan.lump_sum;
    let mut monthly_sip = plan.monthly_amount;

    for year in 1..=plan.years {
        if year > 1 {
            monthly_sip = checked_mul(monthly_sip, step_up, "step-up contribution")?;
        }
        let instalment = checked_mul(monthly_sip, months_per_period, "instalment")?;
        for _ in 0..periods {
            let deposited = corpus.checked_add(instalment).ok_or_else(overflow)?;
            corpus = checked_mul(deposited, growth, "SIP corpus")?;
            invested = invested.checked_add(instalment).ok_or_else(overflow)?;
        }
        projections.push(YearlyProjection {
            year,
            invested,
            corpus,
            returns: corpus - invested,
        });
    }

    Ok(projections)
}

fn overflow() -> SipPlannerError {
    SipPlannerError::Overflow {
        context: "SIP projection".into(),
    }
}

/// SIP calculator: projection, summary, and optional inflation and tax views.
pub fn calculate_sip(
    input: &SipCalculatorInput,
) -> SipResult<ComputationOutput<SipCalculatorOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let plan = &input.plan;

    plan.validate()?;

    if plan.years == 0 {
        warnings.push("Zero-year plan: projection is empty".into());
    }
    if plan.annual_return_rate < Decimal::ZERO {
        warnings.push(format!(
            "Negative return rate ({}%) models a loss scenario",
            plan.annual_return_rate
        ));
    } else if plan.annual_return_rate > dec!(30) {
        warnings.push(format!(
            "Return rate of {}% p.a. is well above long-run mutual fund averages",
            plan.annual_return_rate
        ));
    }

    let year_by_year = forward_projection(plan)?;
    let (total_invested, final_corpus) = year_by_year
        .last()
        .map(|y| (y.invested, y.corpus))
        .unwrap_or((plan.lump_sum, plan.lump_sum));
    let total_returns = final_corpus - total_invested;
    let wealth_multiple = if total_invested.is_zero() {
        Decimal::ZERO
    } else {
        final_corpus / total_invested
    };

    let inflation_adjusted = match input.inflation_rate {
        Some(inflation) => Some(inflation_adjusted_value(
            total_invested,
            plan.annual_return_rate,
            inflation,
            plan.years,
        )?),
        None => None,
    };

    let tax = input
        .tax_category
        .map(|category| tax_on_gains(total_returns, category));
    let post_tax_corpus = tax.map(|t| final_corpus - t);

    let output = SipCalculatorOutput {
        total_invested,
        final_corpus,
        total_returns,
        wealth_multiple,
        inflation_adjusted_value: inflation_adjusted,
        tax_on_gains: tax,
        post_tax_corpus,
        year_by_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "SIP future value (annuity-due, annual step-up)",
        &serde_json::json!({
            "monthly_amount": plan.monthly_amount.to_string(),
            "annual_return_rate": plan.annual_return_rate.to_string(),
            "years": plan.years,
            "step_up_rate": plan.step_up_rate.to_string(),
            "lump_sum": plan.lump_sum.to_string(),
            "frequency_per_year": plan.frequency.periods_per_year(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::fv_annuity_due;
    use rust_decimal_macros::dec;

    fn base_plan() -> SipPlan {
        SipPlan::monthly(dec!(5000), dec!(12), 10)
    }

    #[test]
    fn test_reference_scenario_5000_at_12_for_10_years() {
        let projections = forward_projection(&base_plan()).unwrap();
        let last = projections.last().unwrap();
        assert_eq!(last.invested, dec!(600000));
        assert!(
            (last.corpus - dec!(1161695)).abs() < dec!(1),
            "corpus = {}",
            last.corpus
        );
    }

    #[test]
    fn test_flat_plan_matches_closed_form() {
        let plan = SipPlan::monthly(dec!(7500), dec!(9.5), 15);
        let projections = forward_projection(&plan).unwrap();
        let closed = fv_annuity_due(dec!(7500), monthly_rate(dec!(9.5)), 180).unwrap();
        let corpus = projections.last().unwrap().corpus;
        assert!(((corpus - closed) / closed).abs() < dec!(0.000001));
    }

    #[test]
    fn test_sequence_length_and_order() {
        let projections = forward_projection(&base_plan()).unwrap();
        assert_eq!(projections.len(), 10);
        for (i, p) in projections.iter().enumerate() {
            assert_eq!(p.year, i as u32 + 1);
            assert_eq!(p.returns, p.corpus - p.invested);
        }
    }

    #[test]
    fn test_zero_years_is_empty() {
        let mut plan = base_plan();
        plan.years = 0;
        assert!(forward_projection(&plan).unwrap().is_empty());
    }

    #[test]
    fn test_zero_rate_is_sum_of_contributions() {
        let mut plan = base_plan();
        plan.annual_return_rate = Decimal::ZERO;
        let last = forward_projection(&plan).unwrap().pop().unwrap();
        assert_eq!(last.corpus, dec!(600000));
        assert_eq!(last.returns, Decimal::ZERO);
    }

    #[test]
    fn test_step_up_compounds_from_year_two() {
        let mut plan = base_plan();
        plan.annual_return_rate = Decimal::ZERO;
        plan.step_up_rate = dec!(10);
        plan.years = 3;
        let projections = forward_projection(&plan).unwrap();
        // 60000 + 66000 + 72600
        assert_eq!(projections[0].invested, dec!(60000));
        assert_eq!(projections[1].invested, dec!(126000));
        assert_eq!(projections[2].invested, dec!(198600));
    }

    #[test]
    fn test_lump_sum_compounds_from_time_zero() {
        let mut plan = SipPlan::monthly(Decimal::ZERO, dec!(12), 1);
        plan.lump_sum = dec!(100000);
        let last = forward_projection(&plan).unwrap().pop().unwrap();
        // 100000 × 1.01^12 ≈ 112682.50
        assert!((last.corpus - dec!(112682.50)).abs() < dec!(0.01));
        assert_eq!(last.invested, dec!(100000));
    }

    #[test]
    fn test_quarterly_invests_same_annual_amount() {
        let mut plan = base_plan();
        plan.frequency = SipFrequency::Quarterly;
        let quarterly = forward_projection(&plan).unwrap().pop().unwrap();
        let monthly = forward_projection(&base_plan()).unwrap().pop().unwrap();
        assert_eq!(quarterly.invested, monthly.invested);
        assert!(quarterly.corpus > monthly.invested);
    }

    #[test]
    fn test_long_high_rate_plan_overflows_without_panicking() {
        let plan = SipPlan::monthly(dec!(5000), dec!(30), 300);
        assert!(matches!(
            forward_projection(&plan),
            Err(SipPlannerError::Overflow { .. })
        ));
        let input = SipCalculatorInput {
            plan: SipPlan::monthly(dec!(5000), dec!(100), MAX_TENURE_YEARS),
            inflation_rate: None,
            tax_category: None,
        };
        assert!(matches!(
            calculate_sip(&input),
            Err(SipPlannerError::Overflow { .. })
        ));
    }

    #[test]
    fn test_tenure_above_limit_is_rejected() {
        let plan = SipPlan::monthly(dec!(5000), dec!(12), MAX_TENURE_YEARS + 1);
        assert!(matches!(
            plan.validate(),
            Err(SipPlannerError::InvalidInput { ref field, .. }) if field == "years"
        ));
    }

    #[test]
    fn test_frequency_serde_uses_periods_per_year() {
        let plan: SipPlan = serde_json::from_str(
            r#"{"monthly_amount":"1000","annual_return_rate":"10","years":5,"frequency_per_year":4}"#,
        )
        .unwrap();
        assert_eq!(plan.frequency, SipFrequency::Quarterly);
        assert!(serde_json::from_str::<SipPlan>(
            r#"{"monthly_amount":"1000","annual_return_rate":"10","years":5,"frequency_per_year":7}"#,
        )
        .is_err());
    }

    #[test]
    fn test_calculate_sip_with_tax_and_inflation() {
        let input = SipCalculatorInput {
            plan: base_plan(),
            inflation_rate: Some(dec!(6)),
            tax_category: Some(CategoryTag::LargeCap),
        };
        let out = calculate_sip(&input).unwrap().result;
        assert_eq!(out.total_invested, dec!(600000));
        let tax = out.tax_on_gains.unwrap();
        // (561695 - 125000) × 12.5% ≈ 54587
        assert!((tax - dec!(54586.9)).abs() < dec!(1), "tax = {tax}");
        assert_eq!(out.post_tax_corpus.unwrap(), out.final_corpus - tax);
        assert!(out.inflation_adjusted_value.unwrap() > out.total_invested);
    }

    #[test]
    fn test_calculate_sip_rejects_negative_step_up() {
        let mut plan = base_plan();
        plan.step_up_rate = dec!(-5);
        let input = SipCalculatorInput {
            plan,
            inflation_rate: None,
            tax_category: None,
        };
        assert!(calculate_sip(&input).is_err());
    }

    #[test]
    fn test_calculate_sip_warns_on_negative_rate() {
        let mut plan = base_plan();
        plan.annual_return_rate = dec!(-4);
        let input = SipCalculatorInput {
            plan,
            inflation_rate: None,
            tax_category: None,
        };
        let out = calculate_sip(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("loss scenario")));
        assert!(out.result.total_returns < Decimal::ZERO);
    }
}
