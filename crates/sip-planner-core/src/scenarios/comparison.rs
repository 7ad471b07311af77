use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::calculators::sip::{forward_projection, SipFrequency, SipPlan, YearlyProjection};
use crate::error::SipPlannerError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::SipResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub annual_return_rate: Percent,
}

impl Scenario {
    pub fn new(name: &str, annual_return_rate: Percent) -> Self {
        Self {
            name: name.to_string(),
            annual_return_rate,
        }
    }
}

/// Conservative 8%, Moderate 12%, Aggressive 15%.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("Conservative", dec!(8)),
        Scenario::new("Moderate", dec!(12)),
        Scenario::new("Aggressive", dec!(15)),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub monthly_amount: Money,
    pub years: u32,
    #[serde(default)]
    pub step_up_rate: Percent,
    #[serde(default)]
    pub lump_sum: Money,
    /// Defaults to `default_scenarios()` when absent.
    #[serde(default)]
    pub scenarios: Option<Vec<Scenario>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub annual_return_rate: Percent,
    pub total_invested: Money,
    pub final_corpus: Money,
    pub total_returns: Money,
    pub year_by_year: Vec<YearlyProjection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenarios: Vec<ScenarioResult>,
    pub best: String,
    pub worst: String,
    /// Best final corpus minus worst.
    pub corpus_spread: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpInput {
    pub monthly_amount: Money,
    pub annual_return_rate: Percent,
    pub years: u32,
    pub step_up_rate: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_invested: Money,
    pub final_corpus: Money,
    pub total_returns: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpYear {
    pub year: u32,
    pub flat_corpus: Money,
    pub step_up_corpus: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepUpComparison {
    pub flat: PlanSummary,
    pub step_up: PlanSummary,
    pub extra_invested: Money,
    pub extra_corpus: Money,
    pub year_by_year: Vec<StepUpYear>,
}

fn summarise(years: &[YearlyProjection], lump_sum: Money) -> PlanSummary {
    let (total_invested, final_corpus) = years
        .last()
        .map(|y| (y.invested, y.corpus))
        .unwrap_or((lump_sum, lump_sum));
    PlanSummary {
        total_invested,
        final_corpus,
        total_returns: final_corpus - total_invested,
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Run the same contributions through several return assumptions.
pub fn compare_scenarios(input: &ScenarioInput) -> SipResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let scenarios = input.scenarios.clone().unwrap_or_else(default_scenarios);
    if scenarios.is_empty() {
        return Err(SipPlannerError::InvalidInput {
            field: "scenarios".into(),
            reason: "At least one scenario is required".into(),
        });
    }

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in &scenarios {
        let plan = SipPlan {
            monthly_amount: input.monthly_amount,
            annual_return_rate: scenario.annual_return_rate,
            years: input.years,
            step_up_rate: input.step_up_rate,
            lump_sum: input.lump_sum,
            frequency: SipFrequency::Monthly,
        };
        plan.validate()?;
        if scenario.annual_return_rate < Decimal::ZERO {
            warnings.push(format!("Scenario '{}' assumes a loss", scenario.name));
        }

        let year_by_year = forward_projection(&plan)?;
        let summary = summarise(&year_by_year, input.lump_sum);
        results.push(ScenarioResult {
            name: scenario.name.clone(),
            annual_return_rate: scenario.annual_return_rate,
            total_invested: summary.total_invested,
            final_corpus: summary.final_corpus,
            total_returns: summary.total_returns,
            year_by_year,
        });
    }

    let best = results
        .iter()
        .max_by(|a, b| a.final_corpus.cmp(&b.final_corpus))
        .ok_or_else(|| SipPlannerError::InsufficientData("no scenarios".into()))?;
    let worst = results
        .iter()
        .min_by(|a, b| a.final_corpus.cmp(&b.final_corpus))
        .ok_or_else(|| SipPlannerError::InsufficientData("no scenarios".into()))?;
    let (best_name, worst_name) = (best.name.clone(), worst.name.clone());
    let corpus_spread = best.final_corpus - worst.final_corpus;

    let output = ScenarioComparison {
        scenarios: results,
        best: best_name,
        worst: worst_name,
        corpus_spread,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate scenario comparison (annuity-due SIP projection)",
        &serde_json::json!({
            "monthly_amount": input.monthly_amount.to_string(),
            "years": input.years,
            "step_up_rate": input.step_up_rate.to_string(),
            "lump_sum": input.lump_sum.to_string(),
            "scenarios": scenarios,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Flat SIP against the same SIP stepped up every year.
pub fn compare_step_up(input: &StepUpInput) -> SipResult<ComputationOutput<StepUpComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let flat_plan = SipPlan::monthly(input.monthly_amount, input.annual_return_rate, input.years);
    let step_plan = SipPlan {
        step_up_rate: input.step_up_rate,
        ..flat_plan.clone()
    };
    step_plan.validate()?;
    if input.step_up_rate.is_zero() {
        warnings.push("Step-up rate is 0%; both plans are identical".into());
    }

    let flat_years = forward_projection(&flat_plan)?;
    let step_years = forward_projection(&step_plan)?;
    let flat = summarise(&flat_years, Decimal::ZERO);
    let step_up = summarise(&step_years, Decimal::ZERO);

    let year_by_year = flat_years
        .iter()
        .zip(&step_years)
        .map(|(f, s)| StepUpYear {
            year: f.year,
            flat_corpus: f.corpus,
            step_up_corpus: s.corpus,
        })
        .collect();

    let output = StepUpComparison {
        extra_invested: step_up.total_invested - flat.total_invested,
        extra_corpus: step_up.final_corpus - flat.final_corpus,
        flat,
        step_up,
        year_by_year,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat vs annual step-up SIP (annuity-due)",
        &serde_json::json!({
            "monthly_amount": input.monthly_amount.to_string(),
            "annual_return_rate": input.annual_return_rate.to_string(),
            "years": input.years,
            "step_up_rate": input.step_up_rate.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ScenarioInput {
        ScenarioInput {
            monthly_amount: dec!(5000),
            years: 10,
            step_up_rate: Decimal::ZERO,
            lump_sum: Decimal::ZERO,
            scenarios: None,
        }
    }

    #[test]
    fn test_default_scenarios_are_ordered_by_corpus() {
        let out = compare_scenarios(&input()).unwrap().result;
        assert_eq!(out.scenarios.len(), 3);
        assert_eq!(out.best, "Aggressive");
        assert_eq!(out.worst, "Conservative");
        assert!(out.scenarios.iter().all(|s| s.total_invested == dec!(600000)));
        let moderate = &out.scenarios[1];
        assert!((moderate.final_corpus - dec!(1161695)).abs() < dec!(1));
        assert_eq!(
            out.corpus_spread,
            out.scenarios[2].final_corpus - out.scenarios[0].final_corpus
        );
    }

    #[test]
    fn test_custom_scenarios_override_defaults() {
        let mut inp = input();
        inp.scenarios = Some(vec![Scenario::new("Bear", dec!(-5)), Scenario::new("Flat", Decimal::ZERO)]);
        let out = compare_scenarios(&inp).unwrap();
        assert_eq!(out.result.best, "Flat");
        assert_eq!(out.result.scenarios[1].final_corpus, dec!(600000));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_empty_scenario_list_rejected() {
        let mut inp = input();
        inp.scenarios = Some(vec![]);
        assert!(compare_scenarios(&inp).is_err());
    }

    #[test]
    fn test_overflowing_scenario_is_an_error_not_a_panic() {
        let mut inp = input();
        inp.years = 100;
        inp.scenarios = Some(vec![Scenario::new("Moonshot", dec!(100))]);
        assert!(matches!(
            compare_scenarios(&inp),
            Err(SipPlannerError::Overflow { .. })
        ));
    }

    #[test]
    fn test_step_up_adds_invested_and_corpus() {
        let out = compare_step_up(&StepUpInput {
            monthly_amount: dec!(5000),
            annual_return_rate: dec!(12),
            years: 10,
            step_up_rate: dec!(10),
        })
        .unwrap()
        .result;
        assert_eq!(out.flat.total_invested, dec!(600000));
        assert!(out.extra_invested > Decimal::ZERO);
        assert!(out.extra_corpus > out.extra_invested);
        assert_eq!(out.year_by_year.len(), 10);
        // year one is identical before the first step-up
        assert_eq!(out.year_by_year[0].flat_corpus, out.year_by_year[0].step_up_corpus);
    }
}
