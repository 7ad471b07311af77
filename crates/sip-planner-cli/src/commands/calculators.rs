use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use sip_planner_core::calculators::goal::{self, GoalInput};
use sip_planner_core::calculators::inflation::inflation_adjusted_value;
use sip_planner_core::calculators::sip::{self, SipCalculatorInput, SipFrequency, SipPlan};
use sip_planner_core::calculators::tax::tax_breakdown;
use sip_planner_core::time_value::try_cagr;
use sip_planner_core::CategoryTag;

use crate::input;

/// Arguments for a SIP projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SipArgs {
    /// Monthly contribution in year one (e.g. 5000)
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Expected annual return in percent (e.g. 12 for 12%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Plan length in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Annual step-up of the contribution in percent
    #[arg(long, default_value = "0")]
    pub step_up: Decimal,

    /// One-off investment at the start
    #[arg(long, default_value = "0")]
    pub lump_sum: Decimal,

    /// Instalments per year: 12, 6 or 4
    #[arg(long, default_value = "12")]
    pub frequency: u32,

    /// Inflation rate in percent for the real-value view
    #[arg(long)]
    pub inflation: Option<Decimal>,

    /// Fund category whose capital-gains rule applies (e.g. LargeCap, Debt)
    #[arg(long)]
    pub tax_category: Option<CategoryTag>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for goal planning
#[derive(Args)]
pub struct GoalArgs {
    /// Target corpus in today's money
    #[arg(long)]
    pub target: Option<Decimal>,

    /// Years to the goal
    #[arg(long)]
    pub years: Option<u32>,

    /// Expected annual return in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Inflation rate in percent; inflates the target when given
    #[arg(long)]
    pub inflation: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a CAGR calculation
#[derive(Args)]
pub struct CagrArgs {
    /// Starting value (e.g. NAV or portfolio value)
    #[arg(long)]
    pub start: Decimal,

    /// Ending value
    #[arg(long)]
    pub end: Decimal,

    /// Holding period in years (fractions allowed)
    #[arg(long)]
    pub years: Decimal,
}

/// Arguments for capital-gains tax
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct TaxArgs {
    /// Gains on redemption; losses owe nothing
    #[arg(long)]
    pub gains: Decimal,

    /// Fund category (e.g. LargeCap, Debt, Hybrid)
    #[arg(long)]
    pub category: CategoryTag,
}

/// Arguments for the inflation-adjusted principal
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct InflationArgs {
    /// Total amount invested
    #[arg(long)]
    pub invested: Decimal,

    /// Expected annual return in percent
    #[arg(long)]
    pub rate: Decimal,

    /// Inflation rate in percent
    #[arg(long)]
    pub inflation: Decimal,

    /// Years
    #[arg(long)]
    pub years: u32,
}

pub fn run_sip(args: SipArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sip_input: SipCalculatorInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        SipCalculatorInput {
            plan: SipPlan {
                monthly_amount: args
                    .amount
                    .ok_or("--amount is required (or provide --input)")?,
                annual_return_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
                years: args.years.ok_or("--years is required (or provide --input)")?,
                step_up_rate: args.step_up,
                lump_sum: args.lump_sum,
                frequency: SipFrequency::try_from(args.frequency)?,
            },
            inflation_rate: args.inflation,
            tax_category: args.tax_category,
        }
    };

    let result = sip::calculate_sip(&sip_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_goal(args: GoalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let goal_input: GoalInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        GoalInput {
            target_corpus: args
                .target
                .ok_or("--target is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            annual_return_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            inflation_rate: args.inflation,
        }
    };

    let result = goal::plan_goal(&goal_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cagr(args: CagrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let cagr = try_cagr(args.start, args.end, args.years)?;
    Ok(json!({
        "start_value": args.start,
        "end_value": args.end,
        "years": args.years,
        "cagr": cagr.round_dp(2),
    }))
}

pub fn run_tax(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(tax_breakdown(args.gains, args.category))?)
}

pub fn run_inflation(args: InflationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = inflation_adjusted_value(args.invested, args.rate, args.inflation, args.years)?;
    Ok(json!({
        "invested": args.invested,
        "annual_return_rate": args.rate,
        "inflation_rate": args.inflation,
        "years": args.years,
        "inflation_adjusted_value": value.round_dp(2),
        "real_gain": (value - args.invested).round_dp(2),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cagr_command_rounds_to_two_places() {
        let v = run_cagr(CagrArgs {
            start: dec!(100),
            end: dec!(150),
            years: dec!(3),
        })
        .unwrap();
        assert_eq!(v["cagr"], json!("14.47"));
    }

    #[test]
    fn test_cagr_command_rejects_zero_years() {
        assert!(run_cagr(CagrArgs {
            start: dec!(100),
            end: dec!(150),
            years: Decimal::ZERO,
        })
        .is_err());
    }

    #[test]
    fn test_tax_command_applies_equity_exemption() {
        let v = run_tax(TaxArgs {
            gains: dec!(200000),
            category: CategoryTag::FlexiCap,
        })
        .unwrap();
        let tax: Decimal = serde_json::from_value(v["tax"].clone()).unwrap();
        assert_eq!(tax, dec!(9375));
    }
}
