use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use sip_planner_core::scenarios::comparison::{
    self, Scenario, ScenarioInput, StepUpInput,
};

use crate::input;

/// Arguments for return-scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Monthly contribution in year one
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Plan length in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Annual step-up in percent
    #[arg(long, default_value = "0")]
    pub step_up: Decimal,

    /// One-off investment at the start
    #[arg(long, default_value = "0")]
    pub lump_sum: Decimal,

    /// Custom scenario as NAME=RATE (repeatable); defaults to 8/12/15%
    #[arg(long = "scenario", value_parser = parse_scenario)]
    pub scenarios: Vec<Scenario>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for flat vs step-up comparison
#[derive(Args)]
pub struct StepUpArgs {
    /// Monthly contribution in year one
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Expected annual return in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Plan length in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Annual step-up in percent
    #[arg(long, default_value = "10")]
    pub step_up: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

fn parse_scenario(raw: &str) -> Result<Scenario, String> {
    let (name, rate) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=RATE, got '{raw}'"))?;
    let rate: Decimal = rate
        .trim()
        .parse()
        .map_err(|e| format!("invalid rate in '{raw}': {e}"))?;
    Ok(Scenario::new(name.trim(), rate))
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario_input: ScenarioInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ScenarioInput {
            monthly_amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            step_up_rate: args.step_up,
            lump_sum: args.lump_sum,
            scenarios: if args.scenarios.is_empty() {
                None
            } else {
                Some(args.scenarios)
            },
        }
    };

    let result = comparison::compare_scenarios(&scenario_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_step_up(args: StepUpArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let step_up_input: StepUpInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        StepUpInput {
            monthly_amount: args
                .amount
                .ok_or("--amount is required (or provide --input)")?,
            annual_return_rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            step_up_rate: args.step_up,
        }
    };

    let result = comparison::compare_step_up(&step_up_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_scenario() {
        let s = parse_scenario("Bull = 18.5").unwrap();
        assert_eq!(s.name, "Bull");
        assert_eq!(s.annual_return_rate, dec!(18.5));
    }

    #[test]
    fn test_parse_scenario_rejects_missing_rate() {
        assert!(parse_scenario("Bull").is_err());
        assert!(parse_scenario("Bull=fast").is_err());
    }
}
