use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use sip_planner_core::portfolio::allocation::{build_allocation_with, AllocationConfig, RiskProfile};
use sip_planner_core::portfolio::builder::{
    build_manual_portfolio, create_portfolio, AutoPortfolioInput, ManualEntry,
};
use sip_planner_core::portfolio::projection::{project_portfolio, PortfolioFund};

use crate::config::AppConfig;
use crate::input;

/// Arguments for a category allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Risk profile: low, medium or high
    #[arg(long, default_value = "medium")]
    pub risk: RiskProfile,

    /// 0 = conservative, 100 = aggressive
    #[arg(long, default_value = "50")]
    pub style_bias: i32,

    /// Carve out an ELSS allocation for tax saving
    #[arg(long)]
    pub tax_saving: bool,

    /// YAML or JSON file overriding the allocation tables
    #[arg(long)]
    pub config: Option<String>,
}

/// Arguments for projecting a portfolio supplied as JSON
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON input file: {"funds": [...], "tenure_years": N}
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PortfolioMode {
    Auto,
    Manual,
}

/// Arguments for a live portfolio build
#[derive(Args)]
pub struct PortfolioArgs {
    /// auto: allocate a budget by risk profile; manual: use the given schemes
    #[arg(long, default_value = "auto")]
    pub mode: PortfolioMode,

    /// Total monthly SIP budget (auto mode)
    #[arg(long)]
    pub budget: Option<Decimal>,

    /// Investment horizon in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Risk profile: low, medium or high (auto mode)
    #[arg(long, default_value = "medium")]
    pub risk: RiskProfile,

    /// 0 = conservative, 100 = aggressive (auto mode)
    #[arg(long, default_value = "50")]
    pub style_bias: i32,

    /// Include an ELSS fund for tax saving (auto mode)
    #[arg(long)]
    pub tax_saving: bool,

    /// Accept funds too young for a five-year return
    #[arg(long)]
    pub include_nfo: bool,

    /// Annual step-up applied to every fund, in percent
    #[arg(long, default_value = "0")]
    pub step_up: Decimal,

    /// Scheme and monthly amount as ID=AMOUNT (manual mode, repeatable)
    #[arg(long = "fund", value_parser = parse_manual_entry)]
    pub funds: Vec<ManualEntry>,

    /// YAML or JSON file overriding allocation tables and curated funds
    #[arg(long)]
    pub config: Option<String>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct ProjectInput {
    funds: Vec<PortfolioFund>,
    tenure_years: u32,
}

#[derive(Deserialize)]
struct ManualInput {
    entries: Vec<ManualEntry>,
    tenure_years: u32,
}

fn parse_manual_entry(raw: &str) -> Result<ManualEntry, String> {
    let (scheme_id, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected SCHEME_ID=AMOUNT, got '{raw}'"))?;
    let monthly_sip_amount: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount in '{raw}': {e}"))?;
    Ok(ManualEntry {
        scheme_id: scheme_id.trim().to_string(),
        monthly_sip_amount,
        step_up_rate: Decimal::ZERO,
    })
}

fn load_allocation_config(
    path: Option<&str>,
) -> Result<AllocationConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => input::file::read_config(p)?,
        None => AllocationConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_allocation_config(args.config.as_deref())?;
    let target = build_allocation_with(&config, args.risk, args.style_bias, args.tax_saving)?;

    let mut warnings = Vec::new();
    if !target.unallocated().is_zero() {
        warnings.push(format!("{}% of the budget is unallocated", target.unallocated()));
    }

    Ok(json!({
        "risk": args.risk,
        "style_bias": args.style_bias,
        "include_tax_saving": args.tax_saving,
        "entries": target,
        "total": target.total(),
        "unallocated": target.unallocated(),
        "warnings": warnings,
    }))
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let project_input: ProjectInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide the portfolio via --input or stdin".into());
    };

    let projection = project_portfolio(&project_input.funds, project_input.tenure_years)?;
    Ok(serde_json::to_value(projection)?)
}

pub fn run_portfolio(
    args: PortfolioArgs,
    config: &AppConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    match args.mode {
        PortfolioMode::Auto => run_auto(args, config),
        PortfolioMode::Manual => run_manual(args, config),
    }
}

fn run_auto(args: PortfolioArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let allocation_config = load_allocation_config(args.config.as_deref())?;
    let auto_input: AutoPortfolioInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AutoPortfolioInput {
            monthly_budget: args
                .budget
                .ok_or("--budget is required (or provide --input)")?,
            tenure_years: args.years.ok_or("--years is required (or provide --input)")?,
            risk: args.risk,
            style_bias: args.style_bias,
            include_tax_saving: args.tax_saving,
            include_nfo: args.include_nfo,
            step_up_rate: args.step_up,
        }
    };

    let provider = config.provider()?;
    let result = config
        .runtime()?
        .block_on(create_portfolio(&provider, &auto_input, &allocation_config))?;
    Ok(serde_json::to_value(result)?)
}

fn run_manual(args: PortfolioArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let manual_input: ManualInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        if args.funds.is_empty() {
            return Err("--fund ID=AMOUNT is required in manual mode (or provide --input)".into());
        }
        let step_up = args.step_up;
        ManualInput {
            entries: args
                .funds
                .into_iter()
                .map(|e| ManualEntry {
                    step_up_rate: step_up,
                    ..e
                })
                .collect(),
            tenure_years: args.years.ok_or("--years is required (or provide --input)")?,
        }
    };

    let provider = config.provider()?;
    let result = config.runtime()?.block_on(build_manual_portfolio(
        &provider,
        &manual_input.entries,
        manual_input.tenure_years,
    ))?;
    Ok(serde_json::to_value(result)?)
}
