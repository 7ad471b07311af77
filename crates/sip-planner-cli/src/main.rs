mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::calculators::{CagrArgs, GoalArgs, InflationArgs, SipArgs, TaxArgs};
use commands::funds::{ClassifyArgs, FundArgs, NavQualityArgs};
use commands::portfolio::{AllocateArgs, PortfolioArgs, ProjectArgs};
use commands::scenarios::{CompareArgs, StepUpArgs};

/// SIP projections and mutual-fund portfolio analytics
#[derive(Parser)]
#[command(
    name = "sipcalc",
    version,
    author,
    about = "SIP projections and mutual-fund portfolio analytics",
    long_about = "A CLI for systematic investment plan calculations with decimal precision. \
                  Supports forward and reverse SIP, goal planning, CAGR, capital-gains tax, \
                  inflation adjustment, scenario comparison, fund classification, \
                  risk-based allocation and live portfolio construction from MFAPI NAV data."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Project a SIP (step-up, lump sum, inflation and tax aware)
    Sip(SipArgs),
    /// Monthly SIP needed to reach a target corpus
    Goal(GoalArgs),
    /// Compound annual growth rate between two values
    Cagr(CagrArgs),
    /// Capital-gains tax on fund returns
    Tax(TaxArgs),
    /// Inflation-adjusted value of invested principal
    Inflation(InflationArgs),
    /// Compare conservative, moderate and aggressive return scenarios
    Compare(CompareArgs),
    /// Compare a flat SIP against an annual step-up SIP
    StepUp(StepUpArgs),
    /// Classify a fund name into category, risk tier and fund house
    Classify(ClassifyArgs),
    /// Build a risk-based category allocation
    Allocate(AllocateArgs),
    /// Project a portfolio of funds from JSON
    Project(ProjectArgs),
    /// Assess the quality of a NAV history from JSON
    NavQuality(NavQualityArgs),
    /// Fetch a fund from MFAPI with its trailing returns
    Fund(FundArgs),
    /// Build a live portfolio from MFAPI data (auto or manual)
    Portfolio(PortfolioArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let app_config = config::AppConfig::from_env();
    if let Err(e) = logging::init_logging(&app_config) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Sip(args) => commands::calculators::run_sip(args),
        Commands::Goal(args) => commands::calculators::run_goal(args),
        Commands::Cagr(args) => commands::calculators::run_cagr(args),
        Commands::Tax(args) => commands::calculators::run_tax(args),
        Commands::Inflation(args) => commands::calculators::run_inflation(args),
        Commands::Compare(args) => commands::scenarios::run_compare(args),
        Commands::StepUp(args) => commands::scenarios::run_step_up(args),
        Commands::Classify(args) => commands::funds::run_classify(args),
        Commands::Allocate(args) => commands::portfolio::run_allocate(args),
        Commands::Project(args) => commands::portfolio::run_project(args),
        Commands::NavQuality(args) => commands::funds::run_nav_quality(args),
        Commands::Fund(args) => commands::funds::run_fund(args, &app_config),
        Commands::Portfolio(args) => commands::portfolio::run_portfolio(args, &app_config),
        Commands::Version => {
            println!("sipcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_credits_project_authors() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_author(), Some("SIP Planner Contributors"));
    }
}
