use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use sip_planner_core::portfolio::allocation::{AllocationConfig, RiskProfile};
use sip_planner_core::portfolio::projection::PortfolioFund;
use sip_planner_core::{CategoryTag, NavPoint};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Request shapes for functions without a core input struct
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ReverseSipRequest {
    target_corpus: Decimal,
    years: u32,
    annual_return_rate: Decimal,
}

#[derive(Deserialize)]
struct CagrRequest {
    start_value: Decimal,
    end_value: Decimal,
    years: Decimal,
}

#[derive(Deserialize)]
struct TaxRequest {
    gains: Decimal,
    category: CategoryTag,
}

#[derive(Deserialize)]
struct ClassifyRequest {
    name: String,
}

fn default_style_bias() -> i32 {
    50
}

#[derive(Deserialize)]
struct AllocationRequest {
    risk: RiskProfile,
    #[serde(default = "default_style_bias")]
    style_bias: i32,
    #[serde(default)]
    include_tax_saving: bool,
    #[serde(default)]
    config: Option<AllocationConfig>,
}

#[derive(Deserialize)]
struct ProjectionRequest {
    funds: Vec<PortfolioFund>,
    tenure_years: u32,
}

#[derive(Deserialize)]
struct NavHistoryRequest {
    points: Vec<NavPoint>,
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Calculators
// ---------------------------------------------------------------------------

#[napi]
pub fn project_sip(input_json: String) -> NapiResult<String> {
    let input: sip_planner_core::calculators::sip::SipCalculatorInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        sip_planner_core::calculators::sip::calculate_sip(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn plan_goal(input_json: String) -> NapiResult<String> {
    let input: sip_planner_core::calculators::goal::GoalInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sip_planner_core::calculators::goal::plan_goal(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn reverse_sip(input_json: String) -> NapiResult<String> {
    let req: ReverseSipRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let sip = sip_planner_core::calculators::goal::reverse_sip(
        req.target_corpus,
        req.years,
        req.annual_return_rate,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&json!({ "required_monthly_sip": sip })).map_err(to_napi_error)
}

#[napi]
pub fn calculate_cagr(input_json: String) -> NapiResult<String> {
    let req: CagrRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let cagr = sip_planner_core::time_value::try_cagr(req.start_value, req.end_value, req.years)
        .map_err(to_napi_error)?;
    serde_json::to_string(&json!({ "cagr": cagr })).map_err(to_napi_error)
}

#[napi]
pub fn tax_on_gains(input_json: String) -> NapiResult<String> {
    let req: TaxRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let breakdown = sip_planner_core::calculators::tax::tax_breakdown(req.gains, req.category);
    serde_json::to_string(&breakdown).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let input: sip_planner_core::scenarios::comparison::ScenarioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sip_planner_core::scenarios::comparison::compare_scenarios(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_step_up(input_json: String) -> NapiResult<String> {
    let input: sip_planner_core::scenarios::comparison::StepUpInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sip_planner_core::scenarios::comparison::compare_step_up(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Funds
// ---------------------------------------------------------------------------

#[napi]
pub fn classify_fund(input_json: String) -> NapiResult<String> {
    use sip_planner_core::funds::classifier;

    let req: ClassifyRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let category = classifier::classify(&req.name);
    serde_json::to_string(&json!({
        "category": category,
        "risk": classifier::risk_tier(category),
        "issuer": classifier::extract_issuer(&req.name),
        "is_direct_plan": classifier::is_direct_plan(&req.name),
        "is_growth_plan": classifier::is_growth_plan(&req.name),
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn resolve_cagr_set(input_json: String) -> NapiResult<String> {
    let req: NavHistoryRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let set = sip_planner_core::funds::returns::resolve_cagr_set(&req.points, req.as_of);
    serde_json::to_string(&set).map_err(to_napi_error)
}

#[napi]
pub fn assess_nav_quality(input_json: String) -> NapiResult<String> {
    let req: NavHistoryRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let report =
        sip_planner_core::funds::quality::assess_nav_quality(&req.points).map_err(to_napi_error)?;
    serde_json::to_string(&report).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn build_allocation(input_json: String) -> NapiResult<String> {
    let req: AllocationRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = req.config.unwrap_or_default();
    let target = sip_planner_core::portfolio::allocation::build_allocation_with(
        &config,
        req.risk,
        req.style_bias,
        req.include_tax_saving,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&json!({
        "entries": target,
        "total": target.total(),
        "unallocated": target.unallocated(),
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn project_portfolio(input_json: String) -> NapiResult<String> {
    let req: ProjectionRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let projection =
        sip_planner_core::portfolio::projection::project_portfolio(&req.funds, req.tenure_years)
            .map_err(to_napi_error)?;
    serde_json::to_string(&projection).map_err(to_napi_error)
}
