use chrono::NaiveDate;
use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};

use sip_planner_core::funds::classifier::{
    classify, extract_issuer, is_direct_plan, is_growth_plan, risk_tier,
};
use sip_planner_core::funds::provider::NavDataProvider;
use sip_planner_core::funds::quality::assess_nav_quality;
use sip_planner_core::funds::records::fetch_fund_record;
use sip_planner_core::funds::returns::resolve_cagr_set;
use sip_planner_core::NavPoint;

use crate::config::AppConfig;
use crate::input;

/// Arguments for fund-name classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Scheme name, e.g. "Parag Parikh Flexi Cap Fund - Direct Plan - Growth"
    pub name: String,
}

/// Arguments for NAV history quality checks
#[derive(Args)]
pub struct NavQualityArgs {
    /// Path to JSON file: an array of {date, nav} or {"points": [...], "as_of": ...}
    #[arg(long)]
    pub input: Option<String>,

    /// Resolve trailing returns as of this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for a live fund lookup
#[derive(Args)]
pub struct FundArgs {
    /// MFAPI scheme code, e.g. 122639
    #[arg(long, conflicts_with = "search")]
    pub scheme_id: Option<String>,

    /// Search schemes by name instead of fetching one
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NavHistoryInput {
    Bare(Vec<NavPoint>),
    Wrapped {
        points: Vec<NavPoint>,
        #[serde(default)]
        as_of: Option<NaiveDate>,
    },
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let category = classify(&args.name);
    Ok(json!({
        "name": args.name,
        "category": category,
        "category_label": category.label(),
        "risk": risk_tier(category),
        "issuer": extract_issuer(&args.name),
        "is_direct_plan": is_direct_plan(&args.name),
        "is_growth_plan": is_growth_plan(&args.name),
    }))
}

pub fn run_nav_quality(args: NavQualityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("Provide NAV history via --input or stdin".into());
    };

    let history: NavHistoryInput = serde_json::from_value(raw)?;
    let (points, file_as_of) = match history {
        NavHistoryInput::Bare(points) => (points, None),
        NavHistoryInput::Wrapped { points, as_of } => (points, as_of),
    };

    let report = assess_nav_quality(&points)?;
    let returns = resolve_cagr_set(&points, args.as_of.or(file_as_of));
    Ok(json!({
        "quality": report,
        "returns": returns,
    }))
}

pub fn run_fund(args: FundArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let provider = config.provider()?;
    let runtime = config.runtime()?;

    if let Some(query) = args.search {
        let hits = runtime.block_on(provider.search_funds(&query))?;
        let rows: Vec<Value> = hits
            .into_iter()
            .map(|hit| {
                json!({
                    "scheme_id": hit.scheme_id,
                    "name": hit.name,
                    "category": classify(&hit.name),
                })
            })
            .collect();
        return Ok(json!({ "query": query, "funds": rows }));
    }

    let scheme_id = args
        .scheme_id
        .ok_or("--scheme-id or --search is required")?;
    let record = runtime.block_on(fetch_fund_record(&provider, &scheme_id))?;
    let (effective_return, source) = record.effective_return();
    let mut value = serde_json::to_value(&record)?;
    if let Value::Object(ref mut map) = value {
        map.insert("effective_return".into(), json!(effective_return));
        map.insert("return_source".into(), json!(source));
    }
    Ok(value)
}
