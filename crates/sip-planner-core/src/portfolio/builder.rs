use std::collections::BTreeMap;
use std::time::Instant;

use futures::future::join_all;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculators::sip::MAX_TENURE_YEARS;
use crate::error::SipPlannerError;
use crate::funds::provider::NavDataProvider;
use crate::funds::records::resolve_fund;
use crate::portfolio::allocation::{build_allocation_with, AllocationConfig, AllocationTarget, RiskProfile};
use crate::portfolio::projection::{apply_projection, project_portfolio, PortfolioFund, PortfolioProjection};
use crate::portfolio::resolution::{resolve_category_to_fund, CategoryResolution, ResolutionOptions};
use crate::types::{with_metadata, CategoryTag, ComputationOutput, Money, Percent};
use crate::SipResult;

/// A single fund house above this share of the monthly budget is flagged.
pub const ISSUER_CONCENTRATION_LIMIT: Percent = dec!(50);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_style_bias() -> i32 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPortfolioInput {
    pub monthly_budget: Money,
    pub tenure_years: u32,
    pub risk: RiskProfile,
    /// 0 = conservative, 100 = aggressive.
    #[serde(default = "default_style_bias")]
    pub style_bias: i32,
    #[serde(default)]
    pub include_tax_saving: bool,
    #[serde(default)]
    pub include_nfo: bool,
    /// Applied to every fund; 0 disables step-up.
    #[serde(default)]
    pub step_up_rate: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerExposure {
    pub issuer: String,
    pub monthly_amount: Money,
    pub percent: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPortfolio {
    pub allocation: AllocationTarget,
    pub funds: Vec<PortfolioFund>,
    pub resolutions: Vec<CategoryResolution>,
    pub unfulfilled_categories: Vec<CategoryTag>,
    pub issuer_exposure: Vec<IssuerExposure>,
    /// `None` when no category could be resolved.
    pub projection: Option<PortfolioProjection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualEntry {
    pub scheme_id: String,
    pub monthly_sip_amount: Money,
    #[serde(default)]
    pub step_up_rate: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualPortfolio {
    pub funds: Vec<PortfolioFund>,
    pub unresolved_scheme_ids: Vec<String>,
    pub issuer_exposure: Vec<IssuerExposure>,
    pub projection: Option<PortfolioProjection>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monthly SIP per fund house, largest first.
pub fn issuer_exposure(funds: &[PortfolioFund]) -> Vec<IssuerExposure> {
    let total: Money = funds.iter().map(|f| f.monthly_sip_amount).sum();
    let mut by_issuer: BTreeMap<&str, Money> = BTreeMap::new();
    for f in funds {
        *by_issuer.entry(f.fund.amc.as_str()).or_default() += f.monthly_sip_amount;
    }

    let mut exposure: Vec<IssuerExposure> = by_issuer
        .into_iter()
        .map(|(issuer, monthly_amount)| IssuerExposure {
            issuer: issuer.to_string(),
            monthly_amount,
            percent: if total.is_zero() {
                Decimal::ZERO
            } else {
                (monthly_amount / total * dec!(100)).round_dp(2)
            },
        })
        .collect();
    exposure.sort_by(|a, b| b.monthly_amount.cmp(&a.monthly_amount));
    exposure
}

fn concentration_warnings(exposure: &[IssuerExposure]) -> Vec<String> {
    exposure
        .iter()
        .filter(|e| e.percent > ISSUER_CONCENTRATION_LIMIT)
        .map(|e| {
            format!(
                "{}% of the monthly SIP is with a single fund house ({})",
                e.percent, e.issuer
            )
        })
        .collect()
}

fn validate_tenure(tenure_years: u32) -> SipResult<()> {
    if tenure_years == 0 || tenure_years > MAX_TENURE_YEARS {
        return Err(SipPlannerError::InvalidInput {
            field: "tenure_years".into(),
            reason: format!("Tenure must be between 1 and {MAX_TENURE_YEARS} years"),
        });
    }
    Ok(())
}

fn round_rupees(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// ---------------------------------------------------------------------------
// Auto mode
// ---------------------------------------------------------------------------

/// Build a diversified portfolio from a budget and risk profile.
///
/// Every category in the target allocation is resolved concurrently. A
/// category that cannot be resolved is left out and reported; the build only
/// fails on invalid input.
pub async fn create_portfolio<P>(
    provider: &P,
    input: &AutoPortfolioInput,
    config: &AllocationConfig,
) -> SipResult<ComputationOutput<AutoPortfolio>>
where
    P: NavDataProvider + ?Sized,
{
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.monthly_budget <= Decimal::ZERO {
        return Err(SipPlannerError::InvalidInput {
            field: "monthly_budget".into(),
            reason: "Monthly budget must be > 0".into(),
        });
    }
    validate_tenure(input.tenure_years)?;
    if input.step_up_rate < Decimal::ZERO {
        return Err(SipPlannerError::InvalidInput {
            field: "step_up_rate".into(),
            reason: "Step-up rate cannot be negative".into(),
        });
    }

    let allocation = build_allocation_with(config, input.risk, input.style_bias, input.include_tax_saving)?;
    let unallocated = allocation.unallocated();
    if unallocated > Decimal::ZERO {
        warnings.push(format!(
            "{unallocated}% of the budget is not allocated to any category"
        ));
    }

    let options = ResolutionOptions {
        include_nfo: input.include_nfo,
        ..ResolutionOptions::default()
    };
    let resolutions: Vec<CategoryResolution> = join_all(allocation.categories().map(|category| {
        resolve_category_to_fund(provider, category, config.candidates_for(category), &options)
    }))
    .await;

    let mut funds = Vec::new();
    let mut unfulfilled_categories = Vec::new();
    for resolution in &resolutions {
        match &resolution.fund {
            Some(record) => {
                let pct = allocation.get(resolution.category);
                let sip = round_rupees(input.monthly_budget * pct / dec!(100));
                funds.push(PortfolioFund::new(record.clone(), pct, sip).with_step_up(input.step_up_rate));
            }
            None => {
                let err = SipPlannerError::UnresolvableCategory(resolution.category);
                warnings.push(err.to_string());
                unfulfilled_categories.push(resolution.category);
            }
        }
    }

    let projection = if funds.is_empty() {
        warnings.push("No category could be resolved to a fund; nothing to project".into());
        None
    } else {
        let projection = project_portfolio(&funds, input.tenure_years)?;
        apply_projection(&mut funds, &projection);
        Some(projection)
    };

    let issuer_exposure = issuer_exposure(&funds);
    warnings.extend(concentration_warnings(&issuer_exposure));

    tracing::info!(
        risk = %input.risk,
        resolved = funds.len(),
        unfulfilled = unfulfilled_categories.len(),
        "auto portfolio built"
    );

    let output = AutoPortfolio {
        allocation,
        funds,
        resolutions,
        unfulfilled_categories,
        issuer_exposure,
        projection,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Risk-based category allocation, curated-then-search fund resolution, per-fund SIP projection",
        &serde_json::json!({
            "monthly_budget": input.monthly_budget.to_string(),
            "tenure_years": input.tenure_years,
            "risk": input.risk,
            "style_bias": input.style_bias,
            "include_tax_saving": input.include_tax_saving,
            "include_nfo": input.include_nfo,
            "return_fallback": "5y CAGR, then 3y CAGR, then category default",
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Manual mode
// ---------------------------------------------------------------------------

/// Build a portfolio from explicit scheme ids and SIP amounts.
///
/// Allocation percent is each fund's share of the resolved monthly total.
/// Scheme ids that cannot be fetched are reported, not fatal.
pub async fn build_manual_portfolio<P>(
    provider: &P,
    entries: &[ManualEntry],
    tenure_years: u32,
) -> SipResult<ComputationOutput<ManualPortfolio>>
where
    P: NavDataProvider + ?Sized,
{
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if entries.is_empty() {
        return Err(SipPlannerError::InsufficientData(
            "Manual portfolio needs at least one fund".into(),
        ));
    }
    validate_tenure(tenure_years)?;
    for e in entries {
        if e.monthly_sip_amount <= Decimal::ZERO {
            return Err(SipPlannerError::InvalidInput {
                field: "monthly_sip_amount".into(),
                reason: format!("SIP for scheme {} must be > 0", e.scheme_id),
            });
        }
        if e.step_up_rate < Decimal::ZERO {
            return Err(SipPlannerError::InvalidInput {
                field: "step_up_rate".into(),
                reason: format!("Step-up for scheme {} cannot be negative", e.scheme_id),
            });
        }
    }

    let records = join_all(entries.iter().map(|e| resolve_fund(provider, &e.scheme_id))).await;

    let mut resolved = Vec::new();
    let mut unresolved_scheme_ids = Vec::new();
    for (entry, record) in entries.iter().zip(records) {
        match record {
            Some(record) => resolved.push((entry, record)),
            None => {
                warnings.push(format!("Scheme {} could not be fetched", entry.scheme_id));
                unresolved_scheme_ids.push(entry.scheme_id.clone());
            }
        }
    }

    let total: Money = resolved.iter().map(|(e, _)| e.monthly_sip_amount).sum();
    let mut funds: Vec<PortfolioFund> = resolved
        .into_iter()
        .map(|(e, record)| {
            let pct = (e.monthly_sip_amount / total * dec!(100)).round_dp(4);
            PortfolioFund::new(record, pct, e.monthly_sip_amount).with_step_up(e.step_up_rate)
        })
        .collect();

    let projection = if funds.is_empty() {
        warnings.push("None of the requested schemes could be fetched".into());
        None
    } else {
        let projection = project_portfolio(&funds, tenure_years)?;
        apply_projection(&mut funds, &projection);
        Some(projection)
    };

    for f in funds.iter().filter(|f| f.fund.flags.is_approx) {
        warnings.push(format!("Returns for {} use approximate NAV dates", f.fund.name));
    }
    let issuer_exposure = issuer_exposure(&funds);
    warnings.extend(concentration_warnings(&issuer_exposure));

    let output = ManualPortfolio {
        funds,
        unresolved_scheme_ids,
        issuer_exposure,
        projection,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Manual fund selection, per-fund SIP projection",
        &serde_json::json!({
            "tenure_years": tenure_years,
            "funds_requested": entries.len(),
            "return_fallback": "5y CAGR, then 3y CAGR, then category default",
        }),
        warnings,
        elapsed,
        output,
    ))
}
