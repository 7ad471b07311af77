use crate::error::SipPlannerError;
use crate::funds::classifier::{
    category_from_scheme_category, classify, extract_issuer, is_direct_plan, is_growth_plan,
};
use crate::funds::provider::{NavDataProvider, NavSeries};
use crate::funds::returns::resolve_cagr_set;
use crate::types::FundRecord;
use crate::SipResult;

/// Assemble a `FundRecord` from a completed NAV fetch.
///
/// The provider's scheme category takes precedence over the name when it
/// maps to a known category.
pub fn build_fund_record(series: &NavSeries) -> SipResult<FundRecord> {
    let name = series.meta.scheme_name.trim();
    let cagr = resolve_cagr_set(&series.points, None);
    let (nav_date, nav_value) = match (cagr.latest_date, cagr.latest_nav) {
        (Some(d), Some(v)) => (d, v),
        _ => {
            return Err(SipPlannerError::InsufficientData(format!(
                "no NAV history for scheme {}",
                series.meta.scheme_id
            )))
        }
    };

    let category = series
        .meta
        .scheme_category
        .as_deref()
        .and_then(category_from_scheme_category)
        .unwrap_or_else(|| classify(name));

    let amc = series
        .meta
        .fund_house
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|h| h.trim_end_matches(" Mutual Fund").to_string())
        .unwrap_or_else(|| extract_issuer(name));

    Ok(FundRecord {
        scheme_id: series.meta.scheme_id.clone(),
        name: name.to_string(),
        category,
        amc,
        nav_value,
        nav_date,
        cagr_1y: cagr.cagr_1y(),
        cagr_3y: cagr.cagr_3y(),
        cagr_5y: cagr.cagr_5y(),
        is_direct_plan: is_direct_plan(name),
        is_growth_plan: is_growth_plan(name),
        flags: cagr.flags,
    })
}

/// Fetch and build a single fund. Provider failures surface as
/// `ProviderUnavailable`.
pub async fn fetch_fund_record<P>(provider: &P, scheme_id: &str) -> SipResult<FundRecord>
where
    P: NavDataProvider + ?Sized,
{
    let series = provider.fetch_nav_series(scheme_id).await?;
    build_fund_record(&series)
}

/// Like `fetch_fund_record`, but any failure degrades to `None`.
pub async fn resolve_fund<P>(provider: &P, scheme_id: &str) -> Option<FundRecord>
where
    P: NavDataProvider + ?Sized,
{
    match fetch_fund_record(provider, scheme_id).await {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(scheme_id, error = %e, "could not resolve fund");
            None
        }
    }
}
