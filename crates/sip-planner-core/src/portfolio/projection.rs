use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculators::sip::{
    forward_projection, SipFrequency, SipPlan, YearlyProjection, MAX_TENURE_YEARS,
};
use crate::error::SipPlannerError;
use crate::funds::returns::ReturnSource;
use crate::types::{CategoryTag, FundRecord, Money, Percent};
use crate::SipResult;

/// A fund held in a portfolio, with its SIP settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioFund {
    #[serde(flatten)]
    pub fund: FundRecord,
    pub allocation_percent: Percent,
    pub monthly_sip_amount: Money,
    #[serde(default)]
    pub step_up_enabled: bool,
    #[serde(default)]
    pub step_up_rate: Percent,
    #[serde(default)]
    pub projected_future_value: Option<Money>,
}

impl PortfolioFund {
    pub fn new(fund: FundRecord, allocation_percent: Percent, monthly_sip_amount: Money) -> Self {
        Self {
            fund,
            allocation_percent,
            monthly_sip_amount,
            step_up_enabled: false,
            step_up_rate: Decimal::ZERO,
            projected_future_value: None,
        }
    }

    pub fn with_step_up(mut self, step_up_rate: Percent) -> Self {
        self.step_up_enabled = step_up_rate > Decimal::ZERO;
        self.step_up_rate = step_up_rate;
        self
    }

    fn effective_step_up(&self) -> Percent {
        if self.step_up_enabled {
            self.step_up_rate
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundProjection {
    pub scheme_id: String,
    pub name: String,
    pub category: CategoryTag,
    pub annual_return_rate: Percent,
    pub return_source: ReturnSource,
    pub invested: Money,
    pub corpus: Money,
    pub returns: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProjection {
    pub tenure_years: u32,
    pub total_invested: Money,
    pub total_corpus: Money,
    pub total_returns: Money,
    /// Allocation-weighted blend of fund returns, not a money-weighted IRR.
    pub weighted_cagr: Percent,
    pub funds: Vec<FundProjection>,
    /// Portfolio totals per year, summed across funds.
    pub year_by_year: Vec<YearlyProjection>,
}

/// Project every fund at its own effective return and sum the results.
pub fn project_portfolio(funds: &[PortfolioFund], tenure_years: u32) -> SipResult<PortfolioProjection> {
    if funds.is_empty() {
        return Err(SipPlannerError::InsufficientData(
            "Portfolio has no funds to project".into(),
        ));
    }
    if tenure_years == 0 || tenure_years > MAX_TENURE_YEARS {
        return Err(SipPlannerError::InvalidInput {
            field: "tenure_years".into(),
            reason: format!("Tenure must be between 1 and {MAX_TENURE_YEARS} years"),
        });
    }

    let mut year_by_year: Vec<YearlyProjection> = (1..=tenure_years)
        .map(|year| YearlyProjection {
            year,
            invested: Decimal::ZERO,
            corpus: Decimal::ZERO,
            returns: Decimal::ZERO,
        })
        .collect();
    let mut projections = Vec::with_capacity(funds.len());
    let mut weighted_cagr = Decimal::ZERO;

    for pf in funds {
        if pf.monthly_sip_amount < Decimal::ZERO {
            return Err(SipPlannerError::InvalidInput {
                field: "monthly_sip_amount".into(),
                reason: format!("Negative SIP for scheme {}", pf.fund.scheme_id),
            });
        }
        let (rate, source) = pf.fund.effective_return();
        let plan = SipPlan {
            monthly_amount: pf.monthly_sip_amount,
            annual_return_rate: rate,
            years: tenure_years,
            step_up_rate: pf.effective_step_up(),
            lump_sum: Decimal::ZERO,
            frequency: SipFrequency::Monthly,
        };

        let years = forward_projection(&plan)?;
        for (total, y) in year_by_year.iter_mut().zip(&years) {
            total.invested = add_totals(total.invested, y.invested)?;
            total.corpus = add_totals(total.corpus, y.corpus)?;
            total.returns = total.corpus - total.invested;
        }
        let (invested, corpus) = years
            .last()
            .map(|y| (y.invested, y.corpus))
            .unwrap_or_default();

        weighted_cagr += rate * pf.allocation_percent / dec!(100);
        projections.push(FundProjection {
            scheme_id: pf.fund.scheme_id.clone(),
            name: pf.fund.name.clone(),
            category: pf.fund.category,
            annual_return_rate: rate,
            return_source: source,
            invested,
            corpus,
            returns: corpus - invested,
        });
    }

    let (total_invested, total_corpus) = year_by_year
        .last()
        .map(|y| (y.invested, y.corpus))
        .unwrap_or_default();

    Ok(PortfolioProjection {
        tenure_years,
        total_invested,
        total_corpus,
        total_returns: total_corpus - total_invested,
        weighted_cagr,
        funds: projections,
        year_by_year,
    })
}

fn add_totals(a: Money, b: Money) -> SipResult<Money> {
    a.checked_add(b).ok_or_else(|| SipPlannerError::Overflow {
        context: "portfolio totals".into(),
    })
}

/// Copy each fund's projected corpus back onto the portfolio entry.
pub fn apply_projection(funds: &mut [PortfolioFund], projection: &PortfolioProjection) {
    for (pf, proj) in funds.iter_mut().zip(&projection.funds) {
        pf.projected_future_value = Some(proj.corpus);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReturnFlags;
    use chrono::NaiveDate;

    fn record(id: &str, category: CategoryTag, cagr_3y: Option<Decimal>, cagr_5y: Option<Decimal>) -> FundRecord {
        FundRecord {
            scheme_id: id.into(),
            name: format!("Fund {id}"),
            category,
            amc: "Other".into(),
            nav_value: dec!(10),
            nav_date: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
            cagr_1y: None,
            cagr_3y,
            cagr_5y,
            is_direct_plan: true,
            is_growth_plan: true,
            flags: ReturnFlags::default(),
        }
    }

    #[test]
    fn test_single_fund_matches_forward_projection() {
        let funds = vec![PortfolioFund::new(
            record("1", CategoryTag::LargeCap, None, Some(dec!(12))),
            dec!(100),
            dec!(5000),
        )];
        let p = project_portfolio(&funds, 10).unwrap();
        let direct = forward_projection(&SipPlan::monthly(dec!(5000), dec!(12), 10)).unwrap();
        assert_eq!(p.total_corpus, direct.last().unwrap().corpus);
        assert_eq!(p.total_invested, dec!(600000));
        assert_eq!(p.weighted_cagr, dec!(12));
        assert_eq!(p.year_by_year.len(), 10);
    }

    #[test]
    fn test_weighted_cagr_is_linear_blend_with_fallbacks() {
        let funds = vec![
            PortfolioFund::new(record("1", CategoryTag::LargeCap, None, Some(dec!(14))), dec!(50), dec!(5000)),
            PortfolioFund::new(record("2", CategoryTag::MidCap, Some(dec!(16)), None), dec!(30), dec!(3000)),
            PortfolioFund::new(record("3", CategoryTag::Debt, None, None), dec!(20), dec!(2000)),
        ];
        let p = project_portfolio(&funds, 5).unwrap();
        // 14×0.5 + 16×0.3 + 7×0.2
        assert_eq!(p.weighted_cagr, dec!(13.2));
        assert_eq!(p.funds[1].return_source, ReturnSource::ThreeYear);
        assert_eq!(p.funds[2].return_source, ReturnSource::CategoryDefault);
        assert_eq!(p.total_invested, dec!(600000));
        let summed: Decimal = p.funds.iter().map(|f| f.corpus).sum();
        assert_eq!(p.total_corpus, summed);
        assert_eq!(p.year_by_year.last().unwrap().corpus, summed);
    }

    #[test]
    fn test_step_up_only_applies_when_enabled() {
        let base = PortfolioFund::new(record("1", CategoryTag::LargeCap, None, Some(dec!(12))), dec!(100), dec!(1000));
        let mut disabled = base.clone();
        disabled.step_up_rate = dec!(10);
        let enabled = base.clone().with_step_up(dec!(10));

        let flat = project_portfolio(&[base], 5).unwrap();
        let off = project_portfolio(&[disabled], 5).unwrap();
        let on = project_portfolio(&[enabled], 5).unwrap();
        assert_eq!(flat.total_corpus, off.total_corpus);
        assert!(on.total_corpus > flat.total_corpus);
    }

    #[test]
    fn test_rejects_empty_portfolio_and_zero_tenure() {
        assert!(matches!(
            project_portfolio(&[], 10),
            Err(SipPlannerError::InsufficientData(_))
        ));
        let funds = vec![PortfolioFund::new(record("1", CategoryTag::Debt, None, None), dec!(100), dec!(1000))];
        assert!(project_portfolio(&funds, 0).is_err());
        assert!(project_portfolio(&funds, MAX_TENURE_YEARS + 1).is_err());
    }

    #[test]
    fn test_overflowing_projection_is_an_error() {
        let funds = vec![PortfolioFund::new(
            record("1", CategoryTag::SmallCap, None, Some(dec!(100))),
            dec!(100),
            dec!(5000),
        )];
        assert!(matches!(
            project_portfolio(&funds, MAX_TENURE_YEARS),
            Err(SipPlannerError::Overflow { .. })
        ));
    }

    #[test]
    fn test_apply_projection_sets_future_values() {
        let mut funds = vec![PortfolioFund::new(record("1", CategoryTag::Debt, None, None), dec!(100), dec!(1000))];
        let p = project_portfolio(&funds, 3).unwrap();
        apply_projection(&mut funds, &p);
        assert_eq!(funds[0].projected_future_value, Some(p.total_corpus));
    }
}
