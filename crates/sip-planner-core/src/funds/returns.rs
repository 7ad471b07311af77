use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::cagr;
use crate::types::{CategoryTag, FundRecord, NavPoint, Percent, ReturnFlags};

/// A matched historical NAV further than this from its target date makes the
/// CAGR approximate.
pub const MAX_DATE_GAP_DAYS: i64 = 10;

/// Trailing horizons reported for every fund, in years.
pub const CAGR_HORIZONS: [u32; 3] = [1, 3, 5];

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CagrQuality {
    /// Matched NAV within `MAX_DATE_GAP_DAYS` of the target date.
    Historical,
    /// Matched NAV further than `MAX_DATE_GAP_DAYS` from the target date.
    Approx,
}

/// CAGR for a single trailing horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CagrMetric {
    pub horizon_years: u32,
    pub value: Percent,
    pub quality: CagrQuality,
    pub start_date: NaiveDate,
    pub start_nav: Decimal,
    /// Days between the horizon cutoff and the NAV actually used.
    pub date_gap_days: i64,
}

/// Trailing 1/3/5-year returns derived from a NAV history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CagrSet {
    pub latest_date: Option<NaiveDate>,
    pub latest_nav: Option<Decimal>,
    pub one_year: Option<CagrMetric>,
    pub three_year: Option<CagrMetric>,
    pub five_year: Option<CagrMetric>,
    pub flags: ReturnFlags,
}

/// Which figure fed a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnSource {
    FiveYear,
    ThreeYear,
    CategoryDefault,
}

impl CagrSet {
    pub fn cagr_1y(&self) -> Option<Percent> {
        self.one_year.as_ref().map(|m| m.value)
    }

    pub fn cagr_3y(&self) -> Option<Percent> {
        self.three_year.as_ref().map(|m| m.value)
    }

    pub fn cagr_5y(&self) -> Option<Percent> {
        self.five_year.as_ref().map(|m| m.value)
    }

    /// Return used for projections: 5y, else 3y, else the category default.
    pub fn effective_return(&self, category: CategoryTag) -> (Percent, ReturnSource) {
        effective_return(self.cagr_5y(), self.cagr_3y(), category)
    }
}

impl FundRecord {
    /// Return used for projections: 5y, else 3y, else the category default.
    pub fn effective_return(&self) -> (Percent, ReturnSource) {
        effective_return(self.cagr_5y, self.cagr_3y, self.category)
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Long-run expected return per category, used when a fund lacks history.
pub fn category_default_return(category: CategoryTag) -> Percent {
    match category {
        CategoryTag::LargeCap => dec!(12),
        CategoryTag::MidCap => dec!(15),
        CategoryTag::SmallCap => dec!(18),
        CategoryTag::FlexiCap => dec!(13),
        CategoryTag::Elss => dec!(13),
        CategoryTag::Debt => dec!(7),
        CategoryTag::Hybrid => dec!(10),
        CategoryTag::Index => dec!(11),
        CategoryTag::Thematic => dec!(14),
        CategoryTag::International => dec!(12),
        CategoryTag::Other => dec!(12),
    }
}

pub fn effective_return(
    cagr_5y: Option<Percent>,
    cagr_3y: Option<Percent>,
    category: CategoryTag,
) -> (Percent, ReturnSource) {
    match (cagr_5y, cagr_3y) {
        (Some(r), _) => (r, ReturnSource::FiveYear),
        (None, Some(r)) => (r, ReturnSource::ThreeYear),
        (None, None) => (category_default_return(category), ReturnSource::CategoryDefault),
    }
}

/// Derive trailing 1/3/5-year CAGRs from a NAV history.
///
/// The latest NAV is the newest observation on or before `as_of` (or the
/// newest overall). For each horizon the start NAV is the most recent
/// observation not newer than `latest - H years`; markets are closed on
/// weekends and holidays, so exact-date matches are not required. A horizon
/// with no observation old enough is `None`.
pub fn resolve_cagr_set(series: &[NavPoint], as_of: Option<NaiveDate>) -> CagrSet {
    let mut points: Vec<NavPoint> = series
        .iter()
        .filter(|p| as_of.map_or(true, |d| p.date <= d))
        .copied()
        .collect();
    points.sort_by(|a, b| b.date.cmp(&a.date));

    let Some(latest) = points.first().copied() else {
        return CagrSet {
            flags: ReturnFlags {
                is_estimated: true,
                is_approx: false,
                is_nfo: true,
            },
            ..CagrSet::default()
        };
    };

    let [one_year, three_year, five_year] =
        CAGR_HORIZONS.map(|h| horizon_cagr(&points, latest, h));

    let metrics = [&one_year, &three_year, &five_year];
    let flags = ReturnFlags {
        is_estimated: metrics.iter().any(|m| m.is_none()),
        is_approx: metrics
            .into_iter()
            .flatten()
            .any(|m| m.quality == CagrQuality::Approx),
        is_nfo: five_year.is_none(),
    };

    CagrSet {
        latest_date: Some(latest.date),
        latest_nav: Some(latest.nav),
        one_year,
        three_year,
        five_year,
        flags,
    }
}

/// `points` must be sorted newest first.
fn horizon_cagr(points: &[NavPoint], latest: NavPoint, horizon_years: u32) -> Option<CagrMetric> {
    let cutoff = latest
        .date
        .checked_sub_months(Months::new(horizon_years * 12))?;
    let start = points.iter().find(|p| p.date <= cutoff)?;
    let value = cagr(start.nav, latest.nav, Decimal::from(horizon_years))?;
    let date_gap_days = (cutoff - start.date).num_days();
    let quality = if date_gap_days > MAX_DATE_GAP_DAYS {
        tracing::debug!(
            horizon_years,
            date_gap_days,
            "CAGR start NAV is beyond the allowed date gap"
        );
        CagrQuality::Approx
    } else {
        CagrQuality::Historical
    };

    Some(CagrMetric {
        horizon_years,
        value,
        quality,
        start_date: start.date,
        start_nav: start.nav,
        date_gap_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(y: i32, m: u32, d: u32, nav: Decimal) -> NavPoint {
        NavPoint {
            date: date(y, m, d),
            nav,
        }
    }

    fn six_year_series() -> Vec<NavPoint> {
        vec![
            point(2026, 2, 9, dec!(200)),
            point(2025, 2, 7, dec!(180)),
            point(2023, 2, 9, dec!(150)),
            point(2021, 2, 8, dec!(100)),
            point(2020, 1, 1, dec!(90)),
        ]
    }

    #[test]
    fn test_resolves_all_horizons() {
        let set = resolve_cagr_set(&six_year_series(), None);
        assert_eq!(set.latest_date, Some(date(2026, 2, 9)));
        // 200/180 - 1 = 11.11%
        let one = set.one_year.as_ref().unwrap();
        assert!((one.value - dec!(11.111)).abs() < dec!(0.01));
        assert_eq!(one.start_date, date(2025, 2, 7));
        assert_eq!(one.date_gap_days, 2);
        assert_eq!(one.quality, CagrQuality::Historical);
        // (200/150)^(1/3) - 1 ≈ 10.06%
        assert!((set.cagr_3y().unwrap() - dec!(10.06)).abs() < dec!(0.01));
        // 2^(1/5) - 1 ≈ 14.87%
        assert!((set.cagr_5y().unwrap() - dec!(14.87)).abs() < dec!(0.01));
        assert_eq!(set.flags, ReturnFlags::default());
    }

    #[test]
    fn test_picks_most_recent_entry_not_newer_than_cutoff() {
        let series = vec![
            point(2026, 2, 9, dec!(110)),
            point(2025, 2, 10, dec!(105)),
            point(2025, 2, 6, dec!(100)),
            point(2025, 1, 1, dec!(90)),
        ];
        let set = resolve_cagr_set(&series, None);
        let one = set.one_year.unwrap();
        assert_eq!(one.start_date, date(2025, 2, 6));
        assert_eq!(one.value, dec!(10));
    }

    #[test]
    fn test_unsorted_input_is_handled() {
        let mut series = six_year_series();
        series.reverse();
        assert_eq!(
            resolve_cagr_set(&series, None),
            resolve_cagr_set(&six_year_series(), None)
        );
    }

    #[test]
    fn test_young_fund_is_nfo_and_estimated() {
        let series = vec![point(2026, 2, 9, dec!(12)), point(2025, 6, 1, dec!(10))];
        let set = resolve_cagr_set(&series, None);
        assert!(set.one_year.is_none());
        assert!(set.five_year.is_none());
        assert!(set.flags.is_nfo);
        assert!(set.flags.is_estimated);
    }

    #[test]
    fn test_large_gap_marks_approx() {
        let series = vec![
            point(2026, 2, 9, dec!(120)),
            point(2025, 1, 15, dec!(100)),
        ];
        let set = resolve_cagr_set(&series, None);
        let one = set.one_year.unwrap();
        assert_eq!(one.quality, CagrQuality::Approx);
        assert_eq!(one.date_gap_days, 25);
        assert!(set.flags.is_approx);
    }

    #[test]
    fn test_as_of_truncates_history() {
        let set = resolve_cagr_set(&six_year_series(), Some(date(2025, 12, 31)));
        assert_eq!(set.latest_date, Some(date(2025, 2, 7)));
        assert_eq!(set.latest_nav, Some(dec!(180)));
    }

    #[test]
    fn test_empty_series() {
        let set = resolve_cagr_set(&[], None);
        assert!(set.latest_date.is_none());
        assert!(set.flags.is_nfo && set.flags.is_estimated);
    }

    #[test]
    fn test_effective_return_fallback_chain() {
        assert_eq!(
            effective_return(Some(dec!(14)), Some(dec!(11)), CategoryTag::MidCap),
            (dec!(14), ReturnSource::FiveYear)
        );
        assert_eq!(
            effective_return(None, Some(dec!(11)), CategoryTag::MidCap),
            (dec!(11), ReturnSource::ThreeYear)
        );
        assert_eq!(
            effective_return(None, None, CategoryTag::MidCap),
            (dec!(15), ReturnSource::CategoryDefault)
        );
    }
}
