use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SipPlannerError;
use crate::types::{NavPoint, Percent};
use crate::SipResult;

/// Day-over-day NAV change beyond this (in either direction) is suspicious.
pub const SUSPICIOUS_JUMP_PERCENT: Percent = dec!(30);

/// Date format used by the NAV provider ("09-02-2026").
pub const NAV_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavJump {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub from_nav: Decimal,
    pub to_nav: Decimal,
    pub change_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavQualityReport {
    pub points: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Largest calendar gap between consecutive observations, in days.
    pub missing_nav_streak_days: i64,
    pub suspicious_count: usize,
    pub suspicious: Vec<NavJump>,
}

pub fn parse_nav_date(raw: &str) -> SipResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), NAV_DATE_FORMAT)
        .map_err(|e| SipPlannerError::DateError(format!("'{raw}': {e}")))
}

fn sorted_ascending(points: &[NavPoint]) -> Vec<NavPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by_key(|p| p.date);
    sorted
}

/// Largest gap in days between consecutive NAV dates; 0 with fewer than two points.
pub fn missing_nav_streak_days(points: &[NavPoint]) -> i64 {
    sorted_ascending(points)
        .windows(2)
        .map(|w| (w[1].date - w[0].date).num_days())
        .max()
        .unwrap_or(0)
}

/// Consecutive observations whose NAV moved by more than `SUSPICIOUS_JUMP_PERCENT`.
pub fn suspicious_jumps(points: &[NavPoint]) -> Vec<NavJump> {
    sorted_ascending(points)
        .windows(2)
        .filter_map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if prev.nav <= Decimal::ZERO {
                return None;
            }
            let change_percent = (curr.nav - prev.nav) / prev.nav * dec!(100);
            if change_percent.abs() <= SUSPICIOUS_JUMP_PERCENT {
                return None;
            }
            tracing::warn!(
                from = %prev.date,
                to = %curr.date,
                change = %change_percent.round_dp(2),
                "suspicious NAV jump"
            );
            Some(NavJump {
                from_date: prev.date,
                to_date: curr.date,
                from_nav: prev.nav,
                to_nav: curr.nav,
                change_percent,
            })
        })
        .collect()
}

pub fn assess_nav_quality(points: &[NavPoint]) -> SipResult<NavQualityReport> {
    let sorted = sorted_ascending(points);
    let (first, last) = match (sorted.first(), sorted.last()) {
        (Some(f), Some(l)) => (f.date, l.date),
        _ => {
            return Err(SipPlannerError::InsufficientData(
                "NAV series is empty".into(),
            ))
        }
    };

    let suspicious = suspicious_jumps(&sorted);
    Ok(NavQualityReport {
        points: sorted.len(),
        first_date: first,
        last_date: last,
        missing_nav_streak_days: missing_nav_streak_days(&sorted),
        suspicious_count: suspicious.len(),
        suspicious,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(date: &str, nav: Decimal) -> NavPoint {
        NavPoint {
            date: parse_nav_date(date).unwrap(),
            nav,
        }
    }

    #[test]
    fn test_parse_provider_date() {
        assert_eq!(
            parse_nav_date("09-02-2026").unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 9).unwrap()
        );
        assert!(parse_nav_date("2026-02-09").is_err());
        assert!(parse_nav_date("").is_err());
    }

    #[test]
    fn test_missing_streak_is_largest_gap() {
        let points = vec![
            p("01-01-2025", dec!(10)),
            p("20-01-2025", dec!(10.5)),
            p("02-01-2025", dec!(10.1)),
        ];
        assert_eq!(missing_nav_streak_days(&points), 18);
        assert_eq!(missing_nav_streak_days(&points[..1]), 0);
    }

    #[test]
    fn test_flags_jumps_beyond_thirty_percent() {
        let points = vec![
            p("01-01-2025", dec!(100)),
            p("02-01-2025", dec!(130)),
            p("03-01-2025", dec!(80)),
            p("06-01-2025", dec!(81)),
        ];
        let jumps = suspicious_jumps(&points);
        // +30% exactly is tolerated, 130 -> 80 is -38.46%
        assert_eq!(jumps.len(), 1);
        assert_eq!(jumps[0].from_nav, dec!(130));
        assert!(jumps[0].change_percent < dec!(-38));
    }

    #[test]
    fn test_report_summarises_series() {
        let points = vec![
            p("03-01-2025", dec!(10)),
            p("01-01-2025", dec!(10)),
            p("13-01-2025", dec!(20)),
        ];
        let report = assess_nav_quality(&points).unwrap();
        assert_eq!(report.points, 3);
        assert_eq!(report.first_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(report.missing_nav_streak_days, 10);
        assert_eq!(report.suspicious_count, 1);
    }

    #[test]
    fn test_empty_series_is_insufficient() {
        assert!(matches!(
            assess_nav_quality(&[]),
            Err(SipPlannerError::InsufficientData(_))
        ));
    }
}
