use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::SipPlannerError;
use crate::types::{CategoryTag, Percent};
use crate::SipResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskProfile {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskProfile::Low => "Low",
            RiskProfile::Medium => "Medium",
            RiskProfile::High => "High",
        };
        f.write_str(s)
    }
}

impl FromStr for RiskProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "conservative" => Ok(RiskProfile::Low),
            "medium" | "moderate" => Ok(RiskProfile::Medium),
            "high" | "aggressive" => Ok(RiskProfile::High),
            _ => Err(format!("Unknown risk profile '{s}' (expected low, medium or high)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub category: CategoryTag,
    pub percent: Percent,
}

fn entry(category: CategoryTag, percent: Decimal) -> AllocationEntry {
    AllocationEntry { category, percent }
}

/// Target weight per category, in insertion order.
///
/// Every entry is positive and the total never exceeds 100. Adjustment
/// shortfalls are not redistributed, so the total may fall below 100; see
/// `unallocated`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllocationTarget(Vec<AllocationEntry>);

impl AllocationTarget {
    pub fn entries(&self) -> &[AllocationEntry] {
        &self.0
    }

    pub fn get(&self, category: CategoryTag) -> Percent {
        self.0
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.percent)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn categories(&self) -> impl Iterator<Item = CategoryTag> + '_ {
        self.0.iter().map(|e| e.category)
    }

    pub fn total(&self) -> Percent {
        self.0.iter().map(|e| e.percent).sum()
    }

    /// Share of the budget no category claims.
    pub fn unallocated(&self) -> Percent {
        (dec!(100) - self.total()).max(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn add(&mut self, category: CategoryTag, amount: Percent) {
        match self.0.iter_mut().find(|e| e.category == category) {
            Some(e) => e.percent += amount,
            None => self.0.push(entry(category, amount)),
        }
    }

    /// Take up to `amount` from `category`, never below zero. Returns what was taken.
    fn take(&mut self, category: CategoryTag, amount: Percent) -> Percent {
        match self.0.iter_mut().find(|e| e.category == category) {
            Some(e) => {
                let taken = e.percent.min(amount).max(Decimal::ZERO);
                e.percent -= taken;
                taken
            }
            None => Decimal::ZERO,
        }
    }

    fn transfer(&mut self, from: CategoryTag, to: CategoryTag, amount: Percent) {
        let moved = self.take(from, amount);
        if moved > Decimal::ZERO {
            self.add(to, moved);
        }
    }

    fn drop_empty(&mut self) {
        self.0.retain(|e| e.percent > Decimal::ZERO);
    }
}

impl FromIterator<AllocationEntry> for AllocationTarget {
    fn from_iter<I: IntoIterator<Item = AllocationEntry>>(iter: I) -> Self {
        let mut target = AllocationTarget::default();
        for e in iter {
            target.add(e.category, e.percent);
        }
        target
    }
}

/// Base tables, bias thresholds and curated funds for the allocation engine.
///
/// Every field has a default, so a config file only needs the parts it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    pub low: Vec<AllocationEntry>,
    pub medium: Vec<AllocationEntry>,
    pub high: Vec<AllocationEntry>,
    /// Bias strictly below this tilts toward debt.
    pub conservative_bias_below: i32,
    /// Bias strictly above this tilts toward small cap.
    pub aggressive_bias_above: i32,
    pub style_shift: Percent,
    pub elss_from_debt: Percent,
    pub elss_from_largest: Percent,
    /// Scheme ids tried in order when resolving a category to a fund.
    pub candidates: BTreeMap<CategoryTag, Vec<String>>,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        use CategoryTag::*;
        Self {
            low: vec![entry(Debt, dec!(60)), entry(Hybrid, dec!(25)), entry(LargeCap, dec!(15))],
            medium: vec![
                entry(LargeCap, dec!(30)),
                entry(FlexiCap, dec!(20)),
                entry(MidCap, dec!(15)),
                entry(Hybrid, dec!(15)),
                entry(Debt, dec!(20)),
            ],
            high: vec![
                entry(LargeCap, dec!(20)),
                entry(MidCap, dec!(25)),
                entry(SmallCap, dec!(25)),
                entry(FlexiCap, dec!(20)),
                entry(Debt, dec!(10)),
            ],
            conservative_bias_below: 33,
            aggressive_bias_above: 66,
            style_shift: dec!(10),
            elss_from_debt: dec!(10),
            elss_from_largest: dec!(10),
            candidates: default_candidates(),
        }
    }
}

impl AllocationConfig {
    pub fn base_table(&self, risk: RiskProfile) -> &[AllocationEntry] {
        match risk {
            RiskProfile::Low => &self.low,
            RiskProfile::Medium => &self.medium,
            RiskProfile::High => &self.high,
        }
    }

    pub fn candidates_for(&self, category: CategoryTag) -> &[String] {
        self.candidates
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn validate(&self) -> SipResult<()> {
        for (name, table) in [("low", &self.low), ("medium", &self.medium), ("high", &self.high)] {
            if table.iter().any(|e| e.percent < Decimal::ZERO) {
                return Err(SipPlannerError::InvalidInput {
                    field: name.into(),
                    reason: "Base allocation percentages must be >= 0".into(),
                });
            }
            let total: Decimal = table.iter().map(|e| e.percent).sum();
            if total > dec!(100) {
                return Err(SipPlannerError::InvalidInput {
                    field: name.into(),
                    reason: format!("Base allocation sums to {total}%, above 100%"),
                });
            }
        }
        for (field, v) in [
            ("style_shift", self.style_shift),
            ("elss_from_debt", self.elss_from_debt),
            ("elss_from_largest", self.elss_from_largest),
        ] {
            if v < Decimal::ZERO {
                return Err(SipPlannerError::InvalidInput {
                    field: field.into(),
                    reason: "Adjustment amounts must be >= 0".into(),
                });
            }
        }
        Ok(())
    }
}

/// Popular direct-growth schemes, most preferred first.
///
/// First choices rotate across fund houses so the default medium and high
/// portfolios do not concentrate in one AMC.
pub fn default_candidates() -> BTreeMap<CategoryTag, Vec<String>> {
    let table: [(CategoryTag, &[&str]); 7] = [
        // ICICI Pru Bluechip, Axis Bluechip, HDFC Top 100
        (CategoryTag::LargeCap, &["120505", "120591", "119597"]),
        // Parag Parikh Flexi Cap, Quant Flexi Cap
        (CategoryTag::FlexiCap, &["122639", "145552"]),
        // Axis Midcap, HDFC Mid-Cap Opportunities
        (CategoryTag::MidCap, &["120593", "119598"]),
        // HDFC Small Cap, Axis Small Cap
        (CategoryTag::SmallCap, &["119555", "120594"]),
        // HDFC Balanced Advantage
        (CategoryTag::Hybrid, &["119551"]),
        // HDFC Corporate Bond
        (CategoryTag::Debt, &["118825"]),
        // HDFC Tax Saver
        (CategoryTag::Elss, &["119533"]),
    ];
    table
        .into_iter()
        .map(|(cat, ids)| (cat, ids.iter().map(|s| s.to_string()).collect()))
        .collect()
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// Target allocation using the built-in tables.
pub fn build_allocation(
    risk: RiskProfile,
    style_bias: i32,
    include_tax_saving: bool,
) -> SipResult<AllocationTarget> {
    build_allocation_with(&AllocationConfig::default(), risk, style_bias, include_tax_saving)
}

/// Target allocation for a risk profile.
///
/// 1. Start from the risk profile's base table.
/// 2. Style bias below the conservative threshold moves up to `style_shift`
///    from SmallCap to Debt; above the aggressive threshold moves it back.
/// 3. Tax saving carves ELSS out of Debt and the largest remaining category.
///
/// Each move transfers only what the source holds.
pub fn build_allocation_with(
    config: &AllocationConfig,
    risk: RiskProfile,
    style_bias: i32,
    include_tax_saving: bool,
) -> SipResult<AllocationTarget> {
    if !(0..=100).contains(&style_bias) {
        return Err(SipPlannerError::InvalidInput {
            field: "style_bias".into(),
            reason: format!("Style bias must be between 0 and 100, got {style_bias}"),
        });
    }
    config.validate()?;

    let mut target: AllocationTarget = config.base_table(risk).iter().copied().collect();

    if style_bias < config.conservative_bias_below {
        target.transfer(CategoryTag::SmallCap, CategoryTag::Debt, config.style_shift);
    } else if style_bias > config.aggressive_bias_above {
        target.transfer(CategoryTag::Debt, CategoryTag::SmallCap, config.style_shift);
    }

    if include_tax_saving {
        let from_debt = target.take(CategoryTag::Debt, config.elss_from_debt);
        let largest = target
            .entries()
            .iter()
            .filter(|e| !matches!(e.category, CategoryTag::Debt | CategoryTag::Elss))
            .filter(|e| e.percent > Decimal::ZERO)
            .max_by(|a, b| a.percent.cmp(&b.percent).then(b.category.cmp(&a.category)))
            .map(|e| e.category);
        let from_largest = largest
            .map(|cat| target.take(cat, config.elss_from_largest))
            .unwrap_or(Decimal::ZERO);
        let carved = from_debt + from_largest;
        if carved > Decimal::ZERO {
            target.add(CategoryTag::Elss, carved);
        }
    }

    target.drop_empty();
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn as_pairs(t: &AllocationTarget) -> Vec<(CategoryTag, Decimal)> {
        t.entries().iter().map(|e| (e.category, e.percent)).collect()
    }

    #[test]
    fn test_neutral_bias_returns_base_table() {
        let t = build_allocation(RiskProfile::Medium, 50, false).unwrap();
        assert_eq!(
            as_pairs(&t),
            vec![
                (CategoryTag::LargeCap, dec!(30)),
                (CategoryTag::FlexiCap, dec!(20)),
                (CategoryTag::MidCap, dec!(15)),
                (CategoryTag::Hybrid, dec!(15)),
                (CategoryTag::Debt, dec!(20)),
            ]
        );
        assert_eq!(t.total(), dec!(100));
    }

    #[test]
    fn test_conservative_bias_moves_small_cap_to_debt() {
        let t = build_allocation(RiskProfile::High, 10, false).unwrap();
        assert_eq!(t.get(CategoryTag::SmallCap), dec!(15));
        assert_eq!(t.get(CategoryTag::Debt), dec!(20));
        assert_eq!(t.total(), dec!(100));
    }

    #[test]
    fn test_conservative_bias_without_small_cap_is_noop() {
        let t = build_allocation(RiskProfile::Low, 0, false).unwrap();
        assert_eq!(t.get(CategoryTag::Debt), dec!(60));
        assert_eq!(t.total(), dec!(100));
    }

    #[test]
    fn test_aggressive_bias_moves_debt_to_small_cap() {
        let t = build_allocation(RiskProfile::Medium, 90, false).unwrap();
        assert_eq!(t.get(CategoryTag::Debt), dec!(10));
        assert_eq!(t.get(CategoryTag::SmallCap), dec!(10));
        assert_eq!(t.total(), dec!(100));
    }

    #[test]
    fn test_threshold_bounds_are_neutral() {
        for bias in [33, 66] {
            let t = build_allocation(RiskProfile::High, bias, false).unwrap();
            assert_eq!(t.get(CategoryTag::SmallCap), dec!(25));
        }
    }

    #[test]
    fn test_tax_saving_carves_twenty_percent_elss() {
        let t = build_allocation(RiskProfile::Medium, 50, true).unwrap();
        assert_eq!(t.get(CategoryTag::Elss), dec!(20));
        assert_eq!(t.get(CategoryTag::Debt), dec!(10));
        assert_eq!(t.get(CategoryTag::LargeCap), dec!(20));
        assert_eq!(t.total(), dec!(100));
    }

    #[test]
    fn test_tax_saving_tie_prefers_earlier_category() {
        // High: MidCap 25 and SmallCap 25 tie
        let t = build_allocation(RiskProfile::High, 50, true).unwrap();
        assert_eq!(t.get(CategoryTag::MidCap), dec!(15));
        assert_eq!(t.get(CategoryTag::SmallCap), dec!(25));
        assert_eq!(t.get(CategoryTag::Debt), Decimal::ZERO);
        assert!(!t.categories().any(|c| c == CategoryTag::Debt));
        assert_eq!(t.get(CategoryTag::Elss), dec!(20));
    }

    #[test]
    fn test_short_debt_shrinks_elss_without_going_negative() {
        // Aggressive bias drains High's 10% debt before the carve.
        let t = build_allocation(RiskProfile::High, 100, true).unwrap();
        assert_eq!(t.get(CategoryTag::Elss), dec!(10));
        assert_eq!(t.get(CategoryTag::SmallCap), dec!(25));
        assert!(t.entries().iter().all(|e| e.percent > Decimal::ZERO));
        assert_eq!(t.total(), dec!(100));
    }

    #[test]
    fn test_rejects_out_of_range_bias() {
        assert!(build_allocation(RiskProfile::Low, -1, false).is_err());
        assert!(build_allocation(RiskProfile::Low, 101, false).is_err());
    }

    #[test]
    fn test_custom_config_can_leave_remainder() {
        let config = AllocationConfig {
            low: vec![entry(CategoryTag::Debt, dec!(70))],
            ..AllocationConfig::default()
        };
        let t = build_allocation_with(&config, RiskProfile::Low, 50, false).unwrap();
        assert_eq!(t.unallocated(), dec!(30));
    }

    #[test]
    fn test_config_rejects_oversized_table() {
        let config = AllocationConfig {
            medium: vec![entry(CategoryTag::LargeCap, dec!(80)), entry(CategoryTag::Debt, dec!(30))],
            ..AllocationConfig::default()
        };
        assert!(build_allocation_with(&config, RiskProfile::Medium, 50, false).is_err());
    }

    #[test]
    fn test_config_deserialises_partial_yaml_like_json() {
        let config: AllocationConfig =
            serde_json::from_str(r#"{"style_shift": "5", "candidates": {"Debt": ["1"]}}"#).unwrap();
        assert_eq!(config.style_shift, dec!(5));
        assert_eq!(config.candidates_for(CategoryTag::Debt), ["1".to_string()]);
        assert!(config.candidates_for(CategoryTag::LargeCap).is_empty());
        assert_eq!(config.medium.len(), 5);
    }

    #[test]
    fn test_default_first_choices_spread_across_fund_houses() {
        let houses: BTreeMap<&str, &str> = [
            ("120505", "ICICI Prudential"),
            ("120591", "Axis"),
            ("119597", "HDFC"),
            ("122639", "PPFAS"),
            ("145552", "Quant"),
            ("120593", "Axis"),
            ("119598", "HDFC"),
            ("119555", "HDFC"),
            ("120594", "Axis"),
            ("119551", "HDFC"),
            ("118825", "HDFC"),
            ("119533", "HDFC"),
        ]
        .into_iter()
        .collect();
        let config = AllocationConfig::default();

        for risk in [RiskProfile::Medium, RiskProfile::High] {
            let target = build_allocation(risk, 50, false).unwrap();
            let mut share: BTreeMap<&str, Decimal> = BTreeMap::new();
            for e in target.entries() {
                let first = &config.candidates_for(e.category)[0];
                *share.entry(houses[first.as_str()]).or_default() += e.percent;
            }
            let (house, top) = share.iter().max_by_key(|(_, p)| **p).unwrap();
            assert!(*top <= dec!(50), "{risk}: {house} holds {top}%");
        }
    }

    #[test]
    fn test_risk_profile_parses_aliases() {
        assert_eq!("Moderate".parse::<RiskProfile>(), Ok(RiskProfile::Medium));
        assert_eq!("HIGH".parse::<RiskProfile>(), Ok(RiskProfile::High));
        assert!("yolo".parse::<RiskProfile>().is_err());
    }
}
