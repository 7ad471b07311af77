use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// All monetary values (INR). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as percentages (12 = 12% p.a.). Never as fractions.
pub type Percent = Decimal;

/// Fund category. Exactly one per fund, derived from the scheme name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum CategoryTag {
    LargeCap,
    MidCap,
    SmallCap,
    FlexiCap,
    #[serde(rename = "ELSS", alias = "Elss")]
    Elss,
    Debt,
    Hybrid,
    Index,
    Thematic,
    International,
    Other,
}

impl CategoryTag {
    pub const ALL: [CategoryTag; 11] = [
        CategoryTag::LargeCap,
        CategoryTag::MidCap,
        CategoryTag::SmallCap,
        CategoryTag::FlexiCap,
        CategoryTag::Elss,
        CategoryTag::Debt,
        CategoryTag::Hybrid,
        CategoryTag::Index,
        CategoryTag::Thematic,
        CategoryTag::International,
        CategoryTag::Other,
    ];

    /// Human-readable label, as used in scheme names and search queries.
    pub fn label(self) -> &'static str {
        match self {
            CategoryTag::LargeCap => "Large Cap",
            CategoryTag::MidCap => "Mid Cap",
            CategoryTag::SmallCap => "Small Cap",
            CategoryTag::FlexiCap => "Flexi Cap",
            CategoryTag::Elss => "ELSS",
            CategoryTag::Debt => "Debt",
            CategoryTag::Hybrid => "Hybrid",
            CategoryTag::Index => "Index",
            CategoryTag::Thematic => "Thematic",
            CategoryTag::International => "International",
            CategoryTag::Other => "Other",
        }
    }

    /// Equity-oriented categories, taxed under the LTCG rule.
    pub fn is_equity_like(self) -> bool {
        !matches!(self, CategoryTag::Debt | CategoryTag::Hybrid)
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "largecap" | "large" => Ok(CategoryTag::LargeCap),
            "midcap" | "mid" => Ok(CategoryTag::MidCap),
            "smallcap" | "small" => Ok(CategoryTag::SmallCap),
            "flexicap" | "flexi" | "multicap" => Ok(CategoryTag::FlexiCap),
            "elss" | "taxsaver" => Ok(CategoryTag::Elss),
            "debt" => Ok(CategoryTag::Debt),
            "hybrid" => Ok(CategoryTag::Hybrid),
            "index" => Ok(CategoryTag::Index),
            "thematic" | "sectoral" => Ok(CategoryTag::Thematic),
            "international" | "global" => Ok(CategoryTag::International),
            "other" => Ok(CategoryTag::Other),
            _ => Err(format!("Unknown fund category '{s}'")),
        }
    }
}

/// Risk label shown next to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    Low,
    Medium,
    #[serde(rename = "Medium-High")]
    MediumHigh,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

/// A single NAV observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: Decimal,
}

/// Data-quality flags attached to a fund's return figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnFlags {
    /// At least one horizon is missing and must be backfilled from a category default.
    pub is_estimated: bool,
    /// A matched historical NAV is more than the allowed gap away from its target date.
    pub is_approx: bool,
    /// Too young for a five-year CAGR.
    pub is_nfo: bool,
}

/// A resolved mutual fund with its latest NAV and trailing returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundRecord {
    pub scheme_id: String,
    pub name: String,
    pub category: CategoryTag,
    pub amc: String,
    pub nav_value: Decimal,
    pub nav_date: NaiveDate,
    pub cagr_1y: Option<Percent>,
    pub cagr_3y: Option<Percent>,
    pub cagr_5y: Option<Percent>,
    pub is_direct_plan: bool,
    pub is_growth_plan: bool,
    #[serde(default)]
    pub flags: ReturnFlags,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str_variants() {
        assert_eq!("Large Cap".parse::<CategoryTag>(), Ok(CategoryTag::LargeCap));
        assert_eq!("large-cap".parse::<CategoryTag>(), Ok(CategoryTag::LargeCap));
        assert_eq!("ELSS".parse::<CategoryTag>(), Ok(CategoryTag::Elss));
        assert_eq!("multi_cap".parse::<CategoryTag>(), Ok(CategoryTag::FlexiCap));
        assert!("crypto".parse::<CategoryTag>().is_err());
    }

    #[test]
    fn test_category_serde_uses_elss_name() {
        let json = serde_json::to_string(&CategoryTag::Elss).unwrap();
        assert_eq!(json, "\"ELSS\"");
        let back: CategoryTag = serde_json::from_str("\"ELSS\"").unwrap();
        assert_eq!(back, CategoryTag::Elss);
    }

    #[test]
    fn test_equity_like_excludes_debt_and_hybrid() {
        assert!(CategoryTag::LargeCap.is_equity_like());
        assert!(CategoryTag::International.is_equity_like());
        assert!(!CategoryTag::Debt.is_equity_like());
        assert!(!CategoryTag::Hybrid.is_equity_like());
    }
}
