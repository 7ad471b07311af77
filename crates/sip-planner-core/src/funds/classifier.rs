use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{CategoryTag, RiskLabel};

/// A single classification rule: the first rule whose pattern matches wins.
struct CategoryRule {
    pattern: Regex,
    tag: CategoryTag,
}

fn rule(pattern: &str, tag: CategoryTag) -> CategoryRule {
    CategoryRule {
        // Patterns are static literals exercised by the test suite.
        pattern: Regex::new(&format!("(?i){pattern}")).expect("valid category pattern"),
        tag,
    }
}

// Order is load-bearing: tax-saver before large cap, index and international
// before the market-cap buckets, debt before thematic ("Banking & PSU Debt"),
// mid cap before large cap ("Large & Mid Cap").
static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    vec![
        rule(r"\belss\b|tax\s*saver|tax\s*saving|long\s*term\s*equity", CategoryTag::Elss),
        rule(
            r"international|global|overseas|\bworld\b|\bus\s+(equity|bluechip)|nasdaq|s&p\s*500|\bfof\b.*\bus\b",
            CategoryTag::International,
        ),
        rule(r"\bindex\b|\bnifty\b|\bsensex\b|\betf\b", CategoryTag::Index),
        rule(
            r"\bdebt\b|\bbond\b|\bgilt\b|\bliquid\b|money\s*market|overnight|\bincome\b|credit\s*risk|duration|corporate|banking\s*(&|and)\s*psu\s*debt|floater|\bsavings\s+fund",
            CategoryTag::Debt,
        ),
        rule(
            r"hybrid|balanced|advantage|arbitrage|equity\s*savings|multi\s*asset|asset\s*allocation|aggressive",
            CategoryTag::Hybrid,
        ),
        rule(r"small\s*-?\s*cap", CategoryTag::SmallCap),
        rule(r"mid\s*-?\s*cap|emerging\s+equit", CategoryTag::MidCap),
        rule(r"large\s*-?\s*cap|blue\s*chip|top\s*100|\bfrontline\b", CategoryTag::LargeCap),
        rule(
            r"flexi\s*-?\s*cap|multi\s*-?\s*cap|\bfocused\b|diversified|value\s+fund|contra",
            CategoryTag::FlexiCap,
        ),
        rule(
            r"sectoral|thematic|infra|pharma|health\s*care|technology|\btech\b|digital|banking|financial\s+services|consumption|\bfmcg\b|\bpsu\b|manufacturing|energy|business\s+cycle|innovation|\besg\b",
            CategoryTag::Thematic,
        ),
    ]
});

/// Classify a scheme name into a category. Total: unmatched names are `Other`.
pub fn classify(fund_name: &str) -> CategoryTag {
    CATEGORY_RULES
        .iter()
        .find(|r| r.pattern.is_match(fund_name))
        .map(|r| r.tag)
        .unwrap_or(CategoryTag::Other)
}

const RISK_TABLE: &[(CategoryTag, RiskLabel)] = &[
    (CategoryTag::Debt, RiskLabel::Low),
    (CategoryTag::Hybrid, RiskLabel::Medium),
    (CategoryTag::LargeCap, RiskLabel::MediumHigh),
    (CategoryTag::Index, RiskLabel::MediumHigh),
    (CategoryTag::FlexiCap, RiskLabel::High),
    (CategoryTag::Elss, RiskLabel::High),
    (CategoryTag::MidCap, RiskLabel::High),
    (CategoryTag::International, RiskLabel::High),
    (CategoryTag::SmallCap, RiskLabel::VeryHigh),
    (CategoryTag::Thematic, RiskLabel::VeryHigh),
];

/// Riskometer label for a category; `Medium` for anything not in the table.
pub fn risk_tier(category: CategoryTag) -> RiskLabel {
    RISK_TABLE
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, r)| *r)
        .unwrap_or(RiskLabel::Medium)
}

// (lower-case needle, issuer). Short names are space-delimited to avoid
// matching inside words; longer names precede their prefixes.
const ISSUER_PATTERNS: &[(&str, &str)] = &[
    ("aditya birla", "Aditya Birla Sun Life"),
    ("icici", "ICICI Prudential"),
    ("hdfc", "HDFC"),
    (" sbi ", "SBI"),
    (" axis ", "Axis"),
    ("kotak", "Kotak Mahindra"),
    ("nippon", "Nippon India"),
    ("reliance", "Nippon India"),
    (" uti ", "UTI"),
    ("mirae", "Mirae Asset"),
    ("parag parikh", "PPFAS"),
    ("ppfas", "PPFAS"),
    (" quant ", "Quant"),
    (" dsp ", "DSP"),
    (" tata ", "Tata"),
    ("franklin", "Franklin Templeton"),
    ("motilal", "Motilal Oswal"),
    ("invesco", "Invesco"),
    ("canara robeco", "Canara Robeco"),
    ("edelweiss", "Edelweiss"),
    ("bandhan", "Bandhan"),
    ("idfc", "Bandhan"),
    (" hsbc ", "HSBC"),
    ("l&t", "HSBC"),
    ("sundaram", "Sundaram"),
    ("pgim", "PGIM India"),
    ("baroda bnp", "Baroda BNP Paribas"),
    ("mahindra manulife", "Mahindra Manulife"),
    (" navi ", "Navi"),
    ("zerodha", "Zerodha"),
];

/// Fund house behind a scheme name; `"Other"` when unknown.
pub fn extract_issuer(fund_name: &str) -> String {
    let lower = format!(" {} ", fund_name.to_lowercase().replace(['-', '(', ')'], " "));
    ISSUER_PATTERNS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, issuer)| (*issuer).to_string())
        .unwrap_or_else(|| "Other".to_string())
}

// MFAPI scheme categories look like "Equity Scheme - Large Cap Fund".
const SCHEME_CATEGORY_MAP: &[(&str, CategoryTag)] = &[
    ("elss", CategoryTag::Elss),
    ("large & mid cap", CategoryTag::MidCap),
    ("large cap", CategoryTag::LargeCap),
    ("mid cap", CategoryTag::MidCap),
    ("small cap", CategoryTag::SmallCap),
    ("flexi cap", CategoryTag::FlexiCap),
    ("multi cap", CategoryTag::FlexiCap),
    ("focused", CategoryTag::FlexiCap),
    ("value fund", CategoryTag::FlexiCap),
    ("index", CategoryTag::Index),
    ("etf", CategoryTag::Index),
    ("overseas", CategoryTag::International),
    ("sectoral", CategoryTag::Thematic),
    ("thematic", CategoryTag::Thematic),
    ("hybrid", CategoryTag::Hybrid),
    ("solution oriented", CategoryTag::Hybrid),
    ("debt", CategoryTag::Debt),
];

/// Map a provider-reported scheme category. `None` when nothing maps, so the
/// caller can fall back to name-based classification.
pub fn category_from_scheme_category(scheme_category: &str) -> Option<CategoryTag> {
    let lower = scheme_category.to_lowercase();
    SCHEME_CATEGORY_MAP
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, tag)| *tag)
}

pub fn is_direct_plan(fund_name: &str) -> bool {
    fund_name.to_lowercase().contains("direct")
}

pub fn is_growth_plan(fund_name: &str) -> bool {
    let lower = fund_name.to_lowercase();
    lower.contains("growth") && !lower.contains("idcw") && !lower.contains("dividend")
}
