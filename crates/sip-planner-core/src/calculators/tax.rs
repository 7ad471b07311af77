use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryTag, Money};

/// Long-term capital gains exempt each year on equity-oriented funds.
pub const EQUITY_LTCG_EXEMPTION: Money = dec!(125000);
/// Flat LTCG rate on equity gains above the exemption.
pub const EQUITY_LTCG_RATE: Decimal = dec!(0.125);
/// Top income-slab approximation for debt fund gains (not an exact slab computation).
pub const DEBT_SLAB_RATE: Decimal = dec!(0.30);
/// Heuristic midpoint for hybrid fund gains.
pub const HYBRID_BLENDED_RATE: Decimal = dec!(0.20);

/// The three capital-gains rules. A simplification of Indian tax law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxRule {
    EquityLtcg,
    DebtSlab,
    HybridBlended,
}

impl TaxRule {
    pub fn for_category(category: CategoryTag) -> Self {
        match category {
            CategoryTag::Debt => TaxRule::DebtSlab,
            CategoryTag::Hybrid => TaxRule::HybridBlended,
            _ => TaxRule::EquityLtcg,
        }
    }

    pub fn exemption(self) -> Money {
        match self {
            TaxRule::EquityLtcg => EQUITY_LTCG_EXEMPTION,
            TaxRule::DebtSlab | TaxRule::HybridBlended => Decimal::ZERO,
        }
    }

    pub fn rate(self) -> Decimal {
        match self {
            TaxRule::EquityLtcg => EQUITY_LTCG_RATE,
            TaxRule::DebtSlab => DEBT_SLAB_RATE,
            TaxRule::HybridBlended => HYBRID_BLENDED_RATE,
        }
    }
}

/// Itemised tax computation for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub category: CategoryTag,
    pub rule: TaxRule,
    pub gains: Money,
    pub exempt_amount: Money,
    pub taxable_gains: Money,
    pub rate: Decimal,
    pub tax: Money,
    pub post_tax_gains: Money,
}

pub fn tax_breakdown(gains: Money, category: CategoryTag) -> TaxBreakdown {
    let rule = TaxRule::for_category(category);
    let positive_gains = gains.max(Decimal::ZERO);
    let exempt_amount = positive_gains.min(rule.exemption());
    let taxable_gains = positive_gains - exempt_amount;
    let tax = taxable_gains * rule.rate();

    TaxBreakdown {
        category,
        rule,
        gains,
        exempt_amount,
        taxable_gains,
        rate: rule.rate(),
        tax,
        post_tax_gains: gains - tax,
    }
}

/// Capital-gains tax owed on `gains` for a fund of `category`. Losses owe nothing.
pub fn tax_on_gains(gains: Money, category: CategoryTag) -> Money {
    tax_breakdown(gains, category).tax
}
