use serde::{Deserialize, Serialize};

use crate::funds::classifier::{classify, is_direct_plan, is_growth_plan};
use crate::funds::provider::{NavDataProvider, SchemeSummary};
use crate::funds::records::fetch_fund_record;
use crate::types::{CategoryTag, FundRecord};

/// One way of turning a category into a concrete fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Fetch a curated scheme by id.
    Direct { scheme_id: String },
    /// Free-text search, filtered to the category.
    Search { query: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Resolved { scheme_id: String },
    /// Fund is too young for a five-year record and NFOs were excluded.
    SkippedNfo { scheme_id: String },
    /// Search hit whose fund record landed in another category.
    WrongCategory { scheme_id: String, category: CategoryTag },
    NoMatch,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionAttempt {
    pub strategy: ResolutionStrategy,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionOptions {
    pub include_nfo: bool,
    /// Search hits fetched before the search strategy gives up.
    pub max_search_candidates: usize,
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self {
            include_nfo: false,
            max_search_candidates: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResolution {
    pub category: CategoryTag,
    /// `None` when every strategy failed; the category is unfulfilled.
    pub fund: Option<FundRecord>,
    pub attempts: Vec<ResolutionAttempt>,
}

impl CategoryResolution {
    pub fn is_fulfilled(&self) -> bool {
        self.fund.is_some()
    }
}

/// Strategies tried for a category: curated ids in order, then one search.
pub fn resolution_plan(category: CategoryTag, candidates: &[String]) -> Vec<ResolutionStrategy> {
    candidates
        .iter()
        .map(|id| ResolutionStrategy::Direct {
            scheme_id: id.clone(),
        })
        .chain(std::iter::once(ResolutionStrategy::Search {
            query: category.label().to_string(),
        }))
        .collect()
}

/// Search hits in the requested category, direct growth plans first.
fn rank_search_hits(category: CategoryTag, hits: Vec<SchemeSummary>) -> Vec<SchemeSummary> {
    let mut matching: Vec<SchemeSummary> = hits
        .into_iter()
        .filter(|h| classify(&h.name) == category)
        .collect();
    // stable: provider order is kept within each group
    matching.sort_by_key(|h| !(is_direct_plan(&h.name) && is_growth_plan(&h.name)));
    matching
}

async fn try_scheme<P>(provider: &P, scheme_id: &str, options: &ResolutionOptions) -> (AttemptOutcome, Option<FundRecord>)
where
    P: NavDataProvider + ?Sized,
{
    match fetch_fund_record(provider, scheme_id).await {
        Ok(record) if record.flags.is_nfo && !options.include_nfo => (
            AttemptOutcome::SkippedNfo {
                scheme_id: scheme_id.to_string(),
            },
            None,
        ),
        Ok(record) => (
            AttemptOutcome::Resolved {
                scheme_id: record.scheme_id.clone(),
            },
            Some(record),
        ),
        Err(e) => (
            AttemptOutcome::Failed {
                reason: e.to_string(),
            },
            None,
        ),
    }
}

async fn run_strategy<P>(
    provider: &P,
    category: CategoryTag,
    strategy: &ResolutionStrategy,
    options: &ResolutionOptions,
) -> (AttemptOutcome, Option<FundRecord>)
where
    P: NavDataProvider + ?Sized,
{
    match strategy {
        ResolutionStrategy::Direct { scheme_id } => try_scheme(provider, scheme_id, options).await,
        ResolutionStrategy::Search { query } => {
            let hits = match provider.search_funds(query).await {
                Ok(hits) => hits,
                Err(e) => {
                    return (
                        AttemptOutcome::Failed {
                            reason: e.to_string(),
                        },
                        None,
                    )
                }
            };

            let mut last = AttemptOutcome::NoMatch;
            for hit in rank_search_hits(category, hits)
                .into_iter()
                .take(options.max_search_candidates)
            {
                let (outcome, fund) = try_scheme(provider, &hit.scheme_id, options).await;
                match fund {
                    // name matched, but the record's category (provider first) decides
                    Some(record) if record.category != category => {
                        last = AttemptOutcome::WrongCategory {
                            scheme_id: record.scheme_id,
                            category: record.category,
                        };
                    }
                    Some(record) => return (outcome, Some(record)),
                    None => last = outcome,
                }
            }
            (last, None)
        }
    }
}

/// Resolve a category to a fund by trying each strategy in order.
///
/// Never fails: a category nothing resolves comes back with `fund: None`
/// and the full attempt log.
pub async fn resolve_category_to_fund<P>(
    provider: &P,
    category: CategoryTag,
    candidates: &[String],
    options: &ResolutionOptions,
) -> CategoryResolution
where
    P: NavDataProvider + ?Sized,
{
    let mut attempts = Vec::new();

    for strategy in resolution_plan(category, candidates) {
        let (outcome, fund) = run_strategy(provider, category, &strategy, options).await;
        tracing::debug!(%category, ?strategy, ?outcome, "resolution attempt");
        attempts.push(ResolutionAttempt { strategy, outcome });
        if fund.is_some() {
            return CategoryResolution {
                category,
                fund,
                attempts,
            };
        }
    }

    tracing::warn!(%category, attempts = attempts.len(), "category unfulfilled");
    CategoryResolution {
        category,
        fund: None,
        attempts,
    }
}
