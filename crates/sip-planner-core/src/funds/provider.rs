use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SipPlannerError;
use crate::types::NavPoint;

/// One hit from a scheme search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSummary {
    pub scheme_id: String,
    pub name: String,
}

/// Scheme metadata returned alongside a NAV history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeMeta {
    pub scheme_id: String,
    pub scheme_name: String,
    #[serde(default)]
    pub fund_house: Option<String>,
    #[serde(default)]
    pub scheme_category: Option<String>,
}

/// Full NAV history for a scheme. Points may arrive in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavSeries {
    pub meta: SchemeMeta,
    pub points: Vec<NavPoint>,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("scheme not found: {0}")]
    NotFound(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl From<ProviderError> for SipPlannerError {
    fn from(e: ProviderError) -> Self {
        SipPlannerError::ProviderUnavailable(e.to_string())
    }
}

/// Source of mutual-fund NAV data.
///
/// Implementations own their transport, retries and timeouts. The core only
/// awaits these calls and never retries on its own.
#[async_trait]
pub trait NavDataProvider: Send + Sync {
    async fn search_funds(&self, query: &str) -> Result<Vec<SchemeSummary>, ProviderError>;

    async fn fetch_nav_series(&self, scheme_id: &str) -> Result<NavSeries, ProviderError>;

    async fn fetch_latest_nav(&self, scheme_id: &str) -> Result<NavPoint, ProviderError>;
}

#[async_trait]
impl<P: NavDataProvider + ?Sized> NavDataProvider for std::sync::Arc<P> {
    async fn search_funds(&self, query: &str) -> Result<Vec<SchemeSummary>, ProviderError> {
        (**self).search_funds(query).await
    }

    async fn fetch_nav_series(&self, scheme_id: &str) -> Result<NavSeries, ProviderError> {
        (**self).fetch_nav_series(scheme_id).await
    }

    async fn fetch_latest_nav(&self, scheme_id: &str) -> Result<NavPoint, ProviderError> {
        (**self).fetch_latest_nav(scheme_id).await
    }
}
