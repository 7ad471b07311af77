use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::funds::provider::{NavDataProvider, NavSeries, ProviderError, SchemeMeta, SchemeSummary};
use crate::funds::quality::parse_nav_date;
use crate::types::NavPoint;

pub const DEFAULT_BASE_URL: &str = "https://api.mfapi.in";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Client for the public mfapi.in NAV service.
///
/// Transient failures (network errors, 429, 5xx) are retried with
/// exponential backoff starting at one second. A 404 is final.
pub struct MfApiProvider {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl MfApiProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sip-planner/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs(1),
        })
    }

    pub fn with_defaults() -> Result<Self, ProviderError> {
        Self::new(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_retry(mut self, max_attempts: u32, initial_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// Delay before retry `attempt` (1-based): the initial backoff, doubled each time.
    fn backoff_before(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = ProviderError::Network("no attempt made".into());

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let wait = self.backoff_before(attempt);
                tracing::warn!(%url, attempt, wait_ms = wait.as_millis() as u64, error = %last_error, "retrying MFAPI request");
                tokio::time::sleep(wait).await;
            }

            let resp = match self.client.get(&url).query(query).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = ProviderError::Network(e.to_string());
                    continue;
                }
            };

            let status = resp.status();
            if status == StatusCode::NOT_FOUND {
                return Err(ProviderError::NotFound(path.to_string()));
            }
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = ProviderError::BadResponse(format!("HTTP {status}"));
                continue;
            }
            if !status.is_success() {
                return Err(ProviderError::BadResponse(format!("HTTP {status}")));
            }

            return resp
                .json::<T>()
                .await
                .map_err(|e| ProviderError::Parse(e.to_string()));
        }

        Err(last_error)
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MfApiSearchHit {
    #[serde(rename = "schemeCode")]
    scheme_code: serde_json::Value,
    #[serde(rename = "schemeName")]
    scheme_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct MfApiMeta {
    #[serde(default)]
    fund_house: Option<String>,
    #[serde(default)]
    scheme_category: Option<String>,
    #[serde(default)]
    scheme_code: Option<serde_json::Value>,
    #[serde(default)]
    scheme_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MfApiNav {
    date: String,
    nav: String,
}

#[derive(Debug, Deserialize)]
struct MfApiSchemeResponse {
    #[serde(default)]
    meta: MfApiMeta,
    #[serde(default)]
    data: Vec<MfApiNav>,
}

/// Scheme codes arrive as numbers from search and as numbers or strings in meta.
fn code_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse NAV rows, skipping malformed ones.
fn parse_points(scheme_id: &str, rows: Vec<MfApiNav>) -> Vec<NavPoint> {
    let total = rows.len();
    let points: Vec<NavPoint> = rows
        .into_iter()
        .filter_map(|row| {
            let date = parse_nav_date(&row.date).ok()?;
            let nav = Decimal::from_str(row.nav.trim()).ok()?;
            Some(NavPoint { date, nav })
        })
        .collect();

    if points.len() < total {
        tracing::warn!(
            scheme_id,
            skipped = total - points.len(),
            "skipped malformed NAV rows"
        );
    }
    points
}

fn into_series(scheme_id: &str, body: MfApiSchemeResponse) -> Result<NavSeries, ProviderError> {
    let Some(scheme_name) = body.meta.scheme_name.filter(|n| !n.trim().is_empty()) else {
        return Err(ProviderError::NotFound(scheme_id.to_string()));
    };

    Ok(NavSeries {
        meta: SchemeMeta {
            scheme_id: body
                .meta
                .scheme_code
                .as_ref()
                .map(code_to_string)
                .unwrap_or_else(|| scheme_id.to_string()),
            scheme_name,
            fund_house: body.meta.fund_house,
            scheme_category: body.meta.scheme_category,
        },
        points: parse_points(scheme_id, body.data),
    })
}

#[async_trait]
impl NavDataProvider for MfApiProvider {
    async fn search_funds(&self, query: &str) -> Result<Vec<SchemeSummary>, ProviderError> {
        let hits: Vec<MfApiSearchHit> = self.get_json("/mf/search", &[("q", query)]).await?;
        Ok(hits
            .into_iter()
            .map(|h| SchemeSummary {
                scheme_id: code_to_string(&h.scheme_code),
                name: h.scheme_name,
            })
            .collect())
    }

    async fn fetch_nav_series(&self, scheme_id: &str) -> Result<NavSeries, ProviderError> {
        let body: MfApiSchemeResponse = self.get_json(&format!("/mf/{scheme_id}"), &[]).await?;
        let series = into_series(scheme_id, body)?;
        tracing::debug!(scheme_id, points = series.points.len(), "fetched NAV history");
        Ok(series)
    }

    async fn fetch_latest_nav(&self, scheme_id: &str) -> Result<NavPoint, ProviderError> {
        let body: MfApiSchemeResponse = self
            .get_json(&format!("/mf/{scheme_id}/latest"), &[])
            .await?;
        let series = into_series(scheme_id, body)?;
        series
            .points
            .into_iter()
            .max_by_key(|p| p.date)
            .ok_or_else(|| ProviderError::BadResponse(format!("no NAV for scheme {scheme_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const SCHEME_JSON: &str = r#"{
        "meta": {
            "fund_house": "Axis Mutual Fund",
            "scheme_type": "Open Ended Schemes",
            "scheme_category": "Equity Scheme - Large Cap Fund",
            "scheme_code": 120465,
            "scheme_name": "Axis Bluechip Fund - Direct Plan - Growth"
        },
        "data": [
            {"date": "09-02-2026", "nav": "61.23000"},
            {"date": "bad", "nav": "60.1"},
            {"date": "06-02-2026", "nav": "not-a-number"},
            {"date": "05-02-2026", "nav": "60.90000"}
        ],
        "status": "SUCCESS"
    }"#;

    #[test]
    fn test_parses_scheme_response_and_skips_bad_rows() {
        let body: MfApiSchemeResponse = serde_json::from_str(SCHEME_JSON).unwrap();
        let series = into_series("120465", body).unwrap();
        assert_eq!(series.meta.scheme_id, "120465");
        assert_eq!(series.meta.fund_house.as_deref(), Some("Axis Mutual Fund"));
        assert_eq!(series.points.len(), 2);
        assert_eq!(
            series.points[0],
            NavPoint {
                date: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
                nav: dec!(61.23000),
            }
        );
    }

    #[test]
    fn test_empty_meta_is_not_found() {
        let body: MfApiSchemeResponse =
            serde_json::from_str(r#"{"meta": {}, "data": [], "status": "SUCCESS"}"#).unwrap();
        assert!(matches!(
            into_series("999999", body),
            Err(ProviderError::NotFound(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Retry behaviour against a local HTTP stub
    // -----------------------------------------------------------------------

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const SEARCH_JSON: &str =
        r#"[{"schemeCode": 119597, "schemeName": "SBI Bluechip Fund - Direct Plan - Growth"}]"#;

    /// Serve `script` one response per connection; the last entry repeats.
    async fn stub_server(script: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            let mut script = script.into_iter();
            let mut last = None;
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = match script.next().or(last) {
                    Some(step) => step,
                    None => break,
                };
                last = Some((status, body));

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    503 => "Service Unavailable",
                    _ => "Status",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}"), hits)
    }

    fn stub_client(base_url: &str) -> MfApiProvider {
        MfApiProvider::new(base_url, Duration::from_secs(5))
            .unwrap()
            .with_retry(3, Duration::ZERO)
    }

    #[test]
    fn test_default_backoff_is_one_then_two_seconds() {
        let client = MfApiProvider::with_defaults().unwrap();
        assert_eq!(client.max_attempts, 3);
        assert_eq!(client.backoff_before(1), Duration::from_secs(1));
        assert_eq!(client.backoff_before(2), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_success() {
        let (url, hits) = stub_server(vec![(503, "{}"), (503, "{}"), (200, SEARCH_JSON)]).await;
        let hits_found = stub_client(&url).search_funds("bluechip").await.unwrap();
        assert_eq!(hits_found.len(), 1);
        assert_eq!(hits_found[0].scheme_id, "119597");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_never_retried() {
        let (url, hits) = stub_server(vec![(404, "{}")]).await;
        let err = stub_client(&url).fetch_nav_series("999999").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_last_error() {
        let (url, hits) = stub_server(vec![(503, "{}")]).await;
        let err = stub_client(&url).search_funds("bluechip").await.unwrap_err();
        match err {
            ProviderError::BadResponse(msg) => assert!(msg.contains("503"), "got {msg}"),
            other => panic!("expected BadResponse, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_search_hit_codes_become_strings() {
        let hits: Vec<MfApiSearchHit> = serde_json::from_str(
            r#"[{"schemeCode": 119597, "schemeName": "SBI Bluechip Fund - Direct Plan - Growth"}]"#,
        )
        .unwrap();
        assert_eq!(code_to_string(&hits[0].scheme_code), "119597");
    }
}
