use std::time::Duration;

use sip_planner_core::funds::cache::{CachedNavProvider, DEFAULT_TTL_HOURS};
use sip_planner_core::funds::mfapi::{MfApiProvider, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Runtime settings read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mfapi_url: String,
    pub cache_ttl_hours: i64,
    pub http_timeout_secs: u64,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            mfapi_url: std::env::var("SIPCALC_MFAPI_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            cache_ttl_hours: std::env::var("SIPCALC_CACHE_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_HOURS),
            http_timeout_secs: std::env::var("SIPCALC_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            // stdout carries results, so only warnings and errors by default
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.mfapi_url.starts_with("http://") && !self.mfapi_url.starts_with("https://") {
            return Err(format!(
                "SIPCALC_MFAPI_URL must be an http(s) URL, got '{}'",
                self.mfapi_url
            ));
        }
        if self.cache_ttl_hours <= 0 {
            return Err("SIPCALC_CACHE_TTL_HOURS must be > 0".to_string());
        }
        if self.http_timeout_secs == 0 {
            return Err("SIPCALC_HTTP_TIMEOUT_SECS must be > 0".to_string());
        }
        Ok(())
    }

    /// MFAPI client behind a TTL cache.
    pub fn provider(&self) -> Result<CachedNavProvider<MfApiProvider>, Box<dyn std::error::Error>> {
        self.validate()?;
        tracing::debug!(url = %self.mfapi_url, ttl_hours = self.cache_ttl_hours, "building NAV provider");
        let client = MfApiProvider::new(&self.mfapi_url, Duration::from_secs(self.http_timeout_secs))?;
        Ok(CachedNavProvider::with_ttl(
            client,
            chrono::Duration::hours(self.cache_ttl_hours),
        ))
    }

    /// Single-use runtime for the online commands.
    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
        Ok(tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            mfapi_url: DEFAULT_BASE_URL.to_string(),
            cache_ttl_hours: 24,
            http_timeout_secs: 30,
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let c = AppConfig {
            mfapi_url: "ftp://example".to_string(),
            ..config()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_ttl() {
        let c = AppConfig {
            cache_ttl_hours: 0,
            ..config()
        };
        assert!(c.validate().is_err());
    }
}
