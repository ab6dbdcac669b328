#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;

use crate::core::fetch::PageRequest;
use crate::core::http::{HttpSettings, RetryPolicy};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    parse_number, validate_non_empty_list, validate_non_empty_string, validate_url, Validate,
};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://fakeapi.net";
pub const DEFAULT_TABLE_ENDPOINTS: &str = "/products,/users,/orders,/reviews";
pub const DEFAULT_S3_PREFIX: &str = "fake_ecom/raw";
pub const DEFAULT_PAGE_PARAM: &str = "page";
pub const DEFAULT_PAGE_SIZE_PARAM: &str = "limit";

/// Everything one ingestion run needs to know.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub bucket_name: String,
    pub base_url: String,
    pub endpoints: Vec<String>,
    pub s3_prefix: String,
    pub page_param: String,
    pub start_page: u64,
    pub page_size_param: String,
    pub page_size: u64,
    pub max_pages: u64,
    pub http: HttpSettings,
    pub s3_region: Option<String>,
}

impl IngestConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any name -> value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let bucket_name = lookup("BUCKET_NAME")
            .filter(|bucket| !bucket.trim().is_empty())
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "BUCKET_NAME".to_string(),
            })?;

        let defaults = HttpSettings::default();
        let timeout_secs = parse_number(
            "HTTP_TIMEOUT_SECONDS",
            lookup("HTTP_TIMEOUT_SECONDS").as_deref(),
            defaults.timeout.as_secs(),
        )?;
        let retries = parse_number(
            "HTTP_RETRIES",
            lookup("HTTP_RETRIES").as_deref(),
            defaults.retry.retries,
        )?;
        let backoff_ms = parse_number(
            "HTTP_BACKOFF_MS",
            lookup("HTTP_BACKOFF_MS").as_deref(),
            defaults.retry.backoff.as_millis() as u64,
        )?;

        Ok(Self {
            bucket_name,
            base_url: text("BASE_URL", DEFAULT_BASE_URL),
            endpoints: split_endpoints(&text("TABLE_ENDPOINTS", DEFAULT_TABLE_ENDPOINTS)),
            s3_prefix: text("S3_PREFIX", DEFAULT_S3_PREFIX),
            page_param: text("PAGE_PARAM", DEFAULT_PAGE_PARAM),
            start_page: parse_number("START_PAGE", lookup("START_PAGE").as_deref(), 1)?,
            page_size_param: text("PAGE_SIZE_PARAM", DEFAULT_PAGE_SIZE_PARAM),
            page_size: parse_number("PAGE_SIZE", lookup("PAGE_SIZE").as_deref(), 100)?,
            max_pages: parse_number("MAX_PAGES", lookup("MAX_PAGES").as_deref(), 0)?,
            http: HttpSettings {
                timeout: Duration::from_secs(timeout_secs),
                retry: RetryPolicy {
                    retries,
                    backoff: Duration::from_millis(backoff_ms),
                },
                headers: Default::default(),
            },
            s3_region: lookup("S3_REGION").filter(|region| !region.trim().is_empty()),
        })
    }

    /// Paging parameters for one configured endpoint.
    pub fn page_request(&self, endpoint: &str) -> PageRequest {
        PageRequest {
            base_url: self.base_url.clone(),
            endpoint: endpoint.to_string(),
            page_param: self.page_param.clone(),
            start_page: self.start_page,
            page_size_param: self.page_size_param.clone(),
            page_size: self.page_size,
            max_pages: self.max_pages,
        }
    }
}

impl Validate for IngestConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("BUCKET_NAME", &self.bucket_name)?;
        validate_url("BASE_URL", &self.base_url)?;
        validate_non_empty_list("TABLE_ENDPOINTS", &self.endpoints)?;

        tracing::debug!("Configuration validation passed");
        Ok(())
    }
}

/// Comma-separated endpoint paths, trimmed, empties dropped.
pub fn split_endpoints(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = IngestConfig::from_lookup(lookup_from(&[("BUCKET_NAME", "landing")])).unwrap();

        assert_eq!(config.bucket_name, "landing");
        assert_eq!(config.base_url, "https://fakeapi.net");
        assert_eq!(
            config.endpoints,
            vec!["/products", "/users", "/orders", "/reviews"]
        );
        assert_eq!(config.s3_prefix, "fake_ecom/raw");
        assert_eq!(config.page_param, "page");
        assert_eq!(config.start_page, 1);
        assert_eq!(config.page_size_param, "limit");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_pages, 0);
        assert_eq!(config.http.timeout, Duration::from_secs(30));
        assert_eq!(config.http.retry, RetryPolicy::default());
        assert!(config.s3_region.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_bucket_is_fatal() {
        for vars in [vec![], vec![("BUCKET_NAME", "  ")]] {
            let result = IngestConfig::from_lookup(lookup_from(&vars));
            assert!(matches!(result, Err(EtlError::MissingConfigError { ref field }) if field == "BUCKET_NAME"));
        }
    }

    #[test]
    fn test_overrides() {
        let config = IngestConfig::from_lookup(lookup_from(&[
            ("BUCKET_NAME", "landing"),
            ("BASE_URL", "http://localhost:9000/api"),
            ("TABLE_ENDPOINTS", " /v2/Items/ , ,/users"),
            ("PAGE_PARAM", ""),
            ("MAX_PAGES", "3"),
            ("HTTP_RETRIES", "1"),
            ("HTTP_BACKOFF_MS", "20"),
            ("S3_REGION", "ap-southeast-2"),
        ]))
        .unwrap();

        assert_eq!(config.endpoints, vec!["/v2/Items/", "/users"]);
        assert_eq!(config.page_param, "");
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.http.retry.retries, 1);
        assert_eq!(config.http.retry.backoff, Duration::from_millis(20));
        assert_eq!(config.s3_region.as_deref(), Some("ap-southeast-2"));

        let request = config.page_request("/users");
        assert_eq!(request.page_url(1), "http://localhost:9000/api/users?limit=100");
    }

    #[test]
    fn test_bad_number_is_rejected() {
        let result = IngestConfig::from_lookup(lookup_from(&[
            ("BUCKET_NAME", "landing"),
            ("PAGE_SIZE", "a hundred"),
        ]));
        assert!(matches!(
            result,
            Err(EtlError::InvalidConfigValueError { ref field, .. }) if field == "PAGE_SIZE"
        ));
    }

    #[test]
    fn test_validation_rejects_bad_base_url_and_empty_endpoints() {
        let mut config =
            IngestConfig::from_lookup(lookup_from(&[("BUCKET_NAME", "landing")])).unwrap();
        config.base_url = "fakeapi.net".to_string();
        assert!(config.validate().is_err());

        config.base_url = DEFAULT_BASE_URL.to_string();
        config.endpoints = split_endpoints(" , ");
        assert!(config.validate().is_err());
    }
}
