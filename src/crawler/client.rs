//! HTTP request capability
//!
//! The engine talks to the network through the [`RequestClient`] trait only,
//! so the transport is fully substitutable (tests swap in stub clients).
//! [`HttpClient`] is the reqwest-backed implementation; it binds the
//! normalized request configuration once at construction and reuses it for
//! every fetch during the crawl.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use url::Url;

use crate::config::RequestConfig;
use crate::{ConfigError, FetchError};

/// User agent sent when the request configuration does not provide one.
const DEFAULT_USER_AGENT: &str = concat!("sitegrab/", env!("CARGO_PKG_VERSION"));

/// Response surface consumed by the engine
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl FetchedResponse {
    /// Content-Type header value, empty when absent.
    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Capability executing one HTTP GET per call
#[async_trait]
pub trait RequestClient: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, FetchError>;
}

/// reqwest-backed [`RequestClient`]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Binds `config` into a reusable client.
    ///
    /// Headers were validated during configuration normalization, so a
    /// failure here means the configuration was constructed by hand with
    /// invalid values.
    pub fn new(config: &RequestConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                    name: name.clone(),
                    message: e.to_string(),
                })?;
            let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                name: name.as_str().to_string(),
                message: e.to_string(),
            })?;
            headers.insert(name, value);
        }

        if !headers.contains_key(USER_AGENT) {
            headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .redirect(Policy::limited(config.redirect_limit))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RequestClient for HttpClient {
    async fn fetch(&self, url: &Url) -> Result<FetchedResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| classify(url, e))?
            .to_vec();

        Ok(FetchedResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

fn classify(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_headers(headers: BTreeMap<String, String>) -> RequestConfig {
        RequestConfig {
            headers,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            redirect_limit: 10,
        }
    }

    #[test]
    fn builds_client_from_default_config() {
        let config = config_with_headers(BTreeMap::new());
        assert!(HttpClient::new(&config).is_ok());
    }

    #[test]
    fn builds_client_with_custom_headers() {
        let config = config_with_headers(BTreeMap::from([(
            "x-crawl-token".to_string(),
            "abc123".to_string(),
        )]));
        assert!(HttpClient::new(&config).is_ok());
    }

    #[test]
    fn rejects_invalid_header_name() {
        let config = config_with_headers(BTreeMap::from([(
            "bad header".to_string(),
            "value".to_string(),
        )]));
        assert!(matches!(
            HttpClient::new(&config),
            Err(ConfigError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn content_type_reads_header() {
        let response = FetchedResponse {
            status: 200,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "text/html; charset=utf-8".to_string(),
            )]),
            body: Vec::new(),
        };
        assert_eq!(response.content_type(), "text/html; charset=utf-8");

        let empty = FetchedResponse {
            status: 200,
            headers: BTreeMap::new(),
            body: Vec::new(),
        };
        assert_eq!(empty.content_type(), "");
    }
}
