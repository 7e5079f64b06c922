//! HTTP transport for the catalog API.

use std::fmt::Debug;
use std::str::FromStr;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::{CatalogClientError, parse_api_error};
use crate::mock::MockGuard;

/// Sends requests to the catalog and decodes the JSON responses.
///
/// Non-success statuses are returned as [CatalogClientError::APIError].
/// This trait enables alternate implementations, e.g. an in-process catalog
/// or canned responses in tests.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, CatalogClientError>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value, CatalogClientError>;
}

/// [Transport] over a pooled `reqwest` client.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,

    _mock_guard: Option<MockGuard>,
}

impl Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("mock", &self._mock_guard)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &CatalogClientConfig) -> Result<Self, CatalogClientError> {
        // create a mock server if configured
        let mock_guard = MockGuard::new(config);
        let effective_url = match mock_guard {
            Some(ref mock) => mock.url(),
            None => config.catalog_url.clone(),
        };
        Url::parse(&effective_url).map_err(CatalogClientError::InvalidUrl)?;

        Ok(Self {
            client: build_http_client(config)?,
            base_url: effective_url.trim_end_matches('/').to_string(),
            _mock_guard: mock_guard,
        })
    }

    fn url(&self, path: &str) -> Result<Url, CatalogClientError> {
        Url::parse(&format!("{}{path}", self.base_url)).map_err(CatalogClientError::InvalidUrl)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, CatalogClientError> {
        let response = request.send().await.map_err(CatalogClientError::Request)?;
        let status = response.status();
        let body = response.bytes().await.map_err(CatalogClientError::Request)?;
        debug!(%status, body_len = body.len(), "received catalog response");

        if !status.is_success() {
            return Err(parse_api_error(status, &body));
        }
        serde_json::from_slice(&body).map_err(CatalogClientError::InvalidPayload)
    }
}

impl Transport for HttpTransport {
    #[instrument(skip_all, fields(path = %path))]
    async fn get(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Value, CatalogClientError> {
        let url = self.url(path)?;
        debug!(%url, n_params = query.len(), "sending GET request");
        self.send(self.client.get(url).query(query)).await
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn post(&self, path: &str, body: &Value) -> Result<Value, CatalogClientError> {
        let url = self.url(path)?;
        debug!(%url, "sending POST request");
        self.send(self.client.post(url).json(body)).await
    }
}

fn invalid_header(err: impl std::fmt::Display) -> CatalogClientError {
    CatalogClientError::Other(format!("invalid header: {err}"))
}

/// Headers sent with every request: the bearer token, if any, followed by
/// the configured extra headers.
fn default_headers(config: &CatalogClientConfig) -> Result<HeaderMap, CatalogClientError> {
    let auth = config.token.as_ref().map(|token| {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(invalid_header)?;
        value.set_sensitive(true);
        Ok::<_, CatalogClientError>((header::AUTHORIZATION, value))
    });

    let extra = config.extra_headers.iter().map(|(name, value)| {
        Ok::<_, CatalogClientError>((
            HeaderName::from_str(name).map_err(invalid_header)?,
            HeaderValue::from_str(value).map_err(invalid_header)?,
        ))
    });

    auth.into_iter().chain(extra).collect()
}

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let headers = default_headers(config)?;
    debug!(
        catalog_url = %config.catalog_url,
        n_headers = headers.len(),
        timeout = ?config.timeout,
        accept_invalid_certs = config.accept_invalid_certs,
        "building catalog HTTP client"
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.accept_invalid_certs);
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }
    builder
        .build()
        .map_err(|e| CatalogClientError::Other(e.to_string()))
}
