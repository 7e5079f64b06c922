//! Configuration types for catalog client construction.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL of the catalog instance, e.g. `https://backstage.example.com`.
    pub catalog_url: String,
    /// Optional bearer token.
    pub token: Option<String>,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    pub user_agent: Option<String>,
    /// Total timeout of a single request.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Skip TLS certificate verification.
    ///
    /// Only meant for instances with self-signed certificates.
    pub accept_invalid_certs: bool,
    /// Mock mode for testing.
    pub mock_mode: CatalogMockMode,
}

impl CatalogClientConfig {
    pub fn new(catalog_url: impl Into<String>) -> Self {
        Self {
            catalog_url: catalog_url.into(),
            token: None,
            extra_headers: BTreeMap::new(),
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            accept_invalid_certs: false,
            mock_mode: CatalogMockMode::None,
        }
    }
}

/// Mock recording/replay mode for integration testing.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum CatalogMockMode {
    /// Use a real server without any mock recording or replaying.
    #[default]
    None,
    /// Proxy via a mock server and record interactions to a path.
    Record(PathBuf),
    /// Replay interactions from a path using a mock server.
    Replay(PathBuf),
}
