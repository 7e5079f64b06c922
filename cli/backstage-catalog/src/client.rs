//! Catalog client exposing entity search and lookup.

use std::fmt::Debug;

use futures::stream::Stream;
use tracing::{debug, instrument};

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::lookup::LookupRoute;
use crate::pagination::paginate;
use crate::params::{LookupParams, SearchQuery};
use crate::shape::{Resolved, lookup_candidates, query_candidates, resolve};
use crate::transport::{HttpTransport, Transport};
use crate::types::{LookupResponse, QueryEntitiesResponse};

pub(crate) const BY_QUERY_PATH: &str = "/api/catalog/entities/by-query";

pub type SearchResponse = Resolved<QueryEntitiesResponse>;
pub type LookupResult = Resolved<LookupResponse>;

/// A client for the catalog service.
///
/// Owns the transport for its whole lifetime; [CatalogClient::close] or
/// dropping the client releases it.
pub struct CatalogClient<T = HttpTransport> {
    transport: T,
    catalog_url: String,
}

impl<T> Debug for CatalogClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("catalog_url", &self.catalog_url)
            .finish_non_exhaustive()
    }
}

impl CatalogClient<HttpTransport> {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            transport,
            catalog_url: config.catalog_url,
        })
    }
}

impl<T: Transport> CatalogClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(catalog_url: impl Into<String>, transport: T) -> Self {
        Self {
            transport,
            catalog_url: catalog_url.into(),
        }
    }

    /// Get the configured catalog URL.
    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    /// Search entities with a single request.
    ///
    /// Fails without sending anything if the query is invalid.
    #[instrument(skip_all)]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, CatalogClientError> {
        let pairs = query.query_pairs()?;
        debug!(n_params = pairs.len(), "searching entities");

        let payload = self.transport.get(BY_QUERY_PATH, &pairs).await?;
        let response = resolve(&query_candidates(), payload);
        if response.is_unknown() {
            debug!("search response did not match the paged entity list shape");
        }
        Ok(response)
    }

    /// Search entities, following cursors until the last page.
    ///
    /// Pages are requested lazily as the stream is polled, and errors
    /// (including validation of `query`) surface at the page being pulled.
    /// The cursor of each page replaces the cursor of `query` for the next
    /// request.
    pub fn search_pages(
        &self,
        query: SearchQuery,
    ) -> impl Stream<Item = Result<SearchResponse, CatalogClientError>> + '_ {
        paginate(move |cursor| {
            let query = match cursor {
                Some(cursor) => query.clone().cursor(cursor),
                None => query.clone(),
            };
            async move { self.search(&query).await }
        })
    }

    /// Look up entities by uid, name or refs.
    #[instrument(skip_all)]
    pub async fn lookup(&self, params: &LookupParams) -> Result<LookupResult, CatalogClientError> {
        params.validate()?;
        let request = LookupRoute::select(params)?.request();

        let payload = request.send(&self.transport).await?;
        let response = resolve(&lookup_candidates(), payload);
        if response.is_unknown() {
            debug!("lookup response did not match any known shape");
        }
        Ok(response)
    }

    /// Release the transport.
    pub fn close(self) {
        debug!(catalog_url = %self.catalog_url, "closing catalog client");
        drop(self.transport);
    }
}
