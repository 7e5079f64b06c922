//! Client for the entity endpoints of a Backstage software catalog.
//!
//! This crate provides:
//! - Search of entities with filters, full text search and cursor pagination
//! - Lookup of entities by uid, by name (optionally with ancestry) or by refs
//! - Resolution of responses into typed shapes, keeping unknown payloads
//! - HTTP client construction with bearer token authentication
//! - Mock server recording/replay for integration testing
//!
//! ## Usage
//!
//! ```ignore
//! use backstage_catalog::{CatalogClient, CatalogClientConfig, Filter, SearchQuery};
//!
//! let client = CatalogClient::new(CatalogClientConfig::new("https://backstage.example.com"))?;
//! let query = SearchQuery::new().filter(Filter::new().field("kind", "component"));
//! let page = client.search(&query).await?;
//! ```

mod client;
mod config;
mod error;
mod filters;
mod lookup;
pub(crate) mod mock;
mod pagination;
mod params;
mod shape;
mod transport;
pub mod types;

pub use client::{CatalogClient, LookupResult, SearchResponse};
pub use config::{CatalogClientConfig, CatalogMockMode, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT};
pub use error::{ApiErrorDetail, CatalogClientError};
pub use filters::{Filter, FullTextFilter};
pub use lookup::{CatalogRequest, LookupRoute};
pub use pagination::{Paginated, paginate};
pub use params::{
    LookupParams,
    OrderField,
    QueryParam,
    SearchQuery,
    SortOrder,
    ValidationError,
    check_mutually_exclusive,
};
pub use shape::{Candidate, Resolved, lookup_candidates, query_candidates, resolve};
pub use transport::{HttpTransport, Transport};
