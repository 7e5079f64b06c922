use std::io::Write;
use std::num::NonZeroU32;
use std::pin::pin;
use std::str::FromStr;

use anyhow::Result;
use backstage_catalog::{
    CatalogClient,
    Filter,
    FullTextFilter,
    OrderField,
    SearchQuery,
    SearchResponse,
    Transport,
};
use bpaf::Bpaf;
use futures::TryStreamExt;
use tracing::{debug, instrument};

use super::{write_json_line, write_json_pretty};
use crate::config::Config;
use crate::message;

/// A filter given as comma separated `key=value` pairs.
///
/// Keys are used as field paths as they are, e.g. `metadata.namespace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg(Filter);

impl FromStr for FilterArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut filter = Filter::new();
        for pair in s.split(',') {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(format!("expected 'key=value', found '{pair}'"));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("missing key in '{pair}'"));
            }
            filter = filter.field_path(key, value.trim());
        }
        Ok(FilterArg(filter))
    }
}

// Search entities of the catalog
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Match entities with all of the given fields
    ///
    /// Repeat to match entities satisfying any of the filters.
    #[bpaf(long("filter"), argument("KEY=VALUE[,KEY=VALUE]"))]
    pub filters: Vec<FilterArg>,

    /// Full text search term
    #[bpaf(long("text"), argument("TERM"))]
    pub text: Option<String>,

    /// Field to match the full text term against, may be repeated
    #[bpaf(long("text-field"), argument("FIELD"))]
    pub text_fields: Vec<String>,

    /// Field to include in the results, may be repeated
    #[bpaf(long("field"), argument("FIELD"))]
    pub fields: Vec<String>,

    /// Maximum number of entities per page
    #[bpaf(long, argument("N"))]
    pub limit: Option<NonZeroU32>,

    /// Field to order results by, optionally followed by ',asc' or ',desc'
    #[bpaf(long("order-field"), argument("FIELD[,ORDER]"))]
    pub order_field: Option<OrderField>,

    /// Cursor of the page to fetch
    #[bpaf(long, argument("CURSOR"))]
    pub cursor: Option<String>,

    /// Follow cursors and print every page as a line of JSON
    #[bpaf(long)]
    pub all: bool,
}

impl Search {
    /// Combine the arguments with configured defaults.
    fn query(&self, config: &Config) -> SearchQuery {
        let mut query = SearchQuery::new().fields(self.fields.iter().cloned());
        for FilterArg(filter) in &self.filters {
            query = query.filter(filter.clone());
        }
        if let Some(term) = &self.text {
            query = query.full_text_filter(FullTextFilter::new(term, self.text_fields.iter()));
        }
        if let Some(limit) = self.limit.or(config.page_limit) {
            query = query.limit(limit);
        }
        if let Some(order_field) = &self.order_field {
            query = query.order_field(order_field.clone());
        }
        if let Some(cursor) = &self.cursor {
            query = query.cursor(cursor.as_str());
        }
        query
    }

    #[instrument(name = "search", fields(all = self.all), skip_all)]
    pub async fn handle<T: Transport>(
        self,
        config: &Config,
        client: &CatalogClient<T>,
        out: &mut impl Write,
    ) -> Result<()> {
        let query = self.query(config);
        debug!(?query, "searching catalog");

        if !self.all {
            let page = client.search(&query).await?;
            warn_unknown(&page);
            return write_json_pretty(out, &page);
        }

        let mut pages = pin!(client.search_pages(query));
        while let Some(page) = pages.try_next().await? {
            warn_unknown(&page);
            write_json_line(out, &page)?;
        }
        Ok(())
    }
}

fn warn_unknown(page: &SearchResponse) {
    if page.is_unknown() {
        message::warning("The catalog returned an unexpected response, printing it as is");
    }
}
