//! Request parameters for search and lookup, and their validation.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::num::NonZeroU32;

use thiserror::Error;

use crate::filters::{Filter, FullTextFilter};
use crate::types::{Cursor, EntityName};

/// Groups of search parameters that can't be used together.
pub const SEARCH_EXCLUSIVE_GROUPS: &[&[&str]] = &[&["filter", "full_text_filter"]];

/// Groups of lookup parameters that can't be used together.
pub const LOOKUP_EXCLUSIVE_GROUPS: &[&[&str]] =
    &[&["uid", "name"], &["uid", "refs"], &["name", "refs"]];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("arguments {} are mutually exclusive and cannot be used together", .params.join(", "))]
    MutuallyExclusive { params: Vec<String> },
    #[error("no entity selector given, expected one of uid, name or refs")]
    MissingSelector,
}

/// Fail if more than one member of any group is in `present`.
///
/// The error names the offending parameters of the first violated group, in
/// the order the group declares them.
pub fn check_mutually_exclusive(
    groups: &[&[&str]],
    present: &BTreeSet<&str>,
) -> Result<(), ValidationError> {
    for group in groups {
        let present_params = group
            .iter()
            .filter(|param| present.contains(*param))
            .map(|param| param.to_string())
            .collect::<Vec<_>>();

        if present_params.len() > 1 {
            return Err(ValidationError::MutuallyExclusive {
                params: present_params,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SortOrder {
    #[display("asc")]
    Asc,
    #[display("desc")]
    Desc,
}

/// Field to order query results by, e.g. `metadata.name,asc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderField {
    pub field: String,
    pub order: Option<SortOrder>,
}

impl OrderField {
    pub fn new(field: impl Into<String>, order: Option<SortOrder>) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

impl Display for OrderField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.order {
            Some(order) => write!(f, "{},{order}", self.field),
            None => write!(f, "{}", self.field),
        }
    }
}

impl std::str::FromStr for OrderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, order) = match s.split_once(',') {
            Some((field, "asc")) => (field, Some(SortOrder::Asc)),
            Some((field, "desc")) => (field, Some(SortOrder::Desc)),
            Some((_, other)) => return Err(format!("unknown sort order '{other}'")),
            None => (s, None),
        };
        if field.is_empty() {
            return Err("order field must not be empty".to_string());
        }
        Ok(OrderField::new(field, order))
    }
}

/// A single query parameter of the entity query endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryParam {
    Filter(Filter),
    FullTextFilter(FullTextFilter),
    Fields(Vec<String>),
    Limit(NonZeroU32),
    OrderField(OrderField),
    Cursor(Cursor),
}

impl QueryParam {
    /// Wire pairs for this parameter.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            QueryParam::Filter(filter) => vec![filter.to_query_pair()],
            QueryParam::FullTextFilter(filter) => filter.to_query_pairs().to_vec(),
            QueryParam::Fields(fields) => vec![("fields", fields.join(","))],
            QueryParam::Limit(limit) => vec![("limit", limit.to_string())],
            QueryParam::OrderField(order_field) => vec![("orderField", order_field.to_string())],
            QueryParam::Cursor(cursor) => vec![("cursor", cursor.to_string())],
        }
    }
}

/// Parameters of an entity search.
///
/// `filter` and `full_text_filter` are mutually exclusive, see
/// [SearchQuery::validate].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub filter: Vec<Filter>,
    pub full_text_filter: Option<FullTextFilter>,
    pub fields: Vec<String>,
    pub limit: Option<NonZeroU32>,
    pub order_field: Option<OrderField>,
    pub cursor: Option<Cursor>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter.push(filter);
        self
    }

    pub fn full_text_filter(mut self, filter: FullTextFilter) -> Self {
        self.full_text_filter = Some(filter);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: NonZeroU32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order_field(mut self, order_field: OrderField) -> Self {
        self.order_field = Some(order_field);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<Cursor>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Names of the parameters that carry a non-empty value.
    fn present_params(&self) -> BTreeSet<&'static str> {
        let mut present = BTreeSet::new();
        if self.filter.iter().any(|filter| !filter.is_empty()) {
            present.insert("filter");
        }
        if self.full_text_filter.as_ref().is_some_and(|f| !f.is_empty()) {
            present.insert("full_text_filter");
        }
        if !self.fields.is_empty() {
            present.insert("fields");
        }
        if self.limit.is_some() {
            present.insert("limit");
        }
        if self.order_field.is_some() {
            present.insert("order_field");
        }
        if self.cursor.is_some() {
            present.insert("cursor");
        }
        present
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_mutually_exclusive(SEARCH_EXCLUSIVE_GROUPS, &self.present_params())
    }

    /// The parameters that carry a value, in wire order.
    pub fn params(&self) -> Vec<QueryParam> {
        let filters = self
            .filter
            .iter()
            .filter(|filter| !filter.is_empty())
            .cloned()
            .map(QueryParam::Filter);

        let rest = [
            self.full_text_filter
                .clone()
                .filter(|f| !f.is_empty())
                .map(QueryParam::FullTextFilter),
            Some(self.fields.clone())
                .filter(|fields| !fields.is_empty())
                .map(QueryParam::Fields),
            self.limit.map(QueryParam::Limit),
            self.order_field.clone().map(QueryParam::OrderField),
            self.cursor.clone().map(QueryParam::Cursor),
        ];

        filters.chain(rest.into_iter().flatten()).collect()
    }

    /// Validate and compose the query string pairs.
    pub fn query_pairs(&self) -> Result<Vec<(&'static str, String)>, ValidationError> {
        self.validate()?;
        Ok(self
            .params()
            .iter()
            .flat_map(QueryParam::to_query_pairs)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Parameters of an entity lookup.
///
/// Exactly one selector out of `uid`, `name` and `refs` should be set.
/// `ancestry` only applies to lookups by name, `fields` only to lookups by
/// refs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupParams {
    pub uid: Option<String>,
    pub name: Option<EntityName>,
    pub refs: Vec<String>,
    pub ancestry: bool,
    pub fields: Vec<String>,
}

impl LookupParams {
    pub fn by_uid(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
            ..Default::default()
        }
    }

    pub fn by_name(name: EntityName) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }

    pub fn by_refs<I, S>(refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            refs: refs.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn ancestry(mut self, ancestry: bool) -> Self {
        self.ancestry = ancestry;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn uid(&self) -> Option<&str> {
        self.uid.as_deref().filter(|uid| !uid.is_empty())
    }

    pub(crate) fn name(&self) -> Option<&EntityName> {
        self.name.as_ref().filter(|name| !name.is_empty())
    }

    pub(crate) fn refs(&self) -> Option<&[String]> {
        Some(self.refs.as_slice()).filter(|refs| !refs.is_empty())
    }

    fn present_params(&self) -> BTreeSet<&'static str> {
        [
            self.uid().map(|_| "uid"),
            self.name().map(|_| "name"),
            self.refs().map(|_| "refs"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_mutually_exclusive(LOOKUP_EXCLUSIVE_GROUPS, &self.present_params())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn exclusive_groups_report_offending_params() {
        let present = BTreeSet::from(["name", "refs"]);
        let err = check_mutually_exclusive(LOOKUP_EXCLUSIVE_GROUPS, &present).unwrap_err();
        assert_eq!(err, ValidationError::MutuallyExclusive {
            params: vec!["name".to_string(), "refs".to_string()]
        });
        assert_eq!(
            err.to_string(),
            "arguments name, refs are mutually exclusive and cannot be used together"
        );
    }

    #[test]
    fn exclusive_groups_allow_single_members() {
        for param in ["uid", "name", "refs"] {
            let present = BTreeSet::from([param]);
            assert_eq!(
                check_mutually_exclusive(LOOKUP_EXCLUSIVE_GROUPS, &present),
                Ok(())
            );
        }
    }

    #[test]
    fn search_rejects_filter_with_full_text_filter() {
        let query = SearchQuery::new()
            .filter(Filter::new().field("kind", "component"))
            .full_text_filter(FullTextFilter::new("service", ["metadata.name"]));

        assert_eq!(
            query.query_pairs(),
            Err(ValidationError::MutuallyExclusive {
                params: vec!["filter".to_string(), "full_text_filter".to_string()]
            })
        );
    }

    #[test]
    fn empty_values_are_not_present() {
        let query = SearchQuery::new()
            .filter(Filter::new())
            .full_text_filter(FullTextFilter::new("service", ["metadata.name"]));
        assert_eq!(query.validate(), Ok(()));
    }

    #[test]
    fn composes_pairs_in_wire_order() {
        let query = SearchQuery::new()
            .cursor("abc")
            .order_field("metadata.name,asc".parse().unwrap())
            .limit(NonZeroU32::new(10).unwrap())
            .fields(["kind", "metadata.name"])
            .filter(Filter::new().field("kind", "component"))
            .filter(Filter::new().field("kind", "user"));

        assert_eq!(query.query_pairs().unwrap(), vec![
            ("filter", "kind=component".to_string()),
            ("filter", "kind=user".to_string()),
            ("fields", "kind,metadata.name".to_string()),
            ("limit", "10".to_string()),
            ("orderField", "metadata.name,asc".to_string()),
            ("cursor", "abc".to_string()),
        ]);
    }

    #[test]
    fn composes_full_text_pairs() {
        let query =
            SearchQuery::new().full_text_filter(FullTextFilter::new("svc", ["metadata.name"]));
        assert_eq!(query.query_pairs().unwrap(), vec![
            ("fullTextFilterTerm", "svc".to_string()),
            ("fullTextFilterFields", "metadata.name".to_string()),
        ]);
    }

    #[test]
    fn parses_order_fields() {
        assert_eq!(
            "metadata.name".parse::<OrderField>(),
            Ok(OrderField::new("metadata.name", None))
        );
        assert_eq!(
            "metadata.name,desc".parse::<OrderField>(),
            Ok(OrderField::new("metadata.name", Some(SortOrder::Desc)))
        );
        assert!("metadata.name,up".parse::<OrderField>().is_err());
        assert!(",asc".parse::<OrderField>().is_err());
    }

    #[test]
    fn lookup_rejects_multiple_selectors() {
        let cases = [
            LookupParams {
                uid: Some("1234".into()),
                name: Some(EntityName::new("Component", None, "foo")),
                ..Default::default()
            },
            LookupParams {
                uid: Some("1234".into()),
                refs: vec!["component:default/foo".into()],
                ..Default::default()
            },
            LookupParams {
                name: Some(EntityName::new("Component", None, "foo")),
                refs: vec!["component:default/foo".into()],
                ..Default::default()
            },
        ];
        for params in cases {
            assert!(
                matches!(
                    params.validate(),
                    Err(ValidationError::MutuallyExclusive { .. })
                ),
                "expected {params:?} to be rejected"
            );
        }
    }

    #[test]
    fn lookup_ignores_empty_selectors() {
        let params = LookupParams {
            uid: Some(String::new()),
            refs: vec!["component:default/foo".into()],
            ..Default::default()
        };
        assert_eq!(params.validate(), Ok(()));
    }
}
