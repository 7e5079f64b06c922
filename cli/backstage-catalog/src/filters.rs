//! Filter intents for the entity query endpoint.
//!
//! A [Filter] is one `filter` query parameter: all of its fields have to
//! match (AND). Several filters on the same query are alternatives (OR).
//! A [FullTextFilter] searches a term within a set of fields and can't be
//! combined with [Filter]s on the same query.

use indexmap::IndexMap;

pub(crate) const FILTER_PARAM: &str = "filter";
pub(crate) const FULL_TEXT_TERM_PARAM: &str = "fullTextFilterTerm";
pub(crate) const FULL_TEXT_FIELDS_PARAM: &str = "fullTextFilterFields";

/// Equality filter on one or more entity fields.
///
/// ```ignore
/// let filter = Filter::new()
///     .field("kind", "component")
///     .field("metadata_namespace", "development");
/// assert_eq!(
///     filter.to_query_pair(),
///     ("filter", "kind=component,metadata.namespace=development".to_string())
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    fields: IndexMap<String, String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field using an identifier-safe key.
    ///
    /// Every `_` in `key` is replaced with `.`, so `metadata_namespace`
    /// filters on `metadata.namespace`.
    pub fn field(self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        let path = key.as_ref().replace('_', ".");
        self.field_path(path, value)
    }

    /// Add a field using the dotted path as-is.
    ///
    /// Use this for paths that contain underscores, e.g. annotation keys.
    pub fn field_path(mut self, path: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// The fields in the order they were added.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query_pair(&self) -> (&'static str, String) {
        let value = self
            .fields
            .iter()
            .map(|(path, value)| format!("{path}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        (FILTER_PARAM, value)
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: AsRef<str>,
    V: Into<String>,
{
    /// Collects identifier-safe keys, see [Filter::field].
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Filter::new(), |filter, (key, value)| filter.field(key, value))
    }
}

/// Full text search of `term` within `fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullTextFilter {
    pub term: String,
    pub fields: Vec<String>,
}

impl FullTextFilter {
    pub fn new<I, S>(term: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            term: term.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    pub fn to_query_pairs(&self) -> [(&'static str, String); 2] {
        [
            (FULL_TEXT_TERM_PARAM, self.term.clone()),
            (FULL_TEXT_FIELDS_PARAM, self.fields.join(",")),
        ]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn converts_underscores_to_dots() {
        let filter = Filter::new()
            .field("kind", "component")
            .field("metadata_namespace", "development");
        assert_eq!(
            filter.to_query_pair(),
            (
                "filter",
                "kind=component,metadata.namespace=development".to_string()
            )
        );
    }

    #[test]
    fn field_path_is_verbatim() {
        let filter = Filter::new().field_path("metadata.annotations.my_team/owner", "a_b");
        assert_eq!(
            filter.to_query_pair().1,
            "metadata.annotations.my_team/owner=a_b"
        );
    }

    #[test]
    fn reinserting_a_field_keeps_its_position() {
        let filter = Filter::new()
            .field("kind", "component")
            .field("spec_type", "service")
            .field("kind", "api");
        assert_eq!(filter.to_query_pair().1, "kind=api,spec.type=service");
    }

    #[test]
    fn collects_from_pairs() {
        let filter: Filter = [("kind", "user"), ("metadata_name", "jdoe")]
            .into_iter()
            .collect();
        assert_eq!(filter.to_query_pair().1, "kind=user,metadata.name=jdoe");
    }

    #[test]
    fn full_text_filter_pairs() {
        let filter = FullTextFilter::new("service", ["metadata.name", "metadata.title"]);
        assert_eq!(filter.to_query_pairs(), [
            ("fullTextFilterTerm", "service".to_string()),
            ("fullTextFilterFields", "metadata.name,metadata.title".to_string()),
        ]);
    }

    proptest! {
        #[test]
        fn composes_one_entry_per_field_in_insertion_order(
            fields in proptest::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9-]{1,8}", 2..6)
        ) {
            // shuffle the insertion order relative to the sorted map
            let ordered = fields.iter().rev().collect::<Vec<_>>();
            let filter = ordered
                .iter()
                .fold(Filter::new(), |filter, (k, v)| filter.field_path(k.as_str(), v.as_str()));

            let (name, value) = filter.to_query_pair();
            prop_assert_eq!(name, "filter");

            let entries = value.split(',').collect::<Vec<_>>();
            prop_assert_eq!(entries.len(), fields.len());
            for (entry, (k, v)) in entries.iter().zip(ordered) {
                prop_assert_eq!(*entry, format!("{k}={v}"));
            }
        }
    }
}
