//! Catalog data model.
//!
//! These types mirror the entity and response records served by the catalog
//! API. Optional fields are skipped when serializing so that a record written
//! back out matches what the server sent.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::pagination::Paginated;

/// Namespace used for name lookups that don't specify one.
pub const DEFAULT_NAMESPACE: &str = "default";

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelation {
    pub target_ref: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityLink {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub annotations: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub links: Option<Vec<EntityLink>>,
    #[serde(default)]
    pub etag: Option<String>,
}

/// Entity spec.
///
/// Only `type` and `lifecycle` are common to most kinds, everything else is
/// kept in `extra` as it was received.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntitySpec {
    #[serde(default, rename = "type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub lifecycle: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A catalog record describing a component, API, user, group, etc.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub api_version: String,
    pub kind: String,
    pub metadata: EntityMetadata,
    pub spec: EntitySpec,
    #[serde(default)]
    pub relations: Option<Vec<EntityRelation>>,
}

impl Entity {
    /// The `kind:namespace/name` triple identifying this entity.
    pub fn entity_name(&self) -> EntityName {
        EntityName::new(
            &self.kind,
            self.metadata.namespace.as_deref(),
            &self.metadata.name,
        )
    }
}

// ---------------------------------------------------------------------------
// Entity names
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid entity name '{0}', expected 'kind:[namespace/]name'")]
pub struct EntityNameError(String);

/// Identifies an entity by kind, namespace and name.
///
/// Renders as `kind:namespace/name`, the string form the catalog uses for
/// entity refs. Parsing accepts a missing namespace and fills in
/// [DEFAULT_NAMESPACE].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName {
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
}

impl EntityName {
    pub fn new(kind: impl Into<String>, namespace: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.map(ToOwned::to_owned),
            name: name.into(),
        }
    }

    /// The namespace to use on the wire, falling back to [DEFAULT_NAMESPACE].
    pub fn namespace_or_default(&self) -> &str {
        match self.namespace.as_deref() {
            Some(namespace) if !namespace.is_empty() => namespace,
            _ => DEFAULT_NAMESPACE,
        }
    }

    /// A name without kind or name can't address an entity.
    pub(crate) fn is_empty(&self) -> bool {
        self.kind.is_empty() || self.name.is_empty()
    }
}

impl Display for EntityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.kind,
            self.namespace_or_default(),
            self.name
        )
    }
}

impl FromStr for EntityName {
    type Err = EntityNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| EntityNameError(s.to_string()))?;
        let (namespace, name) = match rest.split_once('/') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, rest),
        };
        if kind.is_empty() || name.is_empty() || namespace.is_some_and(str::is_empty) {
            return Err(EntityNameError(s.to_string()));
        }
        Ok(EntityName::new(kind, namespace, name))
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Opaque pagination token issued by the server.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Cursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Cursor(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub next_cursor: Option<Cursor>,
    #[serde(default)]
    pub prev_cursor: Option<Cursor>,
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// A page of results from `/entities/by-query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryEntitiesResponse {
    pub items: Vec<Entity>,
    pub total_items: u64,
    pub page_info: PageInfo,
}

impl Paginated for QueryEntitiesResponse {
    fn next_cursor(&self) -> Option<&Cursor> {
        self.page_info.next_cursor.as_ref()
    }
}

/// Entities returned by a batch lookup.
///
/// The server answers with `null` in place of refs it could not find, so the
/// items stay positionally aligned with the requested refs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityList {
    pub items: Vec<Option<Entity>>,
}

impl EntityList {
    /// The entities that were found, skipping unresolved refs.
    pub fn found(&self) -> impl Iterator<Item = &Entity> {
        self.items.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestryEntity {
    pub entity: Entity,
    pub parent_entity_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAncestryResponse {
    pub root_entity_ref: String,
    pub items: Vec<AncestryEntity>,
}

/// The shapes a lookup can resolve to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LookupResponse {
    Entity(Box<Entity>),
    Entities(EntityList),
    Ancestry(EntityAncestryResponse),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_entity_name_with_namespace() {
        let name: EntityName = "component:dev/foo".parse().unwrap();
        assert_eq!(name, EntityName::new("component", Some("dev"), "foo"));
        assert_eq!(name.to_string(), "component:dev/foo");
    }

    #[test]
    fn parses_entity_name_without_namespace() {
        let name: EntityName = "Component:foo".parse().unwrap();
        assert_eq!(name.namespace, None);
        assert_eq!(name.namespace_or_default(), DEFAULT_NAMESPACE);
        assert_eq!(name.to_string(), "Component:default/foo");
    }

    #[test]
    fn rejects_malformed_entity_names() {
        for input in ["foo", ":foo", "component:", "component:/foo", "component:dev/"] {
            assert!(
                input.parse::<EntityName>().is_err(),
                "expected '{input}' to be rejected"
            );
        }
    }

    #[test]
    fn entity_keeps_extra_spec_fields() {
        let value = json!({
            "apiVersion": "backstage.io/v1alpha1",
            "kind": "Component",
            "metadata": { "name": "foo", "namespace": "default" },
            "spec": { "type": "service", "lifecycle": "production", "owner": "team-a" },
        });
        let entity: Entity = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(entity.spec.type_.as_deref(), Some("service"));
        assert_eq!(entity.spec.extra["owner"], json!("team-a"));
        assert_eq!(entity.entity_name().to_string(), "Component:default/foo");

        // optional fields that were absent are not written back
        assert_eq!(serde_json::to_value(&entity).unwrap(), value);
    }

    #[test]
    fn entity_list_tolerates_missing_refs() {
        let list: EntityList = serde_json::from_value(json!({
            "items": [
                null,
                {
                    "apiVersion": "backstage.io/v1alpha1",
                    "kind": "User",
                    "metadata": { "name": "jdoe" },
                    "spec": {},
                },
            ]
        }))
        .unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(
            list.found().map(|e| e.metadata.name.as_str()).collect::<Vec<_>>(),
            vec!["jdoe"]
        );
    }
}
