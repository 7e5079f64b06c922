//! Resolution of untyped response payloads into typed shapes.
//!
//! Some endpoints answer with different record shapes depending on the
//! request. A response is matched against an ordered list of [Candidate]s and
//! resolves to the first one it validates against. Payloads that match no
//! candidate are kept as [Resolved::Unknown] so that callers can still handle
//! responses that aren't modelled yet.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::pagination::Paginated;
use crate::types::{Cursor, Entity, LookupResponse, QueryEntitiesResponse};

type Constructor<T> = Box<dyn Fn(&Value) -> Result<T, serde_json::Error> + Send + Sync>;

/// One possible shape of a response.
pub struct Candidate<T> {
    name: &'static str,
    discriminator: Option<&'static str>,
    construct: Constructor<T>,
}

impl<T> Candidate<T> {
    /// A candidate that validates the payload as `S` and wraps it with `wrap`.
    pub fn new<S, F>(name: &'static str, wrap: F) -> Self
    where
        S: DeserializeOwned + 'static,
        F: Fn(S) -> T + Send + Sync + 'static,
    {
        Self {
            name,
            discriminator: None,
            construct: Box::new(move |value: &Value| S::deserialize(value).map(&wrap)),
        }
    }

    /// Only try this candidate if the payload has a top level `field`.
    pub fn discriminated_by(mut self, field: &'static str) -> Self {
        self.discriminator = Some(field);
        self
    }

    fn applies_to(&self, payload: &Value) -> bool {
        match self.discriminator {
            None => true,
            Some(field) => payload
                .as_object()
                .is_some_and(|object| object.contains_key(field)),
        }
    }
}

impl<T> std::fmt::Debug for Candidate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate")
            .field("name", &self.name)
            .field("discriminator", &self.discriminator)
            .finish_non_exhaustive()
    }
}

/// Outcome of resolving a payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved<T> {
    /// The payload matched a candidate.
    Shape(T),
    /// The payload matched none of the candidates and is returned unmodified.
    Unknown(Value),
}

impl<T> Resolved<T> {
    pub fn shape(self) -> Option<T> {
        match self {
            Resolved::Shape(shape) => Some(shape),
            Resolved::Unknown(_) => None,
        }
    }

    pub fn as_shape(&self) -> Option<&T> {
        match self {
            Resolved::Shape(shape) => Some(shape),
            Resolved::Unknown(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Resolved::Unknown(_))
    }
}

impl<T: Paginated> Paginated for Resolved<T> {
    /// Unknown payloads carry no cursor we could trust.
    fn next_cursor(&self) -> Option<&Cursor> {
        self.as_shape().and_then(Paginated::next_cursor)
    }
}

/// Resolve `payload` against `candidates`, in order.
pub fn resolve<T>(candidates: &[Candidate<T>], payload: Value) -> Resolved<T> {
    for candidate in candidates {
        if !candidate.applies_to(&payload) {
            trace!(
                candidate = candidate.name,
                discriminator = candidate.discriminator,
                "skipping candidate, discriminator missing"
            );
            continue;
        }
        match (candidate.construct)(&payload) {
            Ok(shape) => return Resolved::Shape(shape),
            Err(err) => trace!(candidate = candidate.name, %err, "payload rejected"),
        }
    }
    trace!("payload matched no candidate, returning it as is");
    Resolved::Unknown(payload)
}

/// Candidates for the entity query endpoint.
pub fn query_candidates() -> Vec<Candidate<QueryEntitiesResponse>> {
    vec![
        Candidate::new("paged entity list", |page: QueryEntitiesResponse| page)
            .discriminated_by("pageInfo"),
    ]
}

/// Candidates for the lookup endpoints, in priority order.
///
/// Ancestry responses also carry `items`, so they are tried before the bare
/// entity list.
pub fn lookup_candidates() -> Vec<Candidate<LookupResponse>> {
    vec![
        Candidate::new("entity", |entity: Entity| LookupResponse::Entity(Box::new(entity)))
            .discriminated_by("apiVersion"),
        Candidate::new("entity ancestry", LookupResponse::Ancestry)
            .discriminated_by("rootEntityRef"),
        Candidate::new("entity list", LookupResponse::Entities).discriminated_by("items"),
    ]
}
