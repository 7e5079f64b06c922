//! Selection of the lookup endpoint for a set of [LookupParams].

use serde_json::{Value, json};
use tracing::debug;

use crate::error::CatalogClientError;
use crate::params::{LookupParams, ValidationError};
use crate::transport::Transport;
use crate::types::EntityName;

pub(crate) const BY_UID_PATH: &str = "/api/catalog/entities/by-uid";
pub(crate) const BY_NAME_PATH: &str = "/api/catalog/entities/by-name";
pub(crate) const BY_REFS_PATH: &str = "/api/catalog/entities/by-refs";

/// The lookup strategy picked for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRoute {
    ByUid(String),
    ByName { name: EntityName, ancestry: bool },
    ByRefs { refs: Vec<String>, fields: Vec<String> },
}

impl LookupRoute {
    /// Pick the first populated selector out of uid, name and refs.
    ///
    /// Parameters should have been validated, see [LookupParams::validate].
    pub fn select(params: &LookupParams) -> Result<Self, ValidationError> {
        let route = if let Some(uid) = params.uid() {
            LookupRoute::ByUid(uid.to_string())
        } else if let Some(name) = params.name() {
            LookupRoute::ByName {
                name: name.clone(),
                ancestry: params.ancestry,
            }
        } else if let Some(refs) = params.refs() {
            LookupRoute::ByRefs {
                refs: refs.to_vec(),
                fields: params.fields.clone(),
            }
        } else {
            return Err(ValidationError::MissingSelector);
        };
        debug!(?route, "selected lookup route");
        Ok(route)
    }

    pub fn request(&self) -> CatalogRequest {
        match self {
            LookupRoute::ByUid(uid) => CatalogRequest::Get {
                path: format!("{BY_UID_PATH}/{}", url_escape::encode_component(uid)),
            },
            LookupRoute::ByName { name, ancestry } => {
                let mut path = format!(
                    "{BY_NAME_PATH}/{}/{}/{}",
                    url_escape::encode_component(&name.kind),
                    url_escape::encode_component(name.namespace_or_default()),
                    url_escape::encode_component(&name.name),
                );
                if *ancestry {
                    path.push_str("/ancestry");
                }
                CatalogRequest::Get { path }
            },
            LookupRoute::ByRefs { refs, fields } => CatalogRequest::Post {
                path: BY_REFS_PATH.to_string(),
                body: json!({
                    "entityRefs": refs,
                    "fields": fields,
                }),
            },
        }
    }
}

/// A single request against one of the lookup endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogRequest {
    Get { path: String },
    Post { path: String, body: Value },
}

impl CatalogRequest {
    pub async fn send(&self, transport: &impl Transport) -> Result<Value, CatalogClientError> {
        match self {
            CatalogRequest::Get { path } => transport.get(path, &[]).await,
            CatalogRequest::Post { path, body } => transport.post(path, body).await,
        }
    }
}
