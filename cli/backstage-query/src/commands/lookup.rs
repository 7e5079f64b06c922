use std::io::Write;

use anyhow::Result;
use backstage_catalog::types::EntityName;
use backstage_catalog::{CatalogClient, LookupParams, Transport};
use bpaf::Bpaf;
use tracing::{debug, instrument};

use super::write_json_pretty;
use crate::message;

// Look up entities by uid, name or refs
#[derive(Debug, Bpaf, Clone)]
pub struct Lookup {
    /// Uid of the entity
    #[bpaf(long, argument("UID"))]
    pub uid: Option<String>,

    /// Name of the entity, the namespace defaults to 'default'
    #[bpaf(long, argument("KIND:[NAMESPACE/]NAME"))]
    pub name: Option<EntityName>,

    /// Return the ancestry of the entity named by '--name'
    #[bpaf(long)]
    pub ancestry: bool,

    /// Entity ref to fetch, may be repeated
    #[bpaf(long("ref"), argument("REF"))]
    pub refs: Vec<String>,

    /// Field to include in entities fetched by ref, may be repeated
    #[bpaf(long("field"), argument("FIELD"))]
    pub fields: Vec<String>,
}

impl Lookup {
    fn params(self) -> LookupParams {
        LookupParams {
            uid: self.uid,
            name: self.name,
            refs: self.refs,
            ancestry: self.ancestry,
            fields: self.fields,
        }
    }

    #[instrument(name = "lookup", skip_all)]
    pub async fn handle<T: Transport>(
        self,
        client: &CatalogClient<T>,
        out: &mut impl Write,
    ) -> Result<()> {
        let params = self.params();
        debug!(?params, "looking up entities");

        let response = client.lookup(&params).await?;
        if response.is_unknown() {
            message::warning("The catalog returned an unexpected response, printing it as is");
        }
        write_json_pretty(out, &response)
    }
}
