mod lookup;
mod search;

use std::io::Write;

use anyhow::{Context, Result};
use backstage_catalog::CatalogClient;
use bpaf::Bpaf;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;

const DESCRIPTION: &str = "Query the entities of a software catalog";

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(DESCRIPTION))]
pub struct QueryCli(#[bpaf(external(query_args))] pub QueryArgs);

/// Top level arguments, shared by all commands
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct QueryArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Base URL of the catalog, e.g. https://backstage.example.com
    #[bpaf(long("catalog-url"), argument("URL"))]
    pub catalog_url: Option<String>,

    /// Token sent as bearer authorization
    #[bpaf(long, argument("TOKEN"))]
    pub token: Option<String>,

    #[bpaf(external(commands))]
    command: Commands,
}

impl QueryArgs {
    pub async fn handle(self, mut config: Config) -> Result<()> {
        config.apply_overrides(self.catalog_url, self.token);
        let client = CatalogClient::new(config.client_config()?)
            .context("Could not create catalog client")?;
        debug!(catalog_url = client.catalog_url(), "created catalog client");

        let mut out = std::io::stdout().lock();
        let result = match self.command {
            Commands::Search(args) => args.handle(&config, &client, &mut out).await,
            Commands::Lookup(args) => args.handle(&client, &mut out).await,
        };
        client.close();
        result
    }
}

#[derive(Bpaf, Debug)]
enum Commands {
    /// Search entities by filter or full text term
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Look up entities by uid, name or refs
    #[bpaf(command)]
    Lookup(#[bpaf(external(lookup::lookup))] lookup::Lookup),
}

/// Write `value` as a single JSON line.
fn write_json_line(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_json_pretty(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<QueryArgs, bpaf::ParseFailure> {
        query_cli().run_inner(args).map(|QueryCli(args)| args)
    }

    #[test]
    fn parses_verbosity_and_connection() {
        let args = parse(&[
            "-vv",
            "--catalog-url",
            "https://backstage.example.com",
            "search",
            "--filter",
            "kind=component",
        ])
        .unwrap();
        assert!(matches!(args.verbosity, Verbosity::Verbose(2)));
        assert_eq!(
            args.catalog_url.as_deref(),
            Some("https://backstage.example.com")
        );
        assert!(matches!(args.command, Commands::Search(_)));
    }

    #[test]
    fn parses_lookup_refs() {
        let args = parse(&[
            "-q",
            "lookup",
            "--ref",
            "component:default/foo",
            "--ref",
            "api:default/bar",
            "--field",
            "kind",
        ])
        .unwrap();
        assert!(matches!(args.verbosity, Verbosity::Quiet));
        let Commands::Lookup(lookup) = args.command else {
            panic!("expected lookup command");
        };
        assert_eq!(lookup.refs, vec!["component:default/foo", "api:default/bar"]);
        assert_eq!(lookup.fields, vec!["kind"]);
    }

    #[test]
    fn rejects_malformed_entity_name() {
        assert!(parse(&["lookup", "--name", "foo"]).is_err());
    }

    #[test]
    fn rejects_malformed_filter() {
        assert!(parse(&["search", "--filter", "kind"]).is_err());
    }
}
