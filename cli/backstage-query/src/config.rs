use std::env;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use backstage_catalog::{CatalogClientConfig, DEFAULT_TIMEOUT};
use config::{Config as HierarchicalConfig, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::debug;
use xdg::BaseDirectories;

/// Name of the config directory below the XDG config dirs
pub const CONFIG_DIR_NAME: &str = "backstage-query";
pub const CONFIG_FILE: &str = "config.toml";
/// Names a config directory to use instead of the XDG config dirs
pub const CONFIG_DIR_VAR: &str = "BACKSTAGE_QUERY_CONFIG_DIR";
/// Prefix of the environment variables overriding config keys,
/// e.g. `BACKSTAGE_QUERY_CATALOG_URL`
const ENV_PREFIX: &str = "BACKSTAGE_QUERY";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the catalog
    pub catalog_url: Option<String>,
    pub token: Option<String>,
    /// Total timeout of a single request in seconds
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Default number of entities per search page
    pub page_limit: Option<NonZeroU32>,
}

impl Config {
    /// Read the config file and environment
    pub fn parse() -> Result<Config> {
        Self::read(config_file().as_deref())
    }

    fn read(config_file: Option<&Path>) -> Result<Config> {
        let mut builder = HierarchicalConfig::builder();

        if let Some(config_file) = config_file {
            debug!(path = %config_file.display(), "reading config file");
            builder = builder.add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
            .context("Could not parse config")?;
        Ok(config)
    }

    /// Let values passed on the command line take precedence
    pub fn apply_overrides(&mut self, catalog_url: Option<String>, token: Option<String>) {
        if catalog_url.is_some() {
            self.catalog_url = catalog_url;
        }
        if token.is_some() {
            self.token = token;
        }
    }

    pub fn client_config(&self) -> Result<CatalogClientConfig> {
        let catalog_url = self.catalog_url.clone().context(format!(
            "No catalog URL configured.\n\
             Pass '--catalog-url', set '{ENV_PREFIX}_CATALOG_URL' \
             or add 'catalog_url' to '{CONFIG_FILE}'"
        ))?;

        Ok(CatalogClientConfig {
            token: self.token.clone(),
            user_agent: Some(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            )),
            timeout: self
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            accept_invalid_certs: self.accept_invalid_certs,
            ..CatalogClientConfig::new(catalog_url)
        })
    }
}

/// Locate the config file
///
/// `$BACKSTAGE_QUERY_CONFIG_DIR/config.toml` if the variable is set,
/// otherwise the first `backstage-query/config.toml` in the XDG config dirs.
fn config_file() -> Option<PathBuf> {
    match env::var(CONFIG_DIR_VAR) {
        Ok(dir) => {
            debug!("`${CONFIG_DIR_VAR}` set: {dir}");
            Some(PathBuf::from(dir).join(CONFIG_FILE))
        },
        Err(_) => BaseDirectories::with_prefix(CONFIG_DIR_NAME).find_config_file(CONFIG_FILE),
    }
}
