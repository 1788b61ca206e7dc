//! Import configuration

use std::{fmt, time::Duration};

use anyhow::{Context as _, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
    value::{Dict, Value},
};
use serde::Deserialize;

use crate::catalog::{ProductDescriptor, validate_catalog};

/// Prefix of environment variables overriding the config file
pub const ENV_PREFIX: &str = "CATALOG_";

/// Import configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    /// Timeout for a single image download in seconds
    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,
    /// Timeout for a single XML-RPC call in seconds
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Remember resolved tag ids for the rest of the run
    #[serde(default)]
    pub cache_tags: bool,
    #[serde(default)]
    pub products: Vec<ProductDescriptor>,
}

fn default_image_timeout_secs() -> u64 {
    10
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

/// Where and as whom to connect
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the server, e.g. `https://erp.example.com`
    pub url: String,
    pub database: String,
    pub login: String,
    /// Password or API key
    pub password: String,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Try loading the configuration from a toml file.
    ///
    /// Values can be overridden with `CATALOG_` environment variables,
    /// using `__` to separate nested keys (`CATALOG_CONNECTION__PASSWORD`).
    pub fn try_load(toml: &str) -> Result<Self> {
        let env = Env::prefixed(ENV_PREFIX).split("__");
        let connection = raw_connection_overrides(&env);

        let config: Self = Figment::new()
            .merge(Toml::file(toml))
            .merge(env)
            .merge(Serialized::defaults(connection))
            .extract()
            .with_context(|| format!("failed to load configuration from {toml}"))?;

        validate_catalog(&config.products).context("invalid product catalog")?;

        Ok(config)
    }

    pub fn image_timeout(&self) -> Duration {
        Duration::from_secs(self.image_timeout_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

/// `connection.*` values from `env`, kept as the exact strings.
///
/// The `Env` provider parses `12345678` or `true` into numbers and booleans,
/// which the string fields of [ConnectionConfig] reject.
fn raw_connection_overrides(env: &Env) -> Dict {
    let fields: Dict = env
        .iter()
        .filter_map(|(key, value)| {
            let key = key.as_str().to_ascii_lowercase();
            key.strip_prefix("connection.")
                .map(|field| (field.to_string(), Value::from(value)))
        })
        .collect();

    let mut overrides = Dict::new();
    if !fields.is_empty() {
        overrides.insert("connection".to_string(), Value::from(fields));
    }
    overrides
}
