use anyhow::Result;
use log::info;
use odoo_catalog::{Config, import_catalog};

/// Environment variable naming the config file
const CONFIG_PATH_VAR: &str = "CATALOG_CONFIG";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Starting importer");

    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "catalog.toml".to_string());
    let config = Config::try_load(&path)?;

    // Failed items are logged by the importer as they happen and do not
    // change the exit status.
    let report = import_catalog(&config)?;
    println!("{report}");

    Ok(())
}
