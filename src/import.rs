//! Product catalog import
//!
//! This module provides a function to import a product catalog into Odoo.
//! Each product is imported on its own, so one failing product
//! does not stop the others.

use std::fmt;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use log::{error, info};

use crate::{
    catalog::ProductDescriptor,
    config::Config,
    image::{HttpImageSource, ImageSource, resolve_image},
    odoo::{CatalogStore, OdooStore, ProductValues},
    rpc::{RecordId, RpcEndpoint, XmlRpcEndpoint, rpc_client},
    session::establish_session,
    tags::TagResolver,
};

/// Import the products of the [Config] into the configured server
pub fn import_catalog(config: &Config) -> Result<ImportReport> {
    let base_url = &config.connection.url;
    let images = HttpImageSource::new(config.image_timeout())?;
    let client = rpc_client(config.rpc_timeout())?;

    import_catalog_with(
        config,
        &XmlRpcEndpoint::common(client.clone(), base_url),
        XmlRpcEndpoint::object(client, base_url),
        &images,
    )
}

/// Import the products of the [Config] through the given endpoints.
///
/// Fails without importing anything if no session can be established.
pub fn import_catalog_with<E: RpcEndpoint>(
    config: &Config,
    common: &impl RpcEndpoint,
    object: E,
    images: &impl ImageSource,
) -> Result<ImportReport> {
    let session = establish_session(common, &config.connection)
        .context("failed to establish a session")?;
    let store = OdooStore::new(object, session);

    let tags = if config.cache_tags {
        TagResolver::cached()
    } else {
        TagResolver::new()
    };

    Ok(Importer::new(&store, images, tags).import_products(&config.products))
}

/// Creates products one by one
pub struct Importer<'a, S, I> {
    store: &'a S,
    images: &'a I,
    tags: TagResolver,
}

impl<'a, S: CatalogStore, I: ImageSource> Importer<'a, S, I> {
    pub fn new(store: &'a S, images: &'a I, tags: TagResolver) -> Self {
        Self {
            store,
            images,
            tags,
        }
    }

    /// Import all `products` in order, isolating failures per product
    pub fn import_products(&mut self, products: &[ProductDescriptor]) -> ImportReport {
        let started_at = Local::now();
        info!("Starting import of {} products", products.len());

        let outcomes = products
            .iter()
            .map(|product| {
                info!("Processing {}", product.name);
                let outcome = match self.import_product(product) {
                    Ok(id) => {
                        info!("Created {} (id {id})", product.name);
                        ImportOutcome::Created(id)
                    }
                    Err(e) => {
                        error!("Failed to import {}: {e:#}", product.name);
                        ImportOutcome::Failed(format!("{e:#}"))
                    }
                };
                ItemOutcome {
                    name: product.name.clone(),
                    outcome,
                }
            })
            .collect();

        ImportReport {
            outcomes,
            started_at,
            finished_at: Local::now(),
        }
    }

    /// Create a single product.
    ///
    /// Tags created before a failure stay on the server.
    pub fn import_product(&mut self, product: &ProductDescriptor) -> Result<RecordId> {
        let image = resolve_image(self.images, product.image_source());
        let tag_ids = self.tags.resolve_all(self.store, &product.tags)?;

        let values = ProductValues::new(product, tag_ids, image);
        self.store
            .create_product(&values)
            .with_context(|| format!("failed to create product '{}'", product.default_code))
    }
}

/// Result of importing one product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Created(RecordId),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Display name of the product
    pub name: String,
    pub outcome: ImportOutcome,
}

/// Summary of an import run
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub outcomes: Vec<ItemOutcome>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl ImportReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, ImportOutcome::Created(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.created()
    }

    /// Products that could not be imported, with the error
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            ImportOutcome::Failed(e) => Some((o.name.as_str(), e.as_str())),
            ImportOutcome::Created(_) => None,
        })
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        write!(
            f,
            "Attempted: {}, Successfully created: {}, Failed: {} (in {:.1}s)",
            self.attempted(),
            self.created(),
            self.failed(),
            elapsed.num_milliseconds() as f64 / 1000.0,
        )
    }
}
