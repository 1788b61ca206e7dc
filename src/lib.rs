//! Import a product catalog into Odoo through its XML-RPC API.
//!
//! For every product the image is downloaded, the tags are looked up
//! or created and the product template is created with both.

pub mod catalog;
pub mod config;
pub mod image;
pub mod import;
pub mod odoo;
pub mod rpc;
pub mod session;
pub mod tags;

#[cfg(test)]
mod test_server;

pub use catalog::{ProductDescriptor, ProductKind};
pub use config::{Config, ConnectionConfig};
pub use import::{ImportOutcome, ImportReport, Importer, import_catalog, import_catalog_with};
