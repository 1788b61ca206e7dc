//! Tag name resolution
//!
//! Tags are looked up by exact name and created when missing.

use std::collections::HashMap;

use anyhow::{Context as _, Result};
use log::debug;

use crate::{odoo::CatalogStore, rpc::RecordId};

/// Resolves tag names to remote ids.
///
/// Without a cache every call asks the server again,
/// even for names resolved earlier in the same run.
#[derive(Debug, Default)]
pub struct TagResolver {
    cache: Option<HashMap<String, RecordId>>,
}

impl TagResolver {
    /// Resolver that always queries the server
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver remembering ids for the lifetime of the resolver
    pub fn cached() -> Self {
        Self {
            cache: Some(HashMap::new()),
        }
    }

    /// Id of the tag called `name`, creating the tag if it does not exist
    pub fn resolve(&mut self, store: &impl CatalogStore, name: &str) -> Result<RecordId> {
        if let Some(id) = self.cache.as_ref().and_then(|c| c.get(name)) {
            debug!("Tag '{name}' already resolved to {id}");
            return Ok(*id);
        }

        let existing = store
            .search_tags(name)
            .with_context(|| format!("failed to look up tag '{name}'"))?;

        // Duplicates on the server are not disambiguated.
        let id = match existing.first() {
            Some(id) => {
                debug!("Found tag '{name}' ({id})");
                *id
            }
            None => {
                let id = store
                    .create_tag(name)
                    .with_context(|| format!("failed to create tag '{name}'"))?;
                debug!("Created tag '{name}' ({id})");
                id
            }
        };

        if let Some(cache) = self.cache.as_mut() {
            cache.insert(name.to_string(), id);
        }

        Ok(id)
    }

    /// Resolve `names` in order, stopping at the first failure.
    ///
    /// Tags created before the failure are kept on the server.
    pub fn resolve_all(
        &mut self,
        store: &impl CatalogStore,
        names: &[String],
    ) -> Result<Vec<RecordId>> {
        names.iter().map(|name| self.resolve(store, name)).collect()
    }
}
