//! Product catalog
//!
//! Products are described statically in the configuration
//! and never mutated while importing.

use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::Deserialize;

/// Kind of product as understood by the remote `type` field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    #[serde(alias = "consu")]
    Consumable,
    Service,
    Combo,
}

impl ProductKind {
    /// Marker sent in the `type` field
    pub fn as_odoo_str(&self) -> &'static str {
        match self {
            Self::Consumable => "consu",
            Self::Service => "service",
            Self::Combo => "combo",
        }
    }
}

/// One product to create
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductDescriptor {
    pub name: String,
    /// Sales price
    pub list_price: f64,
    /// Cost price
    pub standard_price: f64,
    /// SKU, expected to be unique within the catalog
    pub default_code: String,
    #[serde(rename = "type", default)]
    pub kind: ProductKind,
    /// Tag names, resolved in order
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProductDescriptor {
    /// URL to download the product image from, if any.
    ///
    /// An empty URL counts as no image.
    pub fn image_source(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

/// Check the catalog before anything is sent to the server
pub fn validate_catalog(products: &[ProductDescriptor]) -> Result<()> {
    let mut codes = HashSet::new();

    for (index, product) in products.iter().enumerate() {
        if product.name.trim().is_empty() {
            bail!("product #{index} has an empty name");
        }
        if product.default_code.trim().is_empty() {
            bail!("product '{}' has an empty default_code", product.name);
        }
        for (field, price) in [
            ("list_price", product.list_price),
            ("standard_price", product.standard_price),
        ] {
            if !price.is_finite() || price < 0.0 {
                bail!("product '{}' has an invalid {field}: {price}", product.name);
            }
        }
        if !codes.insert(product.default_code.as_str()) {
            bail!(
                "default_code '{}' is used by more than one product",
                product.default_code
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, code: &str) -> ProductDescriptor {
        ProductDescriptor {
            name: name.to_string(),
            list_price: 4000.0,
            standard_price: 2800.0,
            default_code: code.to_string(),
            kind: ProductKind::Consumable,
            tags: vec!["Helmet".to_string()],
            image_url: None,
        }
    }

    #[test]
    fn empty_image_url_means_no_image() {
        let mut p = product("Cigna Helmet", "CIGHEL");
        assert_eq!(p.image_source(), None);

        p.image_url = Some("  ".to_string());
        assert_eq!(p.image_source(), None);

        p.image_url = Some("https://img.example/helmet.jpg".to_string());
        assert_eq!(p.image_source(), Some("https://img.example/helmet.jpg"));
    }

    #[test]
    fn kind_markers() {
        assert_eq!(ProductKind::default().as_odoo_str(), "consu");
        assert_eq!(ProductKind::Service.as_odoo_str(), "service");
        assert_eq!(ProductKind::Combo.as_odoo_str(), "combo");
    }

    #[test]
    fn valid_catalog_passes() {
        let products = [product("Cigna Helmet", "CIGHEL"), product("Lock", "TRINUMPAS")];
        assert!(validate_catalog(&products).is_ok());
        assert!(validate_catalog(&[]).is_ok());
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let products = [product("Cigna Helmet", "CIGHEL"), product("Other", "CIGHEL")];
        let err = validate_catalog(&products).unwrap_err();
        assert!(err.to_string().contains("CIGHEL"));
    }

    #[test]
    fn empty_fields_and_bad_prices_are_rejected() {
        assert!(validate_catalog(&[product("", "CODE")]).is_err());
        assert!(validate_catalog(&[product("Name", " ")]).is_err());

        let mut p = product("Name", "CODE");
        p.list_price = -1.0;
        assert!(validate_catalog(&[p.clone()]).is_err());

        p.list_price = f64::NAN;
        assert!(validate_catalog(&[p]).is_err());
    }
}
