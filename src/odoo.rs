//! Remote product and tag records

use std::collections::BTreeMap;

use anyhow::{Context as _, Result};
use xmlrpc::Value;

use crate::{
    catalog::{ProductDescriptor, ProductKind},
    image::ImagePayload,
    rpc::{RecordId, RpcEndpoint, record_id, record_ids},
    session::Session,
};

const TAG_MODEL: &str = "product.tag";
const PRODUCT_MODEL: &str = "product.template";

/// `(6, 0, ids)`: replace all linked records with `ids`
const REPLACE_ALL_LINKS: i32 = 6;

/// Remote operations needed to import products
#[cfg_attr(test, mockall::automock)]
pub trait CatalogStore {
    /// Ids of tags named exactly `name`
    fn search_tags(&self, name: &str) -> Result<Vec<RecordId>>;
    fn create_tag(&self, name: &str) -> Result<RecordId>;
    fn create_product(&self, values: &ProductValues) -> Result<RecordId>;
}

/// Field values of a product to create
#[derive(Debug, Clone, PartialEq)]
pub struct ProductValues {
    pub name: String,
    pub list_price: f64,
    pub standard_price: f64,
    pub default_code: String,
    pub kind: ProductKind,
    pub tag_ids: Vec<RecordId>,
    pub image: ImagePayload,
}

impl ProductValues {
    pub fn new(product: &ProductDescriptor, tag_ids: Vec<RecordId>, image: ImagePayload) -> Self {
        Self {
            name: product.name.clone(),
            list_price: product.list_price,
            standard_price: product.standard_price,
            default_code: product.default_code.clone(),
            kind: product.kind,
            tag_ids,
            image,
        }
    }

    /// Field map as sent to `create`
    pub fn to_value(&self) -> Value {
        let tag_ids = self.tag_ids.iter().copied().map(Value::Int).collect();
        let image = match &self.image {
            ImagePayload::Absent => Value::Bool(false),
            ImagePayload::Encoded(data) => Value::String(data.clone()),
        };

        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::String(self.name.clone()));
        fields.insert("list_price".to_string(), Value::Double(self.list_price));
        fields.insert("standard_price".to_string(), Value::Double(self.standard_price));
        fields.insert("default_code".to_string(), Value::String(self.default_code.clone()));
        fields.insert("type".to_string(), Value::String(self.kind.as_odoo_str().to_string()));
        fields.insert(
            "product_tag_ids".to_string(),
            Value::Array(vec![Value::Array(vec![
                Value::Int(REPLACE_ALL_LINKS),
                Value::Int(0),
                Value::Array(tag_ids),
            ])]),
        );
        fields.insert("image_1920".to_string(), image);
        Value::Struct(fields)
    }
}

/// [CatalogStore] backed by the `object` service
pub struct OdooStore<E> {
    endpoint: E,
    session: Session,
}

impl<E: RpcEndpoint> OdooStore<E> {
    pub fn new(endpoint: E, session: Session) -> Self {
        Self { endpoint, session }
    }

    fn execute_kw(&self, model: &str, method: &str, args: Vec<Value>) -> Result<Value> {
        self.endpoint
            .call(
                "execute_kw",
                vec![
                    Value::String(self.session.database.clone()),
                    Value::Int(self.session.uid),
                    Value::String(self.session.password.clone()),
                    Value::String(model.to_string()),
                    Value::String(method.to_string()),
                    Value::Array(args),
                ],
            )
            .with_context(|| format!("{model}.{method} failed"))
    }
}

impl<E: RpcEndpoint> CatalogStore for OdooStore<E> {
    fn search_tags(&self, name: &str) -> Result<Vec<RecordId>> {
        let domain = Value::Array(vec![Value::Array(vec![
            Value::String("name".to_string()),
            Value::String("=".to_string()),
            Value::String(name.to_string()),
        ])]);
        record_ids(&self.execute_kw(TAG_MODEL, "search", vec![domain])?)
    }

    fn create_tag(&self, name: &str) -> Result<RecordId> {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        record_id(&self.execute_kw(TAG_MODEL, "create", vec![Value::Struct(fields)])?)
    }

    fn create_product(&self, values: &ProductValues) -> Result<RecordId> {
        record_id(&self.execute_kw(PRODUCT_MODEL, "create", vec![values.to_value()])?)
    }
}
