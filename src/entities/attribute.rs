use crate::core::entity::Record;
use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name/value pair describing a product (e.g. "colour: red")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductAttribute {
    pub id: Uuid,
    pub product: Uuid,
    pub name: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Owner of the parent product, hydrated before permission checks
    #[serde(skip)]
    pub product_owner: Option<Uuid>,
}

crate::impl_entity!(ProductAttribute, "product-attributes", "product_attribute", owner: product_owner);

impl ProductAttribute {
    pub fn new(product: Uuid, name: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product,
            name: name.into(),
            value: value.into(),
            created_at: now,
            updated_at: now,
            product_owner: None,
        }
    }
}

impl Record for ProductAttribute {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(self.id.into()),
            "product" => Some(self.product.into()),
            "name" => Some(self.name.clone().into()),
            "value" => Some(self.value.clone().into()),
            "created_at" => Some(self.created_at.into()),
            _ => None,
        }
    }
}
