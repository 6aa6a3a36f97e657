use crate::core::entity::Record;
use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Gallery image of a product, stored as a URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductImage {
    pub id: Uuid,
    pub product: Uuid,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip)]
    pub product_owner: Option<Uuid>,
}

crate::impl_entity!(ProductImage, "product-images", "product_image", owner: product_owner);

impl ProductImage {
    pub fn new(product: Uuid, image: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product,
            image: image.into(),
            created_at: now,
            updated_at: now,
            product_owner: None,
        }
    }
}

impl Record for ProductImage {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(self.id.into()),
            "product" => Some(self.product.into()),
            "image" => Some(self.image.clone().into()),
            "created_at" => Some(self.created_at.into()),
            _ => None,
        }
    }
}
