use super::{Category, ProductAttribute, ProductImage, Tag};
use crate::core::entity::Record;
use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a buyer receives a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReceiveType {
    #[default]
    Pickup,
    Delivery,
    Both,
}

impl ReceiveType {
    pub const CHOICES: [&'static str; 3] = ["pickup", "delivery", "both"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiveType::Pickup => "pickup",
            ReceiveType::Delivery => "delivery",
            ReceiveType::Both => "both",
        }
    }
}

/// Related rows loaded for search and nested output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductRelations {
    pub category: Option<Category>,
    pub tags: Vec<Tag>,
    pub attributes: Vec<ProductAttribute>,
    pub images: Vec<ProductImage>,
}

/// A product offered by a seller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,

    /// Owner (the seller who created it)
    pub user: Uuid,

    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    pub price: f64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "default_published")]
    pub is_published: bool,
    #[serde(default)]
    pub receive_type: ReceiveType,
    #[serde(default)]
    pub category: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<Uuid>,

    /// Cover image URL
    #[serde(default)]
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip)]
    pub relations: ProductRelations,
}

fn default_published() -> bool {
    true
}

crate::impl_entity!(Product, "products", "product", owner: user);

impl Product {
    pub fn new(user: Uuid, name: impl Into<String>, price: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user,
            name: name.into(),
            description: String::new(),
            content: String::new(),
            price,
            rating: 0.0,
            is_published: true,
            receive_type: ReceiveType::default(),
            category: None,
            tags: Vec::new(),
            image: None,
            created_at: now,
            updated_at: now,
            relations: ProductRelations::default(),
        }
    }
}

impl Record for Product {
    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "id" => Some(self.id.into()),
            "user" => Some(self.user.into()),
            "name" => Some(self.name.clone().into()),
            "description" => Some(self.description.clone().into()),
            "content" => Some(self.content.clone().into()),
            "price" => Some(self.price.into()),
            "rating" => Some(self.rating.into()),
            "is_published" => Some(self.is_published.into()),
            "receive_type" => Some(self.receive_type.as_str().into()),
            "category" => Some(self.category.into()),
            "tags" => Some(FieldValue::List(
                self.tags.iter().map(|id| (*id).into()).collect(),
            )),
            "created_at" => Some(self.created_at.into()),
            "updated_at" => Some(self.updated_at.into()),
            _ => None,
        }
    }

    fn text_values(&self, field: &str) -> Vec<String> {
        match field {
            "tags__name" => self.relations.tags.iter().map(|t| t.name.clone()).collect(),
            "category__name" => self
                .relations
                .category
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            other => self
                .field_value(other)
                .map(|value| value.texts())
                .unwrap_or_default(),
        }
    }
}
