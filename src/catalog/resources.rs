//! Catalog resources: serializers, permissions and list pipelines
//!
//! Each resource pairs a store-backed [`Resource`] with the static
//! configuration its viewset dispatches on.

use super::Stores;
use crate::core::action::Action;
use crate::core::auth::{AuthProvider, RequestContext, Role};
use crate::core::dispatch::ActionDispatcher;
use crate::core::error::{CatalogResult, EntityError, RequestError, ValidationError};
use crate::core::field::FieldKind;
use crate::core::permission::{PermissionSet, Policy};
use crate::core::pipeline::{FilterDef, Lookup, QueryPipeline};
use crate::core::query::PageSettings;
use crate::core::serializer::{Projection, SerializerPair};
use crate::core::service::DataService;
use crate::core::validation::{InputSchema, filters, validators};
use crate::entities::{
    Category, Product, ProductAttribute, ProductImage, ProductRelations, ReceiveType, Tag,
};
use crate::server::viewset::{Resource, ViewSet};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

fn reference(raw: &str) -> CatalogResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        ValidationError::InvalidUuid {
            value: raw.to_string(),
        }
        .into()
    })
}

/// Serialize child rows without their `product` back-reference
fn nested<T: Serialize>(rows: &[T]) -> CatalogResult<Value> {
    let projection = Projection::exclude(&["product"]);
    let values = rows
        .iter()
        .map(|row| serde_json::to_value(row).map(|value| projection.apply(value)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(values))
}

/// Item-level writes need the role and ownership of the record
fn owner_writes(role: Role) -> PermissionSet {
    PermissionSet::new(vec![Policy::ReadOnlyOrRole(role), Policy::ReadOnlyOrOwner])
}

fn name_schema() -> InputSchema {
    InputSchema::new()
        .required("name")
        .filter("name", filters::trim())
        .validate("name", validators::is_string())
        .validate("name", validators::string_length(1, 255))
}

// =============================================================================
// Products
// =============================================================================

pub struct ProductResource {
    stores: Stores,
}

impl ProductResource {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }
}

#[async_trait]
impl Resource for ProductResource {
    type Item = Product;

    fn service(&self) -> &Arc<dyn DataService<Product>> {
        &self.stores.products
    }

    async fn hydrate(&self, mut items: Vec<Product>) -> CatalogResult<Vec<Product>> {
        if items.is_empty() {
            return Ok(items);
        }
        let categories: HashMap<Uuid, Category> = self
            .stores
            .categories
            .list()
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let tags: HashMap<Uuid, Tag> = self
            .stores
            .tags
            .list()
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let attributes = self.stores.attributes.list().await?;
        let images = self.stores.images.list().await?;

        for product in &mut items {
            product.relations = ProductRelations {
                category: product.category.and_then(|id| categories.get(&id).cloned()),
                tags: product
                    .tags
                    .iter()
                    .filter_map(|id| tags.get(id).cloned())
                    .collect(),
                attributes: attributes
                    .iter()
                    .filter(|a| a.product == product.id)
                    .cloned()
                    .collect(),
                images: images
                    .iter()
                    .filter(|i| i.product == product.id)
                    .cloned()
                    .collect(),
            };
        }
        Ok(items)
    }

    async fn check_relations(
        &self,
        _ctx: &RequestContext,
        data: &Map<String, Value>,
    ) -> CatalogResult<()> {
        if let Some(raw) = data.get("category").and_then(Value::as_str) {
            let id = reference(raw)?;
            if self.stores.categories.get(&id).await?.is_none() {
                return Err(EntityError::InvalidReference {
                    field: "category".to_string(),
                    id,
                }
                .into());
            }
        }
        if let Some(tags) = data.get("tags").and_then(Value::as_array) {
            for raw in tags.iter().filter_map(Value::as_str) {
                let id = reference(raw)?;
                if self.stores.tags.get(&id).await?.is_none() {
                    return Err(EntityError::InvalidReference {
                        field: "tags".to_string(),
                        id,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn prepare_create(&self, ctx: &RequestContext, data: &mut Map<String, Value>) {
        if let Some(user) = ctx.user_id() {
            data.insert("user".to_string(), json!(user));
        }
    }

    fn represent(&self, product: &Product) -> CatalogResult<Value> {
        let mut value = serde_json::to_value(product)?;
        if let Value::Object(map) = &mut value {
            let relations = &product.relations;
            map.insert(
                "category".to_string(),
                serde_json::to_value(&relations.category)?,
            );
            map.insert("tags".to_string(), serde_json::to_value(&relations.tags)?);
            map.insert("attributes".to_string(), nested(&relations.attributes)?);
            map.insert("images".to_string(), nested(&relations.images)?);
        }
        Ok(value)
    }

    async fn after_destroy(&self, product: &Product) -> CatalogResult<()> {
        let attributes: Vec<Uuid> = product.relations.attributes.iter().map(|a| a.id).collect();
        let images: Vec<Uuid> = product.relations.images.iter().map(|i| i.id).collect();
        let attributes = self.stores.attributes.delete_many(&attributes).await?;
        let images = self.stores.images.delete_many(&images).await?;
        tracing::debug!(product = %product.id, attributes, images, "cascaded product delete");
        Ok(())
    }
}

fn product_input() -> InputSchema {
    let receive_types = ReceiveType::CHOICES.iter().map(|c| c.to_string()).collect();
    name_schema()
        .required("price")
        .filter("price", filters::round_decimals(2))
        .validate("price", validators::is_number())
        .validate("price", validators::positive())
        .optional("description")
        .validate("description", validators::is_string())
        .optional("content")
        .validate("content", validators::is_string())
        .optional("rating")
        .validate("rating", validators::is_number())
        .validate("rating", validators::min_value(0.0))
        .validate("rating", validators::max_value(5.0))
        .optional("is_published")
        .validate("is_published", validators::is_bool())
        .optional("receive_type")
        .validate("receive_type", validators::is_string())
        .validate("receive_type", validators::in_list(receive_types))
        .optional("category")
        .nullable("category")
        .validate("category", validators::uuid())
        .optional("tags")
        .validate("tags", validators::uuid_list())
        .optional("image")
        .nullable("image")
        .validate("image", validators::is_string())
        .validate("image", validators::url())
}

pub fn product_dispatcher() -> ActionDispatcher {
    ActionDispatcher::new(
        SerializerPair::new("product_detail"),
        Policy::ReadOnlyOrRole(Role::Seller).into(),
    )
    .serializer(
        Action::List,
        SerializerPair::new("product_list").with_output(Projection::exclude(&["content"])),
    )
    .serializer(
        "mine",
        SerializerPair::new("product_list").with_output(Projection::exclude(&["content"])),
    )
    .serializer(
        Action::Create,
        SerializerPair::new("product_create").with_input(product_input()),
    )
    .serializer(
        Action::Update,
        SerializerPair::new("product_update").with_input(product_input()),
    )
    .permissions(Action::List, Policy::AllowAny)
    .permissions(Action::Retrieve, Policy::AllowAny)
    .permissions(Action::Update, owner_writes(Role::Seller))
    .permissions(Action::Destroy, owner_writes(Role::Seller))
    .permissions(Action::BulkDestroy, owner_writes(Role::Seller))
    .permissions("mine", Policy::IsAuthenticated)
}

pub fn product_pipeline() -> QueryPipeline {
    QueryPipeline::new()
        .search_fields(&["name", "description", "content", "tags__name"])
        .add_filter(FilterDef::new("categories", "category", Lookup::In, FieldKind::Uuid))
        .add_filter(FilterDef::new("min_price", "price", Lookup::Gte, FieldKind::Number))
        .add_filter(FilterDef::new("max_price", "price", Lookup::Lte, FieldKind::Number))
        .add_filter(FilterDef::new(
            "receive_types",
            "receive_type",
            Lookup::In,
            FieldKind::Text,
        ))
        .add_filter(FilterDef::new("tags", "tags", Lookup::In, FieldKind::Uuid))
        .add_filter(FilterDef::exact("user", FieldKind::Uuid))
        .add_filter(FilterDef::exact("is_published", FieldKind::Boolean))
        .add_filter(FilterDef::exact("rating", FieldKind::Number))
        .ordering_fields(&["name", "price", "rating", "created_at"])
}

pub fn products(
    stores: Stores,
    pagination: PageSettings,
    auth: Arc<dyn AuthProvider>,
) -> ViewSet<ProductResource> {
    ViewSet::new(
        ProductResource::new(stores),
        product_dispatcher(),
        product_pipeline(),
        pagination,
        auth,
    )
}

// =============================================================================
// Categories and tags
// =============================================================================

pub struct CategoryResource {
    stores: Stores,
}

#[async_trait]
impl Resource for CategoryResource {
    type Item = Category;

    fn service(&self) -> &Arc<dyn DataService<Category>> {
        &self.stores.categories
    }

    /// Products keep existing without a category
    async fn after_destroy(&self, category: &Category) -> CatalogResult<()> {
        for mut product in self.stores.products.list().await? {
            if product.category == Some(category.id) {
                product.category = None;
                product.touch();
                let id = product.id;
                self.stores.products.update(&id, product).await?;
            }
        }
        Ok(())
    }
}

pub struct TagResource {
    stores: Stores,
}

#[async_trait]
impl Resource for TagResource {
    type Item = Tag;

    fn service(&self) -> &Arc<dyn DataService<Tag>> {
        &self.stores.tags
    }

    async fn after_destroy(&self, tag: &Tag) -> CatalogResult<()> {
        for mut product in self.stores.products.list().await? {
            if product.tags.contains(&tag.id) {
                product.tags.retain(|id| *id != tag.id);
                product.touch();
                let id = product.id;
                self.stores.products.update(&id, product).await?;
            }
        }
        Ok(())
    }
}

/// Shared by categories and tags: superusers write, everyone reads
fn taxonomy_dispatcher(name: &str) -> ActionDispatcher {
    ActionDispatcher::new(SerializerPair::new(name), Policy::ReadOnlyOrSuperuser.into())
        .serializer(
            Action::Create,
            SerializerPair::new(format!("{name}_write")).with_input(name_schema()),
        )
        .serializer(
            Action::Update,
            SerializerPair::new(format!("{name}_write")).with_input(name_schema()),
        )
        .permissions("mine", Policy::IsAuthenticated)
}

fn taxonomy_pipeline() -> QueryPipeline {
    QueryPipeline::new()
        .search_fields(&["name"])
        .add_filter(FilterDef::exact("name", FieldKind::Text))
        .ordering_fields(&["name", "created_at"])
}

pub fn categories(
    stores: Stores,
    pagination: PageSettings,
    auth: Arc<dyn AuthProvider>,
) -> ViewSet<CategoryResource> {
    ViewSet::new(
        CategoryResource { stores },
        taxonomy_dispatcher("category"),
        taxonomy_pipeline(),
        pagination,
        auth,
    )
}

pub fn tags(
    stores: Stores,
    pagination: PageSettings,
    auth: Arc<dyn AuthProvider>,
) -> ViewSet<TagResource> {
    ViewSet::new(
        TagResource { stores },
        taxonomy_dispatcher("tag"),
        taxonomy_pipeline(),
        pagination,
        auth,
    )
}

// =============================================================================
// Attributes and images
// =============================================================================

/// Owner of every product, for hydrating child rows
async fn product_owners(stores: &Stores) -> CatalogResult<HashMap<Uuid, Uuid>> {
    Ok(stores
        .products
        .list()
        .await?
        .into_iter()
        .map(|p| (p.id, p.user))
        .collect())
}

/// A child row may only be attached to an existing product the requester owns
async fn check_parent_product(
    stores: &Stores,
    ctx: &RequestContext,
    data: &Map<String, Value>,
) -> CatalogResult<()> {
    let Some(raw) = data.get("product").and_then(Value::as_str) else {
        return Ok(());
    };
    let id = reference(raw)?;
    let Some(product) = stores.products.get(&id).await? else {
        return Err(EntityError::InvalidReference {
            field: "product".to_string(),
            id,
        }
        .into());
    };
    if ctx.auth.is_superuser() || ctx.user_id() == Some(product.user) {
        Ok(())
    } else {
        tracing::warn!(product = %id, user = ?ctx.user_id(), "attach to foreign product denied");
        Err(RequestError::Forbidden {
            message: "You do not own this product".to_string(),
        }
        .into())
    }
}

pub struct AttributeResource {
    stores: Stores,
}

#[async_trait]
impl Resource for AttributeResource {
    type Item = ProductAttribute;

    fn service(&self) -> &Arc<dyn DataService<ProductAttribute>> {
        &self.stores.attributes
    }

    async fn hydrate(&self, mut items: Vec<ProductAttribute>) -> CatalogResult<Vec<ProductAttribute>> {
        let owners = product_owners(&self.stores).await?;
        for item in &mut items {
            item.product_owner = owners.get(&item.product).copied();
        }
        Ok(items)
    }

    async fn check_relations(
        &self,
        ctx: &RequestContext,
        data: &Map<String, Value>,
    ) -> CatalogResult<()> {
        check_parent_product(&self.stores, ctx, data).await
    }
}

pub struct ImageResource {
    stores: Stores,
}

#[async_trait]
impl Resource for ImageResource {
    type Item = ProductImage;

    fn service(&self) -> &Arc<dyn DataService<ProductImage>> {
        &self.stores.images
    }

    async fn hydrate(&self, mut items: Vec<ProductImage>) -> CatalogResult<Vec<ProductImage>> {
        let owners = product_owners(&self.stores).await?;
        for item in &mut items {
            item.product_owner = owners.get(&item.product).copied();
        }
        Ok(items)
    }

    async fn check_relations(
        &self,
        ctx: &RequestContext,
        data: &Map<String, Value>,
    ) -> CatalogResult<()> {
        check_parent_product(&self.stores, ctx, data).await
    }
}

fn product_child_dispatcher(name: &str, create: InputSchema, update: InputSchema) -> ActionDispatcher {
    ActionDispatcher::new(
        SerializerPair::new(name),
        Policy::ReadOnlyOrRole(Role::Seller).into(),
    )
    .serializer(
        Action::Create,
        SerializerPair::new(format!("{name}_create")).with_input(create),
    )
    .serializer(
        Action::Update,
        SerializerPair::new(format!("{name}_update")).with_input(update),
    )
    .permissions(Action::Update, owner_writes(Role::Seller))
    .permissions(Action::Destroy, owner_writes(Role::Seller))
    .permissions(Action::BulkDestroy, owner_writes(Role::Seller))
    .permissions("mine", Policy::IsAuthenticated)
}

fn attribute_update() -> InputSchema {
    name_schema()
        .required("value")
        .filter("value", filters::trim())
        .validate("value", validators::is_string())
        .validate("value", validators::string_length(1, 255))
}

pub fn attributes(
    stores: Stores,
    pagination: PageSettings,
    auth: Arc<dyn AuthProvider>,
) -> ViewSet<AttributeResource> {
    let create = attribute_update()
        .required("product")
        .validate("product", validators::uuid());
    ViewSet::new(
        AttributeResource { stores },
        product_child_dispatcher("product_attribute", create, attribute_update()),
        QueryPipeline::new()
            .search_fields(&["name", "value"])
            .add_filter(FilterDef::exact("product", FieldKind::Uuid))
            .add_filter(FilterDef::exact("name", FieldKind::Text))
            .ordering_fields(&["name", "created_at"]),
        pagination,
        auth,
    )
}

fn image_update() -> InputSchema {
    InputSchema::new()
        .required("image")
        .filter("image", filters::trim())
        .validate("image", validators::is_string())
        .validate("image", validators::url())
}

pub fn images(
    stores: Stores,
    pagination: PageSettings,
    auth: Arc<dyn AuthProvider>,
) -> ViewSet<ImageResource> {
    let create = image_update()
        .required("product")
        .validate("product", validators::uuid());
    ViewSet::new(
        ImageResource { stores },
        product_child_dispatcher("product_image", create, image_update()),
        QueryPipeline::new()
            .add_filter(FilterDef::exact("product", FieldKind::Uuid))
            .ordering_fields(&["created_at"]),
        pagination,
        auth,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::{AuthContext, Principal};
    use axum::http::Method;

    fn ctx(method: Method, action: Action, auth: AuthContext) -> RequestContext {
        RequestContext::new(method, action, auth)
    }

    fn seller(id: Uuid) -> AuthContext {
        AuthContext::User(Principal {
            user_id: id,
            username: "seller".to_string(),
            role: Role::Seller,
            is_superuser: false,
        })
    }

    #[test]
    fn test_product_list_hides_content() {
        let dispatcher = product_dispatcher();
        let list = ctx(Method::GET, Action::List, AuthContext::Anonymous);
        let serializer = dispatcher.serializer_for(&list);
        assert_eq!(serializer.name(), "product_list");
        let out = serializer.represent(json!({"name": "Lamp", "content": "long"}));
        assert_eq!(out, json!({"name": "Lamp"}));
    }

    #[test]
    fn test_product_partial_update_uses_update_serializer() {
        let dispatcher = product_dispatcher();
        let patch = ctx(Method::PATCH, Action::PartialUpdate, seller(Uuid::new_v4()));
        assert_eq!(dispatcher.serializer_for(&patch).name(), "product_update");
    }

    #[test]
    fn test_product_permissions() {
        let dispatcher = product_dispatcher();
        let anon_list = ctx(Method::GET, Action::List, AuthContext::Anonymous);
        assert!(dispatcher.check_permissions(&anon_list).is_ok());

        let anon_create = ctx(Method::POST, Action::Create, AuthContext::Anonymous);
        let err = dispatcher.check_permissions(&anon_create).unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");

        let owner = Uuid::new_v4();
        let product = Product::new(owner, "Lamp", 10.0);
        let by_owner = ctx(Method::PUT, Action::Update, seller(owner));
        assert!(dispatcher.check_object_permissions(&by_owner, &product).is_ok());

        let by_other = ctx(Method::PUT, Action::Update, seller(Uuid::new_v4()));
        assert!(dispatcher.check_permissions(&by_other).is_ok());
        let err = dispatcher
            .check_object_permissions(&by_other, &product)
            .unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[test]
    fn test_product_input_cleans_payload() {
        let schema = product_input();
        let cleaned = schema
            .validate_and_filter(json!({"name": "  Lamp ", "price": 9.999, "user": "x"}), false)
            .unwrap();
        assert_eq!(cleaned["name"], "Lamp");
        assert_eq!(cleaned["price"], json!(10.0));
        assert!(cleaned.get("user").is_none());

        let errors = schema
            .validate_and_filter(json!({"name": "Lamp", "price": -1, "rating": 7}), false)
            .unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["price", "rating"]);
    }

    #[test]
    fn test_taxonomy_writes_need_superuser() {
        let dispatcher = taxonomy_dispatcher("category");
        let create = ctx(Method::POST, Action::Create, seller(Uuid::new_v4()));
        assert_eq!(
            dispatcher.check_permissions(&create).unwrap_err().error_code(),
            "FORBIDDEN"
        );
        let root = AuthContext::User(Principal {
            user_id: Uuid::new_v4(),
            username: "root".to_string(),
            role: Role::Admin,
            is_superuser: true,
        });
        assert!(dispatcher
            .check_permissions(&ctx(Method::POST, Action::Create, root))
            .is_ok());
    }

    #[tokio::test]
    async fn test_product_hydrate_and_represent() {
        let stores = Stores::in_memory();
        let category = stores.categories.create(Category::new("Lighting")).await.unwrap();
        let tag = stores.tags.create(Tag::new("vintage")).await.unwrap();
        let mut product = Product::new(Uuid::new_v4(), "Lamp", 10.0);
        product.category = Some(category.id);
        product.tags = vec![tag.id];
        let product = stores.products.create(product).await.unwrap();
        stores
            .attributes
            .create(ProductAttribute::new(product.id, "colour", "red"))
            .await
            .unwrap();

        let resource = ProductResource::new(stores.clone());
        let hydrated = resource.hydrate(vec![product]).await.unwrap();
        let value = resource.represent(&hydrated[0]).unwrap();
        assert_eq!(value["category"]["name"], "Lighting");
        assert_eq!(value["tags"][0]["name"], "vintage");
        assert_eq!(value["attributes"][0]["value"], "red");
        assert!(value["attributes"][0].get("product").is_none());
        assert_eq!(value["images"], json!([]));
    }

    #[tokio::test]
    async fn test_product_relations_must_exist() {
        let stores = Stores::in_memory();
        let resource = ProductResource::new(stores);
        let anon = ctx(Method::POST, Action::Create, AuthContext::Anonymous);
        let mut data = Map::new();
        data.insert("category".to_string(), json!(Uuid::new_v4()));
        let err = resource.check_relations(&anon, &data).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REFERENCE");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_attribute_requires_own_product() {
        let stores = Stores::in_memory();
        let owner = Uuid::new_v4();
        let product = stores.products.create(Product::new(owner, "Lamp", 10.0)).await.unwrap();
        let mut data = Map::new();
        data.insert("product".to_string(), json!(product.id));

        let mine = ctx(Method::POST, Action::Create, seller(owner));
        assert!(check_parent_product(&stores, &mine, &data).await.is_ok());

        let other = ctx(Method::POST, Action::Create, seller(Uuid::new_v4()));
        let err = check_parent_product(&stores, &other, &data).await.unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_deleting_tag_detaches_it() {
        let stores = Stores::in_memory();
        let tag = stores.tags.create(Tag::new("sale")).await.unwrap();
        let mut product = Product::new(Uuid::new_v4(), "Lamp", 10.0);
        product.tags = vec![tag.id];
        let product = stores.products.create(product).await.unwrap();

        let resource = TagResource {
            stores: stores.clone(),
        };
        resource.after_destroy(&tag).await.unwrap();
        let stored = stores.products.get(&product.id).await.unwrap().unwrap();
        assert!(stored.tags.is_empty());
    }
}
