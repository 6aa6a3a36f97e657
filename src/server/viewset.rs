//! Generic per-resource request handlers
//!
//! A [`ViewSet`] ties one [`Resource`] to its [`ActionDispatcher`] and
//! [`QueryPipeline`] and exposes the standard routes:
//!
//! - `GET /{plural}`: list (search, filter, order, paginate)
//! - `POST /{plural}`: create
//! - `DELETE /{plural}`: bulk destroy, body `{"ids": [...]}`
//! - `GET /{plural}/mine`: list restricted to the requester's records
//! - `GET|PUT|PATCH|DELETE /{plural}/{id}`: retrieve, update, partial update, destroy
//!
//! Every handler resolves permissions before touching the store, then checks
//! object permissions once the target record is loaded.

use super::entity_registry::EntityDescriptor;
use crate::core::action::Action;
use crate::core::auth::{AuthProvider, RequestContext};
use crate::core::dispatch::ActionDispatcher;
use crate::core::entity::{Entity, Owned, Record};
use crate::core::error::{
    CatalogError, CatalogResult, EntityError, FieldValidationError, RequestError, ValidationError,
};
use crate::core::pipeline::QueryPipeline;
use crate::core::query::{PageSettings, PagedResult, PaginatedResponse, QuerySpec};
use crate::core::serializer::SerializerPair;
use crate::core::service::DataService;
use crate::core::validation::JsonPayload;
use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Resource-specific behaviour plugged into the generic handlers
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Item: Record + Serialize + DeserializeOwned;

    fn service(&self) -> &Arc<dyn DataService<Self::Item>>;

    /// Load related data needed for search, ownership or output
    async fn hydrate(&self, items: Vec<Self::Item>) -> CatalogResult<Vec<Self::Item>> {
        Ok(items)
    }

    /// Verify referenced records exist and may be used by the requester
    async fn check_relations(
        &self,
        _ctx: &RequestContext,
        _data: &Map<String, Value>,
    ) -> CatalogResult<()> {
        Ok(())
    }

    /// Server-assigned fields on create
    fn prepare_create(&self, _ctx: &RequestContext, _data: &mut Map<String, Value>) {}

    /// Full JSON representation, before the serializer projection
    fn represent(&self, item: &Self::Item) -> CatalogResult<Value> {
        Ok(serde_json::to_value(item)?)
    }

    /// Runs after a record has been deleted
    async fn after_destroy(&self, _item: &Self::Item) -> CatalogResult<()> {
        Ok(())
    }
}

/// Handlers and routing for one resource
pub struct ViewSet<R: Resource> {
    resource: Arc<R>,
    dispatcher: Arc<ActionDispatcher>,
    pipeline: Arc<QueryPipeline>,
    pagination: PageSettings,
    auth: Arc<dyn AuthProvider>,
}

impl<R: Resource> Clone for ViewSet<R> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            dispatcher: self.dispatcher.clone(),
            pipeline: self.pipeline.clone(),
            pagination: self.pagination,
            auth: self.auth.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BulkDestroyRequest {
    ids: Vec<Uuid>,
}

impl<R: Resource> ViewSet<R> {
    pub fn new(
        resource: R,
        dispatcher: ActionDispatcher,
        pipeline: QueryPipeline,
        pagination: PageSettings,
        auth: Arc<dyn AuthProvider>,
    ) -> Self {
        Self {
            resource: Arc::new(resource),
            dispatcher: Arc::new(dispatcher),
            pipeline: Arc::new(pipeline),
            pagination,
            auth,
        }
    }

    pub fn resource(&self) -> &R {
        &self.resource
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    async fn context(
        &self,
        method: Method,
        action: Action,
        headers: &HeaderMap,
    ) -> CatalogResult<RequestContext> {
        let auth = self.auth.extract_context(headers).await?;
        Ok(RequestContext::new(method, action, auth))
    }

    /// Context for a standard route, the action derived from the verb
    async fn route_context(
        &self,
        method: Method,
        on_item: bool,
        headers: &HeaderMap,
    ) -> CatalogResult<RequestContext> {
        let action = Action::from_route(&method, on_item).ok_or_else(|| {
            CatalogError::from(RequestError::MethodNotAllowed {
                method: method.to_string(),
                resource: R::Item::resource_name().to_string(),
            })
        })?;
        self.context(method, action, headers).await
    }

    async fn load(&self, id: &Uuid) -> CatalogResult<R::Item> {
        let item = self.resource.service().get(id).await?.ok_or_else(|| {
            CatalogError::from(EntityError::NotFound {
                entity_type: R::Item::resource_name_singular().to_string(),
                id: *id,
            })
        })?;
        self.resource
            .hydrate(vec![item])
            .await?
            .pop()
            .ok_or_else(|| CatalogError::Internal("hydration dropped a record".to_string()))
    }

    async fn reload(&self, item: R::Item) -> CatalogResult<R::Item> {
        let id = item.id();
        self.resource
            .hydrate(vec![item])
            .await?
            .pop()
            .ok_or_else(|| CatalogError::Internal(format!("hydration dropped record {}", id)))
    }

    fn render(&self, serializer: &SerializerPair, item: &R::Item) -> CatalogResult<Value> {
        Ok(serializer.represent(self.resource.represent(item)?))
    }

    fn render_page(
        &self,
        serializer: &SerializerPair,
        page: PagedResult<R::Item>,
    ) -> CatalogResult<PaginatedResponse<Value>> {
        let results = page
            .items
            .iter()
            .map(|item| self.render(serializer, item))
            .collect::<CatalogResult<Vec<_>>>()?;
        Ok(PaginatedResponse::from(PagedResult {
            items: results,
            page: page.page,
            page_size: page.page_size,
            total_count: page.total_count,
        }))
    }

    /// Validate a write and return the cleaned object
    async fn clean(
        &self,
        ctx: &RequestContext,
        serializer: &SerializerPair,
        payload: Value,
        partial: bool,
    ) -> CatalogResult<Map<String, Value>> {
        let cleaned = serializer.validate(payload, partial, &ctx.action, R::Item::resource_name())?;
        let Value::Object(data) = cleaned else {
            return Err(CatalogError::Internal("schema produced a non-object".to_string()));
        };
        self.resource.check_relations(ctx, &data).await?;
        Ok(data)
    }

    async fn list_items(
        &self,
        ctx: &RequestContext,
        params: &[(String, String)],
        mine: bool,
    ) -> CatalogResult<PaginatedResponse<Value>> {
        self.dispatcher.check_permissions(ctx)?;

        let items = self.resource.service().list().await?;
        let mut items = self.resource.hydrate(items).await?;
        if mine {
            let user = ctx.user_id();
            items.retain(|item| user.is_some() && item.owner_id() == user);
        }

        let spec = QuerySpec::from_pairs(params, &self.pagination);
        let page = self.pipeline.run(items, &spec);
        self.render_page(self.dispatcher.serializer_for(ctx), page)
    }

    async fn write(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        payload: Value,
        partial: bool,
    ) -> CatalogResult<Value> {
        self.dispatcher.check_permissions(ctx)?;
        let existing = self.load(&id).await?;
        self.dispatcher.check_object_permissions(ctx, &existing)?;

        let serializer = self.dispatcher.serializer_for(ctx);
        let data = self.clean(ctx, serializer, payload, partial).await?;

        let Value::Object(mut merged) = serde_json::to_value(&existing)? else {
            return Err(CatalogError::Internal("record is not a JSON object".to_string()));
        };
        for (key, value) in data {
            merged.insert(key, value);
        }
        merged.insert("id".to_string(), json!(existing.id()));
        merged.insert("created_at".to_string(), json!(existing.created_at()));
        merged.insert("updated_at".to_string(), json!(Utc::now()));

        let item: R::Item = serde_json::from_value(Value::Object(merged))?;
        let saved = self.resource.service().update(&id, item).await?;
        let saved = self.reload(saved).await?;
        tracing::info!(resource = R::Item::resource_name(), %id, partial, "record updated");
        self.render(serializer, &saved)
    }
}

fn parse_id(raw: &str) -> CatalogResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| {
        RequestError::InvalidEntityId {
            id: raw.to_string(),
        }
        .into()
    })
}

async fn list<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> CatalogResult<Json<PaginatedResponse<Value>>> {
    let ctx = vs.route_context(method, false, &headers).await?;
    Ok(Json(vs.list_items(&ctx, &params, false).await?))
}

async fn mine<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> CatalogResult<Json<PaginatedResponse<Value>>> {
    let ctx = vs.context(method, Action::Named("mine".to_string()), &headers).await?;
    Ok(Json(vs.list_items(&ctx, &params, true).await?))
}

async fn retrieve<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> CatalogResult<Json<Value>> {
    let ctx = vs.route_context(method, true, &headers).await?;
    let id = parse_id(&id)?;
    vs.dispatcher.check_permissions(&ctx)?;

    let item = vs.load(&id).await?;
    vs.dispatcher.check_object_permissions(&ctx, &item)?;
    Ok(Json(vs.render(vs.dispatcher.serializer_for(&ctx), &item)?))
}

async fn create<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    JsonPayload(payload): JsonPayload,
) -> CatalogResult<(StatusCode, Json<Value>)> {
    let ctx = vs.route_context(method, false, &headers).await?;
    vs.dispatcher.check_permissions(&ctx)?;

    let serializer = vs.dispatcher.serializer_for(&ctx);
    let mut data = vs.clean(&ctx, serializer, payload, false).await?;
    vs.resource.prepare_create(&ctx, &mut data);

    let now = json!(Utc::now());
    data.insert("id".to_string(), json!(Uuid::new_v4()));
    data.insert("created_at".to_string(), now.clone());
    data.insert("updated_at".to_string(), now);

    let item: R::Item = serde_json::from_value(Value::Object(data))?;
    let created = vs.resource.service().create(item).await?;
    tracing::info!(
        resource = R::Item::resource_name(),
        id = %created.id(),
        user = ?ctx.user_id(),
        "record created"
    );
    let created = vs.reload(created).await?;
    Ok((StatusCode::CREATED, Json(vs.render(serializer, &created)?)))
}

async fn update<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    Path(id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> CatalogResult<Json<Value>> {
    let ctx = vs.route_context(method, true, &headers).await?;
    let id = parse_id(&id)?;
    Ok(Json(vs.write(&ctx, id, payload, false).await?))
}

async fn partial_update<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    Path(id): Path<String>,
    JsonPayload(payload): JsonPayload,
) -> CatalogResult<Json<Value>> {
    let ctx = vs.route_context(method, true, &headers).await?;
    let id = parse_id(&id)?;
    Ok(Json(vs.write(&ctx, id, payload, true).await?))
}

async fn destroy<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> CatalogResult<StatusCode> {
    let ctx = vs.route_context(method, true, &headers).await?;
    let id = parse_id(&id)?;
    vs.dispatcher.check_permissions(&ctx)?;

    let item = vs.load(&id).await?;
    vs.dispatcher.check_object_permissions(&ctx, &item)?;

    vs.resource.service().delete(&id).await?;
    vs.resource.after_destroy(&item).await?;
    tracing::info!(resource = R::Item::resource_name(), %id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// All-or-nothing: every id must exist and pass the object check
async fn bulk_destroy<R: Resource>(
    State(vs): State<ViewSet<R>>,
    method: Method,
    headers: HeaderMap,
    JsonPayload(payload): JsonPayload,
) -> CatalogResult<Json<Value>> {
    let ctx = vs.route_context(method, false, &headers).await?;
    vs.dispatcher.check_permissions(&ctx)?;

    let request: BulkDestroyRequest = serde_json::from_value(payload).map_err(|e| {
        CatalogError::from(ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "ids".to_string(),
                message: e.to_string(),
            },
        ]))
    })?;

    let mut targets = Vec::with_capacity(request.ids.len());
    for id in &request.ids {
        let item = vs.load(id).await?;
        vs.dispatcher.check_object_permissions(&ctx, &item)?;
        targets.push(item);
    }

    let ids: Vec<Uuid> = targets.iter().map(|item| item.id()).collect();
    let deleted = vs.resource.service().delete_many(&ids).await?;
    for item in &targets {
        vs.resource.after_destroy(item).await?;
    }
    tracing::info!(resource = R::Item::resource_name(), deleted, "bulk delete");
    Ok(Json(json!({ "deleted": deleted })))
}

impl<R: Resource> EntityDescriptor for ViewSet<R> {
    fn entity_type(&self) -> &str {
        R::Item::resource_name_singular()
    }

    fn plural(&self) -> &str {
        R::Item::resource_name()
    }

    fn build_routes(&self) -> Router {
        let plural = R::Item::resource_name();
        Router::new()
            .route(
                &format!("/{plural}"),
                get(list::<R>).post(create::<R>).delete(bulk_destroy::<R>),
            )
            .route(&format!("/{plural}/mine"), get(mine::<R>))
            .route(
                &format!("/{plural}/{{id}}"),
                get(retrieve::<R>)
                    .put(update::<R>)
                    .patch(partial_update::<R>)
                    .delete(destroy::<R>),
            )
            .with_state(self.clone())
    }
}
