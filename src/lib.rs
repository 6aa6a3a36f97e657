//! # Storefront
//!
//! A product catalog REST backend built on axum.
//!
//! ## Features
//!
//! - **Action Dispatch**: serializers and permission sets bound per action or
//!   HTTP verb, with `partial_update` falling back to `update`
//! - **Permission Policies**: composable predicates with record-level owner checks
//! - **Query Pipeline**: search, filter, order and paginate in a fixed order
//! - **Generic ViewSets**: list, retrieve, create, update, destroy, bulk destroy
//!   and requester-scoped listing for every resource
//! - **Token Login**: Argon2 password hashing and `Authorization: Token <key>`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use storefront::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = StorefrontConfig::from_yaml_file("config.yaml")?;
//!     Storefront::new(config).await?.serve().await
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        action::Action,
        auth::{AuthContext, AuthProvider, NoAuthProvider, Principal, RequestContext, Role},
        dispatch::{ActionDispatcher, resolve_permissions, resolve_serializer},
        entity::{Entity, Owned, Record},
        error::{CatalogError, CatalogResult},
        field::{FieldKind, FieldValue},
        permission::{PermissionSet, Policy},
        pipeline::{FilterDef, Lookup, QueryPipeline, run_query},
        query::{PageSettings, PagedResult, PaginatedResponse, QuerySpec},
        serializer::{Projection, SerializerPair},
        service::{DataService, TokenStore},
        validation::{InputSchema, JsonPayload, filters, validators},
    };

    // === Macros ===
    pub use crate::impl_entity;

    // === Records ===
    pub use crate::entities::{
        Category, Product, ProductAttribute, ProductImage, ReceiveType, Tag, User,
    };

    // === Catalog ===
    pub use crate::catalog::{Accounts, Stores, Storefront, TokenAuthProvider};

    // === Storage ===
    pub use crate::storage::{InMemoryDataService, InMemoryTokenStore};

    // === Config ===
    pub use crate::config::{PaginationConfig, SeedUser, ServerConfig, StorefrontConfig};

    // === Server ===
    pub use crate::server::{EntityDescriptor, EntityRegistry, Resource, ServerBuilder, ViewSet};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
