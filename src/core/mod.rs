//! Core module containing the dispatch, permission and query building blocks

pub mod action;
pub mod auth;
pub mod dispatch;
pub mod entity;
pub mod error;
pub mod field;
pub mod permission;
pub mod pipeline;
pub mod query;
pub mod serializer;
pub mod service;
pub mod validation;

pub use action::Action;
pub use auth::{AuthContext, AuthProvider, NoAuthProvider, Principal, RequestContext, Role};
pub use dispatch::{ActionDispatcher, Bindings, resolve_permissions, resolve_serializer};
pub use entity::{Entity, Owned, Record};
pub use error::{CatalogError, CatalogResult};
pub use field::{FieldFormat, FieldKind, FieldValue};
pub use permission::{PermissionSet, Policy};
pub use pipeline::{FilterDef, Lookup, QueryPipeline, run_query};
pub use query::{PageSettings, PagedResult, PaginatedResponse, QuerySpec};
pub use serializer::{Projection, SerializerPair};
pub use service::{DataService, TokenStore};
