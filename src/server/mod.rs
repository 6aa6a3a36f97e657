//! HTTP layer: generic viewsets, the login route and the server builder
//!
//! The `ServerBuilder` mounts:
//! - a health check (`/health`)
//! - the routes of every registered viewset
//! - custom routes such as `/auth/login`

pub mod auth;
pub mod builder;
pub mod entity_registry;
pub mod viewset;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry};
pub use viewset::{Resource, ViewSet};
