//! Service traits for records and authentication tokens

use crate::core::entity::Entity;
use crate::core::error::StoreResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Service trait for managing records
///
/// Implementations provide CRUD operations for a specific record type.
/// Handlers are agnostic to the underlying storage mechanism.
#[async_trait]
pub trait DataService<T: Entity>: Send + Sync {
    /// Insert a new record; fails if the id is taken
    async fn create(&self, entity: T) -> StoreResult<T>;

    /// Get a record by ID
    async fn get(&self, id: &Uuid) -> StoreResult<Option<T>>;

    /// List all records in insertion order
    async fn list(&self) -> StoreResult<Vec<T>>;

    /// Replace an existing record
    async fn update(&self, id: &Uuid, entity: T) -> StoreResult<T>;

    /// Delete a record; returns whether it existed
    async fn delete(&self, id: &Uuid) -> StoreResult<bool>;

    /// Delete several records; returns how many existed
    async fn delete_many(&self, ids: &[Uuid]) -> StoreResult<usize>;
}

/// Storage of authentication tokens, one per user
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Return the user's token, creating it on first use
    ///
    /// The boolean is true when a new token was created.
    async fn get_or_create(&self, user_id: &Uuid) -> StoreResult<(String, bool)>;

    /// Find the user a token belongs to
    async fn resolve(&self, key: &str) -> StoreResult<Option<Uuid>>;
}
