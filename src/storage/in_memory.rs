//! In-memory storage for records and tokens
//!
//! Tables are insertion-ordered maps behind `RwLock`s, so list results come
//! back in creation order.

use crate::core::entity::Entity;
use crate::core::error::{StoreError, StoreResult};
use crate::core::service::{DataService, TokenStore};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory record table
///
/// Useful for testing and development. Clones share the same table.
#[derive(Clone)]
pub struct InMemoryDataService<T> {
    rows: Arc<RwLock<IndexMap<Uuid, T>>>,
}

impl<T> InMemoryDataService<T> {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(IndexMap::new())),
        }
    }
}

impl<T> Default for InMemoryDataService<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

#[async_trait]
impl<T: Entity> DataService<T> for InMemoryDataService<T> {
    async fn create(&self, entity: T) -> StoreResult<T> {
        let mut rows = self.rows.write().map_err(poisoned)?;

        let id = entity.id();
        if rows.contains_key(&id) {
            return Err(StoreError::Duplicate {
                entity_type: T::resource_name_singular().to_string(),
                id,
            });
        }
        rows.insert(id, entity.clone());

        Ok(entity)
    }

    async fn get(&self, id: &Uuid) -> StoreResult<Option<T>> {
        let rows = self.rows.read().map_err(poisoned)?;

        Ok(rows.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<T>> {
        let rows = self.rows.read().map_err(poisoned)?;

        Ok(rows.values().cloned().collect())
    }

    async fn update(&self, id: &Uuid, entity: T) -> StoreResult<T> {
        let mut rows = self.rows.write().map_err(poisoned)?;

        let slot = rows.get_mut(id).ok_or_else(|| StoreError::NotFound {
            entity_type: T::resource_name_singular().to_string(),
            id: *id,
        })?;
        *slot = entity.clone();

        Ok(entity)
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<bool> {
        let mut rows = self.rows.write().map_err(poisoned)?;

        Ok(rows.shift_remove(id).is_some())
    }

    async fn delete_many(&self, ids: &[Uuid]) -> StoreResult<usize> {
        let mut rows = self.rows.write().map_err(poisoned)?;

        Ok(ids.iter().filter(|id| rows.shift_remove(*id).is_some()).count())
    }
}

/// In-memory token table
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    by_user: Arc<RwLock<HashMap<Uuid, String>>>,
    by_key: Arc<RwLock<HashMap<String, Uuid>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get_or_create(&self, user_id: &Uuid) -> StoreResult<(String, bool)> {
        let mut by_user = self.by_user.write().map_err(poisoned)?;
        if let Some(key) = by_user.get(user_id) {
            return Ok((key.clone(), false));
        }

        let key = Uuid::new_v4().simple().to_string();
        let mut by_key = self.by_key.write().map_err(poisoned)?;
        by_key.insert(key.clone(), *user_id);
        by_user.insert(*user_id, key.clone());

        Ok((key, true))
    }

    async fn resolve(&self, key: &str) -> StoreResult<Option<Uuid>> {
        let by_key = self.by_key.read().map_err(poisoned)?;

        Ok(by_key.get(key).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: Uuid,
        label: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    }

    crate::impl_entity!(Row, "rows", "row");

    fn row(label: &str) -> Row {
        Row {
            id: Uuid::new_v4(),
            label: label.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service: InMemoryDataService<Row> = InMemoryDataService::new();
        let r = row("a");
        service.create(r.clone()).await.unwrap();
        assert_eq!(service.get(&r.id).await.unwrap(), Some(r));
        assert_eq!(service.get(&Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_duplicate_fails() {
        let service: InMemoryDataService<Row> = InMemoryDataService::new();
        let r = row("a");
        service.create(r.clone()).await.unwrap();
        let err = service.create(r).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order_after_delete() {
        let service: InMemoryDataService<Row> = InMemoryDataService::new();
        let rows: Vec<Row> = ["a", "b", "c", "d"].iter().map(|l| row(l)).collect();
        for r in &rows {
            service.create(r.clone()).await.unwrap();
        }
        assert!(service.delete(&rows[1].id).await.unwrap());
        assert!(!service.delete(&rows[1].id).await.unwrap());

        let labels: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels, vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let service: InMemoryDataService<Row> = InMemoryDataService::new();
        let r = row("a");
        let err = service.update(&r.id, r.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_replaces() {
        let service: InMemoryDataService<Row> = InMemoryDataService::new();
        let mut r = row("a");
        service.create(r.clone()).await.unwrap();
        r.label = "b".to_string();
        service.update(&r.id, r.clone()).await.unwrap();
        assert_eq!(service.get(&r.id).await.unwrap().unwrap().label, "b");
    }

    #[tokio::test]
    async fn test_delete_many_counts_existing() {
        let service: InMemoryDataService<Row> = InMemoryDataService::new();
        let a = row("a");
        let b = row("b");
        service.create(a.clone()).await.unwrap();
        service.create(b.clone()).await.unwrap();
        let n = service.delete_many(&[a.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(n, 1);
        assert_eq!(service.list().await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn test_token_get_or_create_is_stable() {
        let store = InMemoryTokenStore::new();
        let user = Uuid::new_v4();
        let (key, created) = store.get_or_create(&user).await.unwrap();
        assert!(created);
        assert_eq!(key.len(), 32);
        let (again, created) = store.get_or_create(&user).await.unwrap();
        assert!(!created);
        assert_eq!(key, again);
        assert_eq!(store.resolve(&key).await.unwrap(), Some(user));
        assert_eq!(store.resolve("unknown").await.unwrap(), None);
    }
}
