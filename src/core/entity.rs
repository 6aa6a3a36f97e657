//! Entity traits defining the core abstraction for all catalog records

use crate::core::field::FieldValue;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Base trait for all stored records.
///
/// Every record has a unique id and creation/modification timestamps, and
/// knows the resource name it is exposed under.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The plural resource name used in URLs (e.g., "products", "categories")
    fn resource_name() -> &'static str;

    /// The singular resource name (e.g., "product", "category")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this record
    fn id(&self) -> Uuid;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Get the last update timestamp
    fn updated_at(&self) -> DateTime<Utc>;
}

/// Records whose write access can be restricted to an owning user
pub trait Owned {
    /// The id of the user recorded as owner, if any
    fn owner_id(&self) -> Option<Uuid> {
        None
    }
}

/// Records that can flow through the query pipeline
///
/// `field_value` exposes columns for filtering and ordering; `text_values`
/// exposes searchable text, which may come from related rows (e.g.
/// `tags__name` on a product).
pub trait Record: Entity + Owned {
    /// Get the value of a column by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Searchable text for a field
    fn text_values(&self, field: &str) -> Vec<String> {
        self.field_value(field)
            .map(|value| value.texts())
            .unwrap_or_default()
    }
}
