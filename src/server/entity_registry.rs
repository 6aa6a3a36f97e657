//! Registry of resource descriptors and their routes

use axum::Router;
use indexmap::IndexMap;

/// Trait that describes how to build routes for a resource
///
/// Every viewset implements this to expose its list, item and named routes.
pub trait EntityDescriptor: Send + Sync {
    /// The singular name (e.g., "product")
    fn entity_type(&self) -> &str;

    /// The plural form, used as the URL prefix (e.g., "products")
    fn plural(&self) -> &str;

    /// Build the routes for this resource, state included
    fn build_routes(&self) -> Router;
}

/// Registry for all resources in the application, keyed by plural
#[derive(Default)]
pub struct EntityRegistry {
    descriptors: IndexMap<String, Box<dyn EntityDescriptor>>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            descriptors: IndexMap::new(),
        }
    }

    /// Register a descriptor; a second one with the same plural replaces the first
    pub fn register(&mut self, descriptor: Box<dyn EntityDescriptor>) {
        let plural = descriptor.plural().to_string();
        if self.descriptors.insert(plural.clone(), descriptor).is_some() {
            tracing::warn!(resource = %plural, "resource registered twice, keeping the last");
        }
    }

    /// Merge all registered routes into one router
    pub fn build_routes(&self) -> Router {
        let mut router = Router::new();

        for descriptor in self.descriptors.values() {
            tracing::debug!(resource = descriptor.plural(), "mounting resource");
            router = router.merge(descriptor.build_routes());
        }

        router
    }

    /// Registered plurals, in registration order
    pub fn resources(&self) -> Vec<&str> {
        self.descriptors.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDescriptor {
        entity_type: String,
        plural: String,
    }

    impl MockDescriptor {
        fn new(entity_type: &str, plural: &str) -> Self {
            Self {
                entity_type: entity_type.to_string(),
                plural: plural.to_string(),
            }
        }
    }

    impl EntityDescriptor for MockDescriptor {
        fn entity_type(&self) -> &str {
            &self.entity_type
        }

        fn plural(&self) -> &str {
            &self.plural
        }

        fn build_routes(&self) -> Router {
            Router::new()
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        assert!(EntityRegistry::new().resources().is_empty());
        assert!(EntityRegistry::default().resources().is_empty());
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = EntityRegistry::new();
        registry.register(Box::new(MockDescriptor::new("product", "products")));
        registry.register(Box::new(MockDescriptor::new("category", "categories")));
        registry.register(Box::new(MockDescriptor::new("tag", "tags")));
        assert_eq!(registry.resources(), vec!["products", "categories", "tags"]);
    }

    #[test]
    fn test_register_duplicate_replaces() {
        let mut registry = EntityRegistry::new();
        registry.register(Box::new(MockDescriptor::new("product", "products")));
        registry.register(Box::new(MockDescriptor::new("item", "products")));
        assert_eq!(registry.resources().len(), 1);
    }

    #[test]
    fn test_build_routes_with_entities() {
        let mut registry = EntityRegistry::new();
        registry.register(Box::new(MockDescriptor::new("product", "products")));
        let _router = registry.build_routes();
    }
}
