//! The storefront catalog: stores, accounts and resource viewsets

pub mod account;
pub mod resources;

pub use account::{Accounts, LoginResponse, NewUser, TokenAuthProvider};

use crate::config::StorefrontConfig;
use crate::core::auth::AuthProvider;
use crate::core::service::{DataService, TokenStore};
use crate::entities::{Category, Product, ProductAttribute, ProductImage, Tag, User};
use crate::server::{ServerBuilder, auth};
use crate::storage::{InMemoryDataService, InMemoryTokenStore};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;

/// Every table the catalog reads and writes
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn DataService<User>>,
    pub tokens: Arc<dyn TokenStore>,
    pub categories: Arc<dyn DataService<Category>>,
    pub tags: Arc<dyn DataService<Tag>>,
    pub products: Arc<dyn DataService<Product>>,
    pub attributes: Arc<dyn DataService<ProductAttribute>>,
    pub images: Arc<dyn DataService<ProductImage>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryDataService::<User>::new()),
            tokens: Arc::new(InMemoryTokenStore::new()),
            categories: Arc::new(InMemoryDataService::<Category>::new()),
            tags: Arc::new(InMemoryDataService::<Tag>::new()),
            products: Arc::new(InMemoryDataService::<Product>::new()),
            attributes: Arc::new(InMemoryDataService::<ProductAttribute>::new()),
            images: Arc::new(InMemoryDataService::<ProductImage>::new()),
        }
    }
}

/// A configured storefront, ready to be served
///
/// # Example
///
/// ```ignore
/// let storefront = Storefront::new(StorefrontConfig::from_yaml_file("config.yaml")?).await?;
/// storefront.serve().await?;
/// ```
pub struct Storefront {
    config: StorefrontConfig,
    stores: Stores,
    accounts: Accounts,
}

impl Storefront {
    /// Validate the configuration and create the seed accounts
    pub async fn new(config: StorefrontConfig) -> Result<Self> {
        Self::with_stores(config, Stores::in_memory()).await
    }

    pub async fn with_stores(config: StorefrontConfig, stores: Stores) -> Result<Self> {
        config.validate()?;
        let accounts = Accounts::new(stores.users.clone(), stores.tokens.clone());
        let seeded = accounts
            .seed(&config.users)
            .await
            .map_err(|e| anyhow::anyhow!("seeding users failed: {}", e))?;
        tracing::info!(seeded, "storefront initialized");
        Ok(Self {
            config,
            stores,
            accounts,
        })
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    fn builder(&self) -> ServerBuilder {
        let auth: Arc<dyn AuthProvider> = Arc::new(TokenAuthProvider::new(self.accounts.clone()));
        let stores = &self.stores;
        let pages = |resource: &str| self.config.page_settings(resource);

        ServerBuilder::new()
            .register(resources::products(stores.clone(), pages("products"), auth.clone()))
            .register(resources::categories(stores.clone(), pages("categories"), auth.clone()))
            .register(resources::tags(stores.clone(), pages("tags"), auth.clone()))
            .register(resources::attributes(
                stores.clone(),
                pages("product-attributes"),
                auth.clone(),
            ))
            .register(resources::images(stores.clone(), pages("product-images"), auth))
            .with_custom_routes(auth::routes(self.accounts.clone()))
    }

    /// The complete HTTP application
    pub fn router(&self) -> Router {
        self.builder().build()
    }

    /// Serve on the configured address until Ctrl+C or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.server.addr();
        self.builder().serve(&addr).await
    }
}
