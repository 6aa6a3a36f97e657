//! Storefront demo server
//!
//! Loads `STOREFRONT_CONFIG` (or the built-in defaults), seeds the configured
//! accounts plus a small catalog, and serves the API until Ctrl+C.
//!
//! ```text
//! STOREFRONT_CONFIG=demos/storefront/config.yaml cargo run --example storefront
//! curl -X POST localhost:3000/auth/login -H 'content-type: application/json' \
//!      -d '{"username": "seller", "password": "seller"}'
//! curl 'localhost:3000/products?search=lamp&ordering=-price'
//! ```

use storefront::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront=info,tower_http=info")),
        )
        .init();

    let config = match std::env::var("STOREFRONT_CONFIG") {
        Ok(path) => StorefrontConfig::from_yaml_file(&path)?,
        Err(_) => StorefrontConfig::default_config(),
    };

    let storefront = Storefront::new(config).await?;
    populate_catalog(&storefront).await?;

    println!("🚀 Storefront listening on http://{}", storefront.config().server.addr());
    println!("🔑 POST /auth/login, then send 'Authorization: Token <key>'");
    println!("📦 Resources: products, categories, tags, product-attributes, product-images");

    storefront.serve().await
}

/// A few products owned by the first seller account, if there is one
async fn populate_catalog(storefront: &Storefront) -> Result<()> {
    let Some(seller) = storefront
        .stores()
        .users
        .list()
        .await?
        .into_iter()
        .find(|u| u.role == Role::Seller)
    else {
        return Ok(());
    };

    let stores = storefront.stores();
    let lighting = stores.categories.create(Category::new("Lighting")).await?;
    let vintage = stores.tags.create(Tag::new("vintage")).await?;
    let brass = stores.tags.create(Tag::new("brass")).await?;

    let samples = [
        ("Brass desk lamp", 49.9, 4.5, vec![vintage.id, brass.id]),
        ("Floor lamp", 89.0, 4.0, vec![]),
        ("Pendant light", 120.0, 3.5, vec![vintage.id]),
    ];
    for (name, price, rating, tags) in samples {
        let mut product = Product::new(seller.id, name, price);
        product.rating = rating;
        product.category = Some(lighting.id);
        product.tags = tags;
        let product = stores.products.create(product).await?;
        stores
            .attributes
            .create(ProductAttribute::new(product.id, "material", "metal"))
            .await?;
    }

    tracing::info!(seller = %seller.username, "demo catalog populated");
    Ok(())
}
